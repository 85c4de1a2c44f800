//! DTOs for signup and signin.

use serde::Deserialize;
use validator::Validate;

/// Request body for `POST /signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 20, message = "Password must be 8-20 characters"))]
    pub password: String,

    #[validate(length(min = 3, max = 25, message = "Username must be 3-25 characters"))]
    pub username: String,
}

/// Request body for `POST /signin`.
///
/// Shape violations are answered with 401, not 400.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 20))]
    pub password: String,
}
