//! Request extractors shared by the JSON handlers.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;

/// JSON body that has been deserialized and passed [`Validate`].
///
/// Malformed bodies and validation failures are both reported as
/// `400 Invalid request body` in the standard envelope.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::bad_request(
                    "Invalid request body",
                    json!({ "reason": rejection.body_text() }),
                )
            })?;

        value.validate()?;

        Ok(Self(value))
    }
}
