//! Account registration, sign-in and token verification.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::password::{hash_password, verify_password};

/// Identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// JWT claims. The subject is the user's email.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Service for signup, signin and verifying the `token` credential.
///
/// Tokens are HS256 JWTs signed with `JWT_SECRET`. Without a configured TTL
/// they carry no `exp` claim and stay valid until the secret rotates.
pub struct AuthService<R: UserRepository + ?Sized> {
    repository: Arc<R>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_seconds: Option<u64>,
}

impl<R: UserRepository + ?Sized> AuthService<R> {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `repository` - user repository
    /// - `jwt_secret` - HMAC key for signing and verifying tokens
    /// - `token_ttl_seconds` - lifetime of issued tokens; `None` issues non-expiring tokens
    pub fn new(repository: Arc<R>, jwt_secret: &str, token_ttl_seconds: Option<u64>) -> Self {
        Self {
            repository,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl_seconds,
        }
    }

    /// Registers a new account.
    ///
    /// Input shape (email format, password and name lengths) is validated by
    /// the request DTO before this is called.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    /// Returns [`AppError::Internal`] if hashing or the store fails.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<User, AppError> {
        if self.repository.find_by_email(email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = hash_password(password).map_err(|e| {
            AppError::internal("Internal server error", json!({ "reason": e.to_string() }))
        })?;

        let user = self
            .repository
            .create(NewUser {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
            })
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => email_taken(),
                other => other,
            })?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Checks credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown email or a wrong
    /// password, with the same message in both cases.
    pub async fn signin(&self, email: &str, password: &str) -> Result<String, AppError> {
        let Some(user) = self.repository.find_by_email(email).await? else {
            tracing::warn!("Signin failed: user not found");
            return Err(bad_credentials());
        };

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            AppError::internal(
                "Internal server error",
                json!({ "reason": format!("stored password hash is unreadable: {e}") }),
            )
        })?;

        if !valid {
            tracing::warn!(user_id = user.id, "Signin failed: wrong password");
            return Err(bad_credentials());
        }

        self.issue_token(&user.email)
    }

    /// Verifies a token and resolves the user it names.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the signature or expiry check
    /// fails, or if the subject no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = self.token_ttl_seconds.is_some();
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                AppError::unauthorized(
                    "Invalid verification token",
                    json!({ "reason": e.to_string() }),
                )
            })?
            .claims;

        if self.token_ttl_seconds.is_some() && claims.exp.is_none() {
            return Err(AppError::unauthorized(
                "Invalid verification token",
                json!({ "reason": "token has no expiry" }),
            ));
        }

        let user = self
            .repository
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Invalid verification token",
                    json!({ "reason": "subject no longer exists" }),
                )
            })?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }

    fn issue_token(&self, email: &str) -> Result<String, AppError> {
        let claims = Claims {
            sub: email.to_string(),
            exp: self
                .token_ttl_seconds
                .map(|ttl| Utc::now().timestamp() + ttl as i64),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::internal("Internal server error", json!({ "reason": e.to_string() }))
        })
    }
}

fn email_taken() -> AppError {
    AppError::conflict("A user with this email already exists", json!({}))
}

fn bad_credentials() -> AppError {
    AppError::unauthorized("Invalid email or password", json!({}))
}
