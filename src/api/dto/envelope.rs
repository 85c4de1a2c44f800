//! Response envelope shared by every JSON endpoint.

use serde::{Deserialize, Serialize};

/// `{success, data, error, msg}` wrapper.
///
/// On success `error` is `null`; on failure `data` is `null` and `error`
/// carries the HTTP reason phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub msg: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, msg: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            msg: msg.into(),
        }
    }

    pub fn failure(error: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            msg: msg.into(),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` serializes as `null`.
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            msg: msg.into(),
        }
    }
}
