//! Destination URL validation.
//!
//! Destinations are stored exactly as submitted (minus surrounding
//! whitespace), so the (owner, URL) uniqueness rule compares what the user
//! typed and the `Location` header echoes it back unchanged.

use url::Url;

/// Reasons a destination URL is rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Checks that `input` is an absolute http(s) URL with a host.
///
/// Rejects `javascript:`, `data:`, `file:` and other non-web schemes.
///
/// # Errors
///
/// Returns the first rule the input violates.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(validate_url(" https://example.com/a ").unwrap(), "https://example.com/a");
/// assert!(validate_url("ftp://example.com").is_err());
/// ```
pub fn validate_url(input: &str) -> Result<String, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            validate_url("http://example.com").unwrap(),
            "http://example.com"
        );
        assert_eq!(
            validate_url("https://example.com/Path?q=1#frag").unwrap(),
            "https://example.com/Path?q=1#frag"
        );
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            validate_url("  https://example.com/x \n").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_url("   "), Err(UrlValidationError::Empty));
    }

    #[test]
    fn test_rejects_relative_url() {
        assert!(matches!(
            validate_url("example.com/path"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_dangerous_schemes() {
        for input in [
            "javascript:alert(1)",
            "data:text/html,hi",
            "file:///etc/passwd",
            "ftp://example.com",
        ] {
            assert_eq!(
                validate_url(input),
                Err(UrlValidationError::UnsupportedProtocol),
                "{input}"
            );
        }
    }
}
