//! Short code generation.
//!
//! Codes are drawn from the OS CSPRNG via `getrandom`, one random byte per
//! output character, mapped onto a base62 alphabet with `byte % 62`. The
//! modulo introduces a small bias toward the first eight symbols; uniqueness
//! is enforced by the store, not by the distribution.

/// Length of generated short codes.
pub const SHORT_CODE_LENGTH: usize = 8;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generates a random base62 code of exactly `length` characters.
///
/// # Errors
///
/// Returns the `getrandom` error if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(SHORT_CODE_LENGTH)?;
/// assert_eq!(code.len(), 8);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code(length: usize) -> Result<String, getrandom::Error> {
    let mut buffer = vec![0u8; length];
    getrandom::fill(&mut buffer)?;

    Ok(buffer
        .into_iter()
        .map(|b| BASE62[(b % 62) as usize] as char)
        .collect())
}

/// Whether `code` could have been produced by [`generate_code`].
///
/// Used to reject malformed codes before touching the store.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == SHORT_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
