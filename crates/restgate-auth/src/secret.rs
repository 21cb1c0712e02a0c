//! API token generation and comparison.
//!
//! # Security
//!
//! - Tokens are 64 characters drawn from `[A-Za-z0-9]` using the thread RNG
//! - Comparison runs in constant time over the longer of the two inputs, so
//!   neither content nor length leaks through timing
//!
//! # Example
//!
//! ```
//! use restgate_auth::secret::{generate_api_token, secrets_match};
//!
//! let token = generate_api_token();
//! assert_eq!(token.len(), 64);
//! assert!(secrets_match(&token, &token));
//! ```

use rand::Rng;
use rand::distributions::Alphanumeric;
use subtle::ConstantTimeEq;

/// Length of generated API tokens.
pub const API_TOKEN_LENGTH: usize = 64;

/// Generates a new random API token.
#[must_use]
pub fn generate_api_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Compares a provided secret with the expected one in constant time.
#[must_use]
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}
