//! Credential header parsing.

use std::borrow::Cow;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::ErrorCode;
use crate::types::CredentialEnvelope;

/// British spelling accepted as a fallback for `Authorization`.
pub const AUTHORISATION: &str = "authorisation";

/// Header carrying the envelope in API-key header mode.
pub const API_KEY_HEADER: &str = "api-key";

const BASIC_PREFIX: &str = "basic ";

/// Standard alphabet, padding optional. Non-alphabet bytes still fail.
const ENVELOPE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// First non-empty value of `Authorization`, then `Authorisation`.
pub fn authorization_header(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    [AUTHORIZATION.as_str(), AUTHORISATION]
        .into_iter()
        .find_map(|name| non_empty(headers, name))
}

/// Non-empty value of the `api-key` header.
pub fn api_key_header(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    non_empty(headers, API_KEY_HEADER)
}

/// Header values outside visible ASCII are still present; invalid bytes
/// become U+FFFD so later format checks reject them.
fn non_empty<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .filter(|v| !v.is_empty())
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}

/// Parses `Basic <base64(username:secret)>`. The scheme is matched
/// case-insensitively and the payload is trimmed before decoding.
///
/// # Errors
///
/// - `INVALID_AUTHORIZATION_HEADER_TYPE` when the scheme is not Basic
/// - `INVALID_AUTHORIZATION_HEADER` when the payload does not decode
pub fn parse_basic_authorization(value: &str) -> Result<CredentialEnvelope, ErrorCode> {
    let scheme = value
        .get(..BASIC_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(BASIC_PREFIX))
        .ok_or(ErrorCode::InvalidAuthorizationHeaderType)?;

    decode_envelope(&value[scheme.len()..]).ok_or(ErrorCode::InvalidAuthorizationHeader)
}

/// Decodes `base64(username:secret)`.
///
/// Returns `None` if the payload has bytes outside the base64 alphabet, is
/// not UTF-8, or has no `:`. Trailing `=` padding is optional. Only the
/// first colon separates; the secret may contain more.
pub fn decode_envelope(encoded: &str) -> Option<CredentialEnvelope> {
    let decoded = ENVELOPE_ENGINE.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, secret) = decoded.split_once(':')?;

    Some(CredentialEnvelope {
        username: username.to_string(),
        secret: secret.to_string(),
    })
}
