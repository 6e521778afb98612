//! Mapping of exchangerate-api.com failures onto [`ConversionError`].
//!
//! The service reports problems three ways: an HTTP status, an `error-type`
//! field in the JSON body, or (for transport failures) only a free-text
//! message. All three end up as one of the three conversion error kinds.

use std::sync::LazyLock;

use regex::Regex;
use tax_core::{ConversionError, CurrencyCode};

/// Matches the last run of digits in a message.
static LAST_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)\D*$").ok());

/// Classifies an HTTP status code.
///
/// 403 is a rejected key, 404 an unknown currency; everything else is a
/// generic provider failure carrying `detail`.
pub fn classify_status(
    status: u16,
    source: &CurrencyCode,
    detail: &str,
) -> ConversionError {
    match status {
        403 => ConversionError::InvalidCredential,
        404 => ConversionError::InvalidCurrencyCode(source.to_string()),
        _ => ConversionError::Provider(format!("HTTP {status}: {detail}")),
    }
}

/// Classifies the `error-type` field of an error body.
///
/// Unrecognised error types fall back to the HTTP status.
pub fn classify_error_type(
    error_type: &str,
    status: u16,
    source: &CurrencyCode,
) -> ConversionError {
    match error_type {
        "invalid-key" | "inactive-account" => ConversionError::InvalidCredential,
        "unsupported-code" => ConversionError::InvalidCurrencyCode(source.to_string()),
        other => classify_status(status, source, other),
    }
}

/// The last number in `message`, read as a status code.
///
/// ```
/// use tax_rates::status_from_message;
///
/// assert_eq!(
///     status_from_message("The remote server returned an error: (403) Forbidden."),
///     Some(403)
/// );
/// assert_eq!(status_from_message("connection reset"), None);
/// ```
pub fn status_from_message(message: &str) -> Option<u16> {
    let captures = LAST_NUMBER.as_ref()?.captures(message)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Classifies a failure known only by its message.
pub fn classify_message(
    message: &str,
    source: &CurrencyCode,
) -> ConversionError {
    match status_from_message(message) {
        Some(status) => classify_status(status, source, message),
        None => ConversionError::Provider(message.to_string()),
    }
}
