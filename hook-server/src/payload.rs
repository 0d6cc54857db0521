//! Webhook payload decoding.
//!
//! Turns the accumulated request body into a parsed JSON value. Two wire
//! shapes are accepted:
//! - raw JSON (any content type other than form-encoded is treated as JSON)
//! - `application/x-www-form-urlencoded` with the JSON text carried in a
//!   `payload` field
//!
//! Decode failures are captured as a `DecodeError` rather than propagated;
//! the request handler maps them to a 400 response.

use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

/// Content type that triggers form-field extraction. Matched exactly; a
/// charset suffix disables the form path and the body falls through to raw
/// JSON parsing.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Why a request body could not be decoded into a JSON value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Form-encoded body without a `payload` field.
    #[error("form body is missing the payload field")]
    MissingPayloadField,

    /// The candidate text was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Decode an accumulated request body into a JSON value.
///
/// The parsed structure is returned unchanged - no normalization and no
/// schema coercion. Shape requirements are checked by the event deriver.
pub fn decode(body: &[u8], content_type: Option<&str>) -> Result<Value, DecodeError> {
    if content_type == Some(FORM_CONTENT_TYPE) {
        let text = extract_form_payload(body)?;
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Pull the `payload` field out of a form-encoded body.
fn extract_form_payload(body: &[u8]) -> Result<String, DecodeError> {
    form_urlencoded::parse(body)
        .find(|(name, _)| name == "payload")
        .map(|(_, value)| value.into_owned())
        .ok_or(DecodeError::MissingPayloadField)
}
