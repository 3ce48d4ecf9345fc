//! Signature schemes used by pgcb.
//!
//! Two HMAC-SHA256 schemes live here:
//!
//! * **Gateway callbacks** (inbound): the gateway glues the canonical
//!   notification fields together as `{key}{value}` pairs, in canonical
//!   order, and sends the lowercase hex HMAC in the `signature` field.
//!
//! * **Forwarded events** (outbound): the body is signed as
//!   `HMAC-SHA256("{timestamp}.{json_body}", secret)` and the result is
//!   sent in a header:
//!
//! ```text
//! Pgcb-Signature: {unix_timestamp}.{base64_signature}
//! ```

use ring::hmac;

use crate::objects::Notification;

/// Header carrying the signature of a forwarded event.
pub const SIGNATURE_HEADER: &str = "Pgcb-Signature";

/// Maximum accepted age of a forwarded event signature, in seconds.
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Marker for bodies that can be wrapped in a [`SignedObject`].
pub trait Signature: for<'de> serde::Deserialize<'de> + serde::Serialize {}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is empty")]
    Empty,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn hmac_key(key: &[u8]) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, key)
}

// ---------------------------------------------------------------------------
// Gateway callbacks
// ---------------------------------------------------------------------------

/// Concatenate the canonical fields as `{key}{value}` in canonical order.
pub fn glue_fields(notification: &Notification) -> String {
    notification
        .fields()
        .iter()
        .fold(String::new(), |mut glued, (key, value)| {
            glued.push_str(key);
            glued.push_str(value);
            glued
        })
}

/// Compute the lowercase hex HMAC the gateway attaches to `notification`.
pub fn sign_notification(notification: &Notification, key: &[u8]) -> String {
    let tag = hmac::sign(&hmac_key(key), glue_fields(notification).as_bytes());
    hex::encode(tag.as_ref())
}

/// Check a gateway signature against the notification fields.
///
/// The signature must be the exact lowercase hex the gateway produces; any
/// other spelling of the same bytes is rejected. The comparison itself runs
/// in constant time.
pub fn verify_notification(
    notification: &Notification,
    signature: &str,
    key: &[u8],
) -> Result<(), SignatureError> {
    if signature.is_empty() {
        return Err(SignatureError::Empty);
    }
    if !signature
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Err(SignatureError::InvalidHex);
    }
    let tag = hex::decode(signature).map_err(|_| SignatureError::InvalidHex)?;
    hmac::verify(
        &hmac_key(key),
        glue_fields(notification).as_bytes(),
        &tag,
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Forwarded events
// ---------------------------------------------------------------------------

/// A body together with the exact JSON that was signed and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedObject<T: Signature> {
    pub body: T,
    pub timestamp: i64,
    pub json: String,
    pub signature: Box<[u8]>,
}

impl<T: Signature> SignedObject<T> {
    /// Serialize `body` and sign it with the current time.
    pub fn new(body: T, key: &[u8]) -> Result<Self, serde_json::Error> {
        let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
        let json = serde_json::to_string(&body)?;
        let tag = hmac::sign(&hmac_key(key), format!("{timestamp}.{json}").as_bytes());
        Ok(Self {
            body,
            timestamp,
            json,
            signature: tag.as_ref().into(),
        })
    }

    /// Rebuild a signed object from the received header and raw body.
    /// Nothing is verified until [`verify`](Self::verify) is called.
    pub fn from_header_and_body(header_value: &str, json: String) -> Result<Self, SignatureError> {
        let (timestamp, signature) = parse_signature_header(header_value)?;
        let body = serde_json::from_str(&json)?;
        Ok(Self {
            body,
            timestamp,
            json,
            signature,
        })
    }

    /// Verify signature and freshness, yielding the body.
    pub fn verify(self, key: &[u8]) -> Result<T, SignatureError> {
        hmac::verify(
            &hmac_key(key),
            format!("{}.{}", self.timestamp, self.json).as_bytes(),
            &self.signature,
        )?;
        check_timestamp(self.timestamp)?;
        Ok(self.body)
    }

    /// The full `Pgcb-Signature` header value.
    pub fn to_header(&self) -> String {
        format_signature_header(self.timestamp, &self.signature)
    }
}

/// Split `{timestamp}.{base64}` into its parts.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, encoded) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature = fast32::base64::RFC4648_NOPAD
        .decode_str(encoded)
        .map_err(|_| SignatureError::InvalidBase64)?;
    Ok((timestamp, signature.into_boxed_slice()))
}

pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{timestamp}.{}",
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Reject timestamps older than [`MAX_SIGNATURE_AGE`].
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}
