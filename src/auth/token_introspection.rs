use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

use super::clock::Clock;

/// Why a credential could not be turned into [`Claims`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("payload segment is empty")]
    EmptyPayload,

    #[error("payload is not valid base64url: {0}")]
    Base64(String),

    #[error("payload is not a valid claims object: {0}")]
    Payload(String),
}

/// Roles as carried by the token or the "who am I" response.
///
/// The server emits a comma-joined string; a list of tags is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Roles {
    Joined(String),
    List(Vec<String>),
}

impl Roles {
    /// Individual role tags, trimmed, empty entries skipped.
    pub fn tags(&self) -> Vec<&str> {
        match self {
            Self::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .collect(),
            Self::List(list) => list
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags().is_empty()
    }

    /// Comma-joined form, as the server stores it.
    pub fn joined(&self) -> String {
        self.tags().join(",")
    }
}

impl From<&str> for Roles {
    fn from(value: &str) -> Self {
        Self::Joined(value.to_string())
    }
}

/// Unverified payload of a credential. Only `exp` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the account's login identity
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry in whole seconds since the Unix epoch
    #[serde(deserialize_with = "epoch_seconds")]
    pub exp: i64,
    #[serde(default)]
    pub roles: Option<Roles>,
    #[serde(default, deserialize_with = "optional_epoch_seconds")]
    pub iat: Option<i64>,
}

impl Claims {
    /// Expired means `exp` is at or before `now_secs`.
    pub const fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp <= now_secs
    }

    pub const fn seconds_until_expiry(&self, now_secs: i64) -> i64 {
        self.exp.saturating_sub(now_secs)
    }

    /// Subject for log lines and summaries.
    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or("<no subject>")
    }
}

// Fractional timestamps are floored; out-of-range values saturate
#[allow(clippy::cast_possible_truncation)]
fn number_to_secs(number: &serde_json::Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|secs| secs.floor() as i64))
}

fn epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    number_to_secs(&number)
        .ok_or_else(|| de::Error::custom(format!("timestamp {number} is not a number of seconds")))
}

fn optional_epoch_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<serde_json::Number>::deserialize(deserializer)?
        .map(|number| {
            number_to_secs(&number).ok_or_else(|| {
                de::Error::custom(format!("timestamp {number} is not a number of seconds"))
            })
        })
        .transpose()
}

/// Decode the payload segment of a compact token without checking the signature.
///
/// Signature verification is the server's job; this exists for routing and UI
/// decisions only.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(DecodeError::SegmentCount(parts.len()));
    }

    let payload = parts[1];
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let decoded = base64_url_decode(payload)?;
    serde_json::from_slice::<Claims>(&decoded).map_err(|e| DecodeError::Payload(e.to_string()))
}

/// Calculate seconds until token expiry
/// Returns None if token is invalid or already expired
pub fn seconds_until_expiry(token: &str, clock: &dyn Clock) -> Option<i64> {
    let claims = match decode(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Failed to decode credential: {e}");
            return None;
        }
    };
    let seconds = claims.seconds_until_expiry(clock.now_secs());
    (seconds > 0).then_some(seconds)
}

/// Check if token is expiring within the specified threshold
pub fn is_expiring_within(token: &str, threshold_secs: i64, clock: &dyn Clock) -> bool {
    // Invalid and expired tokens count as expiring
    seconds_until_expiry(token, clock).is_none_or(|secs| secs <= threshold_secs)
}

// JWT uses base64url without padding; padded input is tolerated
fn base64_url_decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| DecodeError::Base64(e.to_string()))
}
