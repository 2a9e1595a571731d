//! One-shot messages carried to the next rendered page in a cookie.

use axum::http::{HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::app::cookies::{read_cookie, set_cookie, FLASH_COOKIE};

const FLASH_MAX_AGE_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

impl FlashMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }
}

pub fn encode(messages: &[FlashMessage]) -> Option<String> {
    serde_json::to_vec(messages)
        .ok()
        .map(|json| URL_SAFE_NO_PAD.encode(json))
}

/// Tampered or stale values decode to nothing rather than an error.
pub fn decode(value: &str) -> Vec<FlashMessage> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn from_headers(headers: &HeaderMap) -> Vec<FlashMessage> {
    read_cookie(headers, FLASH_COOKIE)
        .map(decode)
        .unwrap_or_default()
}

pub fn cookie_for(messages: &[FlashMessage], secure: bool) -> Option<HeaderValue> {
    let encoded = encode(messages)?;
    set_cookie(FLASH_COOKIE, &encoded, FLASH_MAX_AGE_SECS, secure)
}
