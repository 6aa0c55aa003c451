//! Backend response envelope: `{ code?, success?, data, message? }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            code: Some(200),
            success: Some(true),
            data,
            message: None,
        }
    }

    pub fn fail(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: Some(false),
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    /// An explicit `success` flag wins; otherwise `code` 0 or 200 is success.
    pub fn is_success(&self) -> bool {
        match (self.success, self.code) {
            (Some(flag), _) => flag,
            (None, Some(code)) => code == 0 || code == 200,
            (None, None) => false,
        }
    }

    /// Parse a response body. Anything that is not a JSON object carrying
    /// `code` or `success` is not an envelope.
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidEnvelope(format!("body is not JSON: {e}")))?;
        let Some(object) = value.as_object() else {
            return Err(ApiError::InvalidEnvelope("body is not a JSON object".to_string()));
        };
        if !object.contains_key("code") && !object.contains_key("success") {
            return Err(ApiError::InvalidEnvelope(
                "missing status marker (code/success)".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| ApiError::InvalidEnvelope(e.to_string()))
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Best-effort server message from an error body.
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
