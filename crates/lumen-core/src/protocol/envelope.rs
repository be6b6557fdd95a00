//! Request/response envelopes carried by the multiplexed request channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, ErrorCode, Result};
use crate::protocol::body::{Headers, SerializedBody};

/// HTTP-shaped request crossing the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Engine path, always absolute.
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub headers: Headers,
    pub body: SerializedBody,
    /// How long the remote side may take to formulate a reply.
    pub timeout_ms: u64,
}

/// Structured reply: `ok` discriminates success from failure.
///
/// The object is kept exactly as the remote side sent it, including fields the
/// bridge does not know about and `status` values that are not numbers. Only
/// `ok` is required, and it must be a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ResponseEnvelope {
    ok: bool,
    fields: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Locally generated failure. Always carries a code.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = Map::new();
        fields.insert("ok".into(), Value::Bool(false));
        fields.insert("status".into(), code.status().into());
        fields.insert("error".into(), Value::String(message.clone()));
        fields.insert("code".into(), code.as_str().into());
        fields.insert("message".into(), Value::String(message));
        Self { ok: false, fields }
    }

    pub fn from_error(err: &BridgeError) -> Self {
        Self::failure(err.code(), err.to_string())
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    /// Numeric `status`; `None` when absent or not a number.
    pub fn status(&self) -> Option<u64> {
        self.fields.get("status").and_then(Value::as_u64)
    }

    pub fn data(&self) -> Option<&Value> {
        self.get("data")
    }

    pub fn error(&self) -> Option<&Value> {
        self.get("error")
    }

    /// `error` as text: strings as-is, other values as JSON.
    pub fn error_text(&self) -> Option<String> {
        match self.error()? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.fields.get("code").and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").and_then(Value::as_str)
    }

    /// Any field of the reply; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// `data`, or `null` when absent.
    pub fn into_data(mut self) -> Value {
        self.fields.remove("data").unwrap_or(Value::Null)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl TryFrom<Map<String, Value>> for ResponseEnvelope {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, String> {
        match fields.get("ok") {
            Some(Value::Bool(ok)) => Ok(Self { ok: *ok, fields }),
            Some(other) => Err(format!("`ok` must be a boolean, got {other}")),
            None => Err("missing `ok`".into()),
        }
    }
}

impl From<ResponseEnvelope> for Map<String, Value> {
    fn from(env: ResponseEnvelope) -> Self {
        env.fields
    }
}

impl From<ResponseEnvelope> for Value {
    fn from(env: ResponseEnvelope) -> Self {
        env.into_value()
    }
}

/// Raw channel reply, classified once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The reply was an object carrying an `ok` key.
    Structured(ResponseEnvelope),
    /// Anything else; passed through untouched.
    Raw(Value),
}

impl Reply {
    /// Classify a raw reply received on `channel`.
    ///
    /// An object whose `ok` is not a boolean is a bad response rather than a
    /// raw value.
    pub fn classify(channel: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) if fields.contains_key("ok") => {
                ResponseEnvelope::try_from(fields)
                    .map(Reply::Structured)
                    .map_err(|e| {
                        BridgeError::bad_response(channel, format!("malformed envelope: {e}"))
                    })
            }
            other => Ok(Reply::Raw(other)),
        }
    }
}

/// Check a request path before anything is serialized.
pub fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(BridgeError::BadRequest(format!(
            "path must be absolute (start with '/'): {path:?}"
        )));
    }
    if path.starts_with("//") {
        return Err(BridgeError::BadRequest(format!(
            "protocol-relative path not allowed: {path:?}"
        )));
    }
    if path.chars().any(|c| c.is_ascii_control()) {
        return Err(BridgeError::BadRequest("path contains control characters".into()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_rules() {
        assert!(validate_path("/search").is_ok());
        assert!(validate_path("/").is_ok());
        assert!(validate_path("search").is_err());
        assert!(validate_path("").is_err());
        assert!(validate_path("//evil.example/x").is_err());
        assert!(validate_path("/a\nb").is_err());
    }

    #[test]
    fn failure_envelope_omits_absent_fields() {
        let env = ResponseEnvelope::failure(ErrorCode::BadRequest, "nope");
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(
            wire,
            json!({
                "ok": false,
                "status": 400,
                "error": "nope",
                "code": "BAD_REQUEST",
                "message": "nope"
            })
        );
    }

    #[test]
    fn classify_object_without_ok_is_raw() {
        let reply = Reply::classify("engine:start", json!({"pid": 42})).unwrap();
        assert_eq!(reply, Reply::Raw(json!({"pid": 42})));
    }

    #[test]
    fn classify_keeps_unknown_fields_and_loose_status() {
        let raw = json!({"ok": true, "status": "running", "data": {"pid": 1}, "node": "a"});
        let Reply::Structured(env) = Reply::classify("engine:start", raw.clone()).unwrap() else {
            panic!("expected a structured reply");
        };
        assert!(env.ok());
        assert_eq!(env.status(), None);
        assert_eq!(env.get("node"), Some(&json!("a")));
        assert_eq!(env.into_value(), raw);
    }

    #[test]
    fn classify_ok_with_wrong_type_is_bad_response() {
        let err = Reply::classify("engine:start", json!({"ok": "yes"})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadResponse);
        assert_eq!(err.channel(), Some("engine:start"));
    }
}
