//! Request body serialization.
//!
//! Rules:
//! - Output is one of a fixed set of tagged shapes (`kind` on the wire).
//! - Binary form entries are rejected before transport.
//! - The JSON shape injects a content type into a copy of the caller headers,
//!   never into the caller's map.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Request/response header map. Ordered so envelopes serialize deterministically.
pub type Headers = BTreeMap<String, String>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Value of one form field as handed over by the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Bytes,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub name: String,
    pub value: FormValue,
}

impl FormEntry {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                content_type: None,
                bytes,
            },
        }
    }
}

/// Request payload as produced by the untrusted side.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Binary(Bytes),
    Form(Vec<FormEntry>),
    Json(Value),
}

impl RequestBody {
    /// Build a JSON body from any serializable value.
    ///
    /// Values without a JSON representation (e.g. maps keyed by non-strings)
    /// are reported as an unsupported body type.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| BridgeError::BadRequest(format!("unsupported body type: {e}")))
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Text(s)
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Text(s.to_owned())
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Binary(b)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(b: Vec<u8>) -> Self {
        RequestBody::Binary(Bytes::from(b))
    }
}

impl From<Value> for RequestBody {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => RequestBody::Empty,
            other => RequestBody::Json(other),
        }
    }
}

/// Form field in its wire form (text only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFormEntry {
    pub name: String,
    pub value: String,
}

/// Wire-safe body shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SerializedBody {
    None,
    Text {
        value: String,
    },
    Json {
        value: Value,
        headers: Headers,
    },
    ArrayBuffer {
        #[serde(with = "base64_bytes")]
        value: Bytes,
    },
    FormData {
        entries: Vec<WireFormEntry>,
    },
}

impl SerializedBody {
    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SerializedBody::None => "none",
            SerializedBody::Text { .. } => "text",
            SerializedBody::Json { .. } => "json",
            SerializedBody::ArrayBuffer { .. } => "array-buffer",
            SerializedBody::FormData { .. } => "form-data",
        }
    }

    /// Headers the body wants on the envelope, if it carries its own.
    pub fn headers(&self) -> Option<&Headers> {
        match self {
            SerializedBody::Json { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

/// Case-insensitive content-type lookup.
pub fn has_content_type(headers: &Headers) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE))
}

/// Convert a request payload into its wire-safe shape.
pub fn serialize(body: &RequestBody, headers: &Headers) -> Result<SerializedBody> {
    match body {
        RequestBody::Empty => Ok(SerializedBody::None),
        RequestBody::Form(entries) => {
            let mut wire = Vec::with_capacity(entries.len());
            for entry in entries {
                match &entry.value {
                    FormValue::Text(v) => wire.push(WireFormEntry {
                        name: entry.name.clone(),
                        value: v.clone(),
                    }),
                    FormValue::File { .. } => {
                        return Err(BridgeError::BadRequest(
                            "binary form entries unsupported".into(),
                        ))
                    }
                }
            }
            Ok(SerializedBody::FormData { entries: wire })
        }
        RequestBody::Text(s) => Ok(SerializedBody::Text { value: s.clone() }),
        RequestBody::Binary(b) => Ok(SerializedBody::ArrayBuffer {
            value: Bytes::copy_from_slice(b),
        }),
        RequestBody::Json(v) => {
            let mut merged = headers.clone();
            if !has_content_type(&merged) {
                merged.insert(CONTENT_TYPE.to_owned(), JSON_CONTENT_TYPE.to_owned());
            }
            Ok(SerializedBody::Json {
                value: v.clone(),
                headers: merged,
            })
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Bytes, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD
            .decode(s.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
