//! Shared error type across Lumen crates.

use thiserror::Error;

/// Failure codes surfaced to the untrusted side (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid path or unserializable body, detected before any channel traffic.
    BadRequest,
    /// The channel round trip itself failed or timed out.
    IpcFailure,
    /// The remote side answered with something that is not a well-formed envelope.
    BadResponse,
    /// The caller abandoned the call.
    Cancelled,
    /// The remote side answered with `ok: false`.
    Remote,
}

impl ErrorCode {
    /// String representation used in response envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::IpcFailure => "IPC_FAILURE",
            ErrorCode::BadResponse => "BAD_RESPONSE",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::Remote => "REMOTE",
        }
    }

    /// HTTP-ish status reported in locally generated failure envelopes.
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            _ => 0,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type used by the protocol core and the bridge runtime.
///
/// Channel-originated variants carry the channel name so callers can log which
/// channel failed without parsing the message.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Ipc { channel: String, message: String },
    #[error("{channel} timed out after {timeout_ms}ms")]
    Timeout { channel: String, timeout_ms: u64 },
    #[error("{message}")]
    Remote {
        channel: String,
        message: String,
        code: Option<String>,
    },
    #[error("bad response on {channel}: {message}")]
    BadResponse { channel: String, message: String },
    #[error("call on {channel} cancelled")]
    Cancelled { channel: String },
}

impl BridgeError {
    pub fn ipc(channel: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Ipc {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn bad_response(channel: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::BadResponse {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(channel: impl Into<String>) -> Self {
        BridgeError::Cancelled {
            channel: channel.into(),
        }
    }

    /// Channel the error originated from, if it crossed the boundary at all.
    pub fn channel(&self) -> Option<&str> {
        match self {
            BridgeError::BadRequest(_) => None,
            BridgeError::Ipc { channel, .. }
            | BridgeError::Timeout { channel, .. }
            | BridgeError::Remote { channel, .. }
            | BridgeError::BadResponse { channel, .. }
            | BridgeError::Cancelled { channel } => Some(channel),
        }
    }

    /// Map to a stable failure code.
    pub fn code(&self) -> ErrorCode {
        match self {
            BridgeError::BadRequest(_) => ErrorCode::BadRequest,
            BridgeError::Ipc { .. } | BridgeError::Timeout { .. } => ErrorCode::IpcFailure,
            BridgeError::Remote { .. } => ErrorCode::Remote,
            BridgeError::BadResponse { .. } => ErrorCode::BadResponse,
            BridgeError::Cancelled { .. } => ErrorCode::Cancelled,
        }
    }

    /// Whether another attempt could succeed.
    ///
    /// Validation failures, malformed replies and cancellation are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Ipc { .. } | BridgeError::Timeout { .. } | BridgeError::Remote { .. }
        )
    }
}
