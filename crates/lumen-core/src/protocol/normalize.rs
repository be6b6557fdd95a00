//! Reply normalization.
//!
//! The only place that reads `ok`/`error`/`data` of a reply. Everything above
//! it sees either a value or a channel-tagged `BridgeError`.

use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::protocol::envelope::Reply;

/// Turn a classified reply into a value, or a `Remote` error for `ok: false`.
///
/// Fields other than `ok`, `data`, `error` and `code` are ignored, whatever
/// their type.
pub fn normalize(channel: &str, reply: Reply) -> Result<Value> {
    match reply {
        Reply::Raw(v) => Ok(v),
        Reply::Structured(env) if env.ok() => Ok(env.into_data()),
        Reply::Structured(env) => Err(BridgeError::Remote {
            channel: channel.to_owned(),
            message: env
                .error_text()
                .unwrap_or_else(|| format!("IPC call failed for {channel}")),
            code: env.code().map(str::to_owned),
        }),
    }
}
