use serde::Deserialize;

use crate::config::ConfigError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    #[serde(default)]
    pub channels: ChannelNames,

    #[serde(default)]
    pub request: RequestSection,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub logs: LogsSection,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            channels: ChannelNames::default(),
            request: RequestSection::default(),
            retry: RetryPolicy::default(),
            logs: LogsSection::default(),
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }

        self.channels.validate()?;
        self.request.validate()?;

        if !(1..=10).contains(&self.retry.attempts) {
            return Err(ConfigError::Invalid(
                "retry.attempts must be between 1 and 10".into(),
            ));
        }
        if self.retry.base_delay_ms > 60_000 {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must be at most 60000".into(),
            ));
        }
        if !(1..=10_000).contains(&self.logs.recent_limit) {
            return Err(ConfigError::Invalid(
                "logs.recent_limit must be between 1 and 10000".into(),
            ));
        }

        Ok(())
    }
}

/// Wire channel names. The request path is multiplexed over one channel; the
/// others carry bare payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelNames {
    #[serde(default = "default_request_channel")]
    pub request: String,
    #[serde(default = "default_start_channel")]
    pub start: String,
    #[serde(default = "default_stop_channel")]
    pub stop: String,
    #[serde(default = "default_status_channel")]
    pub status: String,
    #[serde(default = "default_log_channel")]
    pub log: String,
    #[serde(default = "default_logs_recent_channel")]
    pub logs_recent: String,
    #[serde(default = "default_queue_channel")]
    pub queue: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            request: default_request_channel(),
            start: default_start_channel(),
            stop: default_stop_channel(),
            status: default_status_channel(),
            log: default_log_channel(),
            logs_recent: default_logs_recent_channel(),
            queue: default_queue_channel(),
        }
    }
}

impl ChannelNames {
    pub fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("request", &self.request),
            ("start", &self.start),
            ("stop", &self.stop),
            ("status", &self.status),
            ("log", &self.log),
            ("logs_recent", &self.logs_recent),
            ("queue", &self.queue),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let all = self.all();
        for (i, (key, name)) in all.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "channels.{key} must not be empty"
                )));
            }
            if let Some((other, _)) = all[..i].iter().find(|(_, n)| n == name) {
                return Err(ConfigError::Invalid(format!(
                    "channels.{key} duplicates channels.{other} ({name})"
                )));
            }
        }
        Ok(())
    }
}

fn default_request_channel() -> String {
    "engine:request".into()
}
fn default_start_channel() -> String {
    "engine:start".into()
}
fn default_stop_channel() -> String {
    "engine:stop".into()
}
fn default_status_channel() -> String {
    "engine:status".into()
}
fn default_log_channel() -> String {
    "engine:log".into()
}
fn default_logs_recent_channel() -> String {
    "engine:logs:recent".into()
}
fn default_queue_channel() -> String {
    "engine:queue".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    /// Remote-side budget written into every request envelope.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Extra local wait on top of the envelope budget, so the backend's own
    /// timeout reply normally arrives first.
    #[serde(default = "default_timeout_grace_ms")]
    pub timeout_grace_ms: u64,
}

impl Default for RequestSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            timeout_grace_ms: default_timeout_grace_ms(),
        }
    }
}

impl RequestSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=600_000).contains(&self.default_timeout_ms) {
            return Err(ConfigError::Invalid(
                "request.default_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if self.timeout_grace_ms > 10_000 {
            return Err(ConfigError::Invalid(
                "request.timeout_grace_ms must be at most 10000".into(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_ms() -> u64 {
    12000
}
fn default_timeout_grace_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogsSection {
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_recent_limit() -> u32 {
    200
}
