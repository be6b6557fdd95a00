//! Bridge config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use thiserror::Error;

pub use schema::{BridgeConfig, ChannelNames, LogsSection, RequestSection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<BridgeConfig, ConfigError> {
    let cfg: BridgeConfig = serde_yaml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}
