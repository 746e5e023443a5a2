//! TOML configuration with CLI overrides layered on top.

use std::path::{Path, PathBuf};

use proto::ConfigError;
use serde::{Deserialize, Serialize};

use crate::scroll::SCROLL_OVERLAP_ROWS;

/// Default server port of the animation server.
pub const DEFAULT_PORT: u16 = 6921;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub terminal: TerminalConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Run without touching the terminal: no raw mode, no drawing.
    pub quiet: bool,
    /// Rows of context kept visible across a page up/down step.
    pub scroll_overlap: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            scroll_overlap: SCROLL_OVERLAP_ROWS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// `~/.ledterm/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".ledterm").join("config.toml")
    }

    /// Loads from `path`, or from the default path when none is given. A
    /// missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.host".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::InvalidValue {
                field: "log.level".to_string(),
                reason: format!("unknown level {other:?}"),
            }),
        }
    }
}
