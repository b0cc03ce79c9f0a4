use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CframeError, CframeResult};
use crate::types::{Mode, TextEncoding};

/// Top-level configuration (loaded from cframe.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CframeConfig {
    pub engine: EngineConfig,
    pub stream: StreamConfig,
    pub log: LogConfig,
}

impl CframeConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml(content: &str) -> CframeResult<Self> {
        toml::from_str(content).map_err(|e| CframeError::Config(format!("parsing config: {e}")))
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> CframeResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
                .map_err(|e| CframeError::Config(format!("{}: {e}", path.display())))
        } else {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> CframeResult<String> {
        toml::to_string(self).map_err(|e| CframeError::Config(format!("serializing config: {e}")))
    }
}

/// Engine selection: mode, key material, default password, encoding, version tags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cipher mode: "gcm" or "cbc" (default: gcm)
    pub mode: Mode,
    /// Base64 key (default: the built-in well-known key)
    pub key: Option<String>,
    /// Default password bound into gcm frames (required for gcm)
    pub password: Option<String>,
    /// Text encoding: "base64" or "hex" (default: base64)
    pub encoding: TextEncoding,
    /// Version tag written into gcm frames
    pub gcm_version: [u8; 2],
    /// Version tag written into cbc frames
    pub cbc_version: [u8; 2],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Gcm,
            key: None,
            password: None,
            encoding: TextEncoding::Base64,
            gcm_version: [0x01, 0x03],
            cbc_version: [0x01, 0x04],
        }
    }
}

/// File streaming parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Fixed chunk buffer size in bytes (default: 16 KiB). Must be a
    /// multiple of the AES block size and larger than the gcm frame overhead.
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: 16 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}
