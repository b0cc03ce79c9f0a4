//! Engine construction: mode/key/password/encoding resolution and validation
//!
//! Checks run in a fixed order so the first misconfiguration is the one
//! reported: mode, then text encoding, then password (gcm only), then key
//! encoding, then key size, then stream buffer size.

use secrecy::{ExposeSecret, SecretString};

use cframe_core::config::CframeConfig;
use cframe_core::{CframeError, CframeResult, Mode, TextEncoding};

use crate::aead::GcmCipher;
use crate::block::CbcCipher;
use crate::engine::{Cipher, Engine};
use crate::frame::{Version, DEFAULT_CBC_VERSION, DEFAULT_GCM_VERSION};
use crate::keys::{validate_key_bits, SymmetricKey, DEFAULT_KEY};
use crate::stream::{validate_buffer_size, DEFAULT_BUFFER_SIZE};

/// Typed builder for [`Engine`]. Unset fields take their defaults.
#[derive(Debug)]
pub struct EngineBuilder {
    mode: Mode,
    key: Option<String>,
    password: Option<SecretString>,
    encoding: TextEncoding,
    gcm_version: Version,
    cbc_version: Version,
    buffer_size: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            mode: Mode::Gcm,
            key: None,
            password: None,
            encoding: TextEncoding::Base64,
            gcm_version: DEFAULT_GCM_VERSION,
            cbc_version: DEFAULT_CBC_VERSION,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Base64 key. An empty string selects the default key.
    pub fn key(mut self, key_b64: impl Into<String>) -> Self {
        self.key = Some(key_b64.into());
        self
    }

    /// Default password for gcm frames. Ignored in cbc mode.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn gcm_version(mut self, version: Version) -> Self {
        self.gcm_version = version;
        self
    }

    pub fn cbc_version(mut self, version: Version) -> Self {
        self.cbc_version = version;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn build(self) -> CframeResult<Engine> {
        let password = self
            .password
            .filter(|p| !p.expose_secret().is_empty());
        if self.mode == Mode::Gcm && password.is_none() {
            return Err(CframeError::MissingPassword);
        }

        let key_b64 = match self.key.as_deref() {
            Some(k) if !k.is_empty() => k,
            _ => {
                tracing::warn!(mode = %self.mode, "no key supplied, using the built-in default key");
                DEFAULT_KEY
            }
        };
        let key = SymmetricKey::from_base64(key_b64)?;
        validate_key_bits(self.mode, key.bits())?;

        validate_buffer_size(self.buffer_size)?;

        let cipher = match self.mode {
            Mode::Gcm => Cipher::Gcm(GcmCipher::new(
                &key,
                self.gcm_version,
                password.unwrap_or_else(|| SecretString::from("")),
            )?),
            Mode::Cbc => Cipher::Cbc(CbcCipher::new(key, self.cbc_version)?),
        };

        tracing::debug!(
            mode = %self.mode,
            encoding = %self.encoding,
            buffer_size = self.buffer_size,
            "engine ready"
        );
        Ok(Engine::from_parts(cipher, self.encoding, self.buffer_size))
    }
}

impl Engine {
    /// Resolve an engine from raw strings. Empty `mode` means gcm, empty
    /// `key_b64` the default key, empty `encoding` base64.
    pub fn build(mode: &str, key_b64: &str, password: &str, encoding: &str) -> CframeResult<Self> {
        let mode = if mode.is_empty() {
            Mode::default()
        } else {
            mode.parse()?
        };
        let encoding = if encoding.is_empty() {
            TextEncoding::default()
        } else {
            encoding.parse()?
        };

        EngineBuilder::new()
            .mode(mode)
            .key(key_b64)
            .password(password)
            .encoding(encoding)
            .build()
    }

    /// Gcm engine with the given key, default password and encoding.
    pub fn gcm(key_b64: &str, password: &str, encoding: &str) -> CframeResult<Self> {
        Self::build(Mode::Gcm.as_str(), key_b64, password, encoding)
    }

    /// Cbc engine; cbc frames carry no password.
    pub fn cbc(key_b64: &str, encoding: &str) -> CframeResult<Self> {
        Self::build(Mode::Cbc.as_str(), key_b64, "", encoding)
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Build from the `[engine]` and `[stream]` sections of a config file.
    pub fn from_config(config: &CframeConfig) -> CframeResult<Self> {
        let engine = &config.engine;
        let mut builder = EngineBuilder::new()
            .mode(engine.mode)
            .encoding(engine.encoding)
            .gcm_version(engine.gcm_version)
            .cbc_version(engine.cbc_version)
            .buffer_size(config.stream.buffer_size);
        if let Some(key) = &engine.key {
            builder = builder.key(key.as_str());
        }
        if let Some(password) = &engine.password {
            builder = builder.password(password.as_str());
        }
        builder.build()
    }
}
