//! Symmetric key material: base64 decoding, size validation, generation

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use zeroize::Zeroize;

use cframe_core::{CframeError, CframeResult, Mode};

use crate::random::random_bytes;

/// Well-known key used when the caller supplies none. Anyone can decrypt
/// frames sealed with it; production callers should pass their own key.
pub const DEFAULT_KEY: &str = "7At16p/dyonmDW3ll9Pl1bmCsWEACxaIzLmyC0ZWGaE=";

/// Key size used by `generate_key(0)`.
pub const DEFAULT_KEY_BITS: usize = 256;

/// AES key bytes (16, 24 or 32). Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decode a standard-alphabet base64 key. The size is not checked here.
    pub fn from_base64(encoded: &str) -> CframeResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CframeError::InvalidKeyEncoding(e.to_string()))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bits(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bits", &self.bits())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Check a key size against what `mode` accepts: 128/192/256 bits for gcm,
/// exactly 256 bits for cbc.
pub fn validate_key_bits(mode: Mode, bits: usize) -> CframeResult<()> {
    let ok = match mode {
        Mode::Gcm => matches!(bits, 128 | 192 | 256),
        Mode::Cbc => bits == 256,
    };
    if ok {
        Ok(())
    } else {
        Err(CframeError::InvalidKeySize { bits })
    }
}

/// Generate a random key of `bits` bits, base64-encoded for storage.
/// `0` selects [`DEFAULT_KEY_BITS`].
pub fn generate_key(bits: usize) -> CframeResult<String> {
    let bits = if bits == 0 { DEFAULT_KEY_BITS } else { bits };
    validate_key_bits(Mode::Gcm, bits)?;

    let key = SymmetricKey::from_bytes(random_bytes(bits / 8)?);
    Ok(key.to_base64())
}
