//! AES-GCM frame sealing/opening
//!
//! Frame format (binary):
//! ```text
//! [2 bytes: version][12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! AAD = version || password
//! ```
//!
//! Binding the password into the AAD means a frame only opens with the
//! password it was sealed under. The password is not a key: confidentiality
//! rests on the AES key alone.

use aes::Aes192;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use secrecy::{ExposeSecret, SecretString};

use cframe_core::{CframeError, CframeResult};

use crate::frame::{self, Version, GCM_FRAME_OVERHEAD, GCM_NONCE_SIZE};
use crate::keys::SymmetricKey;
use crate::random::random_array;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM keyed once at construction, for each supported key size.
enum GcmKey {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl GcmKey {
    fn new(key: &SymmetricKey) -> CframeResult<Self> {
        let bytes = key.as_bytes();
        let invalid = |_| CframeError::InvalidKeySize { bits: key.bits() };
        match bytes.len() {
            16 => Aes128Gcm::new_from_slice(bytes).map(Self::Aes128).map_err(invalid),
            24 => Aes192Gcm::new_from_slice(bytes).map(Self::Aes192).map_err(invalid),
            32 => Aes256Gcm::new_from_slice(bytes).map(Self::Aes256).map_err(invalid),
            _ => Err(CframeError::InvalidKeySize { bits: key.bits() }),
        }
    }

    fn encrypt(&self, nonce: &[u8], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::<U12>::from_slice(nonce);
        let payload = Payload { msg, aad };
        match self {
            Self::Aes128(c) => c.encrypt(nonce, payload),
            Self::Aes192(c) => c.encrypt(nonce, payload),
            Self::Aes256(c) => c.encrypt(nonce, payload),
        }
    }

    fn decrypt(&self, nonce: &[u8], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::<U12>::from_slice(nonce);
        let payload = Payload { msg, aad };
        match self {
            Self::Aes128(c) => c.decrypt(nonce, payload),
            Self::Aes192(c) => c.decrypt(nonce, payload),
            Self::Aes256(c) => c.decrypt(nonce, payload),
        }
    }
}

/// Gcm half of an engine: key schedule, version tag and default password.
pub struct GcmCipher {
    key: GcmKey,
    version: Version,
    password: SecretString,
}

impl GcmCipher {
    pub fn new(key: &SymmetricKey, version: Version, password: SecretString) -> CframeResult<Self> {
        Ok(Self {
            key: GcmKey::new(key)?,
            version,
            password,
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The call-time password when non-empty, else the engine default.
    fn effective_password<'a>(&'a self, password: &'a str) -> &'a str {
        if password.is_empty() {
            self.password.expose_secret()
        } else {
            password
        }
    }

    /// Seal `plaintext` into a complete frame under a fresh random nonce.
    ///
    /// Returns: `[version][12-byte nonce][ciphertext][16-byte tag]`
    pub fn seal(&self, plaintext: &[u8], password: &str) -> CframeResult<Vec<u8>> {
        let nonce: [u8; GCM_NONCE_SIZE] = random_array()?;
        let aad = frame::build_aad(&self.version, self.effective_password(password));

        let sealed = self.key.encrypt(&nonce, plaintext, &aad).map_err(|_| {
            CframeError::MalformedCiphertext("plaintext too large for one gcm frame".into())
        })?;

        let mut out = frame::frame_with_header(&self.version, &nonce, sealed.len());
        out.extend_from_slice(&sealed);
        debug_assert_eq!(out.len(), plaintext.len() + GCM_FRAME_OVERHEAD);
        Ok(out)
    }

    /// Open a frame produced by [`GcmCipher::seal`].
    ///
    /// The AAD is rebuilt from the frame's own version bytes, so frames
    /// written under another version tag still open when key and password match.
    pub fn open(&self, frame_bytes: &[u8], password: &str) -> CframeResult<Vec<u8>> {
        let parts = frame::split_gcm(frame_bytes)?;
        let aad = frame::build_aad(parts.version, self.effective_password(password));

        self.key
            .decrypt(parts.nonce, parts.payload, &aad)
            .map_err(|_| CframeError::AuthenticationFailed)
    }
}

impl std::fmt::Debug for GcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = match self.key {
            GcmKey::Aes128(_) => 128,
            GcmKey::Aes192(_) => 192,
            GcmKey::Aes256(_) => 256,
        };
        f.debug_struct("GcmCipher")
            .field("key_bits", &bits)
            .field("version", &self.version)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
