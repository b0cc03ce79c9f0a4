//! AES-256-CBC frame sealing/opening
//!
//! Frame format (binary):
//! ```text
//! [2 bytes: version][16 bytes: random IV][CBC(PKCS#7(plaintext))]
//! ```
//!
//! No integrity protection: a modified frame decrypts to garbage or fails the
//! padding range check. Use gcm when tampering matters.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;

use cframe_core::{CframeError, CframeResult, Mode};

use crate::frame::{self, Version, BLOCK_SIZE, CBC_IV_SIZE};
use crate::keys::{validate_key_bits, SymmetricKey};
use crate::padding;
use crate::random::random_array;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Cbc half of an engine: a 256-bit key and the version tag.
#[derive(Clone)]
pub struct CbcCipher {
    key: SymmetricKey,
    version: Version,
}

impl CbcCipher {
    pub fn new(key: SymmetricKey, version: Version) -> CframeResult<Self> {
        validate_key_bits(Mode::Cbc, key.bits())?;
        Ok(Self { key, version })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Pad and encrypt `plaintext` into a complete frame under a fresh IV.
    pub fn seal(&self, plaintext: &[u8]) -> CframeResult<Vec<u8>> {
        let iv: [u8; CBC_IV_SIZE] = random_array()?;

        let mut body = plaintext.to_vec();
        padding::pad(&mut body, BLOCK_SIZE);
        self.encryptor(&iv)?.encrypt_blocks(&mut body);

        let mut out = frame::frame_with_header(&self.version, &iv, body.len());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decrypt and unpad a frame produced by [`CbcCipher::seal`].
    pub fn open(&self, frame_bytes: &[u8]) -> CframeResult<Vec<u8>> {
        let parts = frame::split_cbc(frame_bytes)?;

        let mut body = parts.payload.to_vec();
        self.decryptor(parts.nonce)?.decrypt_blocks(&mut body);

        let len = padding::unpad(&body)?.len();
        body.truncate(len);
        Ok(body)
    }

    /// Chaining encryptor that keeps its state across calls, for streams.
    pub(crate) fn encryptor(&self, iv: &[u8]) -> CframeResult<CbcEncryptor> {
        Aes256CbcEnc::new_from_slices(self.key.as_bytes(), iv)
            .map(CbcEncryptor)
            .map_err(|_| CframeError::InvalidKeySize {
                bits: self.key.bits(),
            })
    }

    pub(crate) fn decryptor(&self, iv: &[u8]) -> CframeResult<CbcDecryptor> {
        Aes256CbcDec::new_from_slices(self.key.as_bytes(), iv)
            .map(CbcDecryptor)
            .map_err(|_| CframeError::InvalidKeySize {
                bits: self.key.bits(),
            })
    }
}

impl std::fmt::Debug for CbcCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CbcCipher")
            .field("key", &self.key)
            .field("version", &self.version)
            .finish()
    }
}

pub(crate) struct CbcEncryptor(Aes256CbcEnc);

impl CbcEncryptor {
    /// Encrypt whole blocks in place. `buf.len()` must be a multiple of 16.
    pub(crate) fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.0.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
    }
}

pub(crate) struct CbcDecryptor(Aes256CbcDec);

impl CbcDecryptor {
    /// Decrypt whole blocks in place. `buf.len()` must be a multiple of 16.
    pub(crate) fn decrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.0.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
    }
}
