//! Versioned wire frames
//!
//! ```text
//! gcm: [2 bytes: version][12 bytes: nonce][N bytes: ciphertext][16 bytes: tag]
//!      AAD = version || password (UTF-8)
//! cbc: [2 bytes: version][16 bytes: IV][padded ciphertext, multiple of 16]
//! ```
//!
//! Fields are raw bytes with no length prefixes. The gcm version is not
//! checked on its own: it only reaches the tag through the AAD, so a
//! rewritten version fails authentication. The cbc version is ignored on
//! decode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use cframe_core::{CframeError, CframeResult, TextEncoding};

/// Two-byte format version tag at the start of every frame
pub type Version = [u8; 2];

pub const VERSION_SIZE: usize = 2;

/// Version tag written by gcm engines unless overridden
pub const DEFAULT_GCM_VERSION: Version = [0x01, 0x03];

/// Version tag written by cbc engines unless overridden
pub const DEFAULT_CBC_VERSION: Version = [0x01, 0x04];

/// Standard 96-bit GCM nonce
pub const GCM_NONCE_SIZE: usize = 12;

/// GCM authentication tag
pub const GCM_TAG_SIZE: usize = 16;

/// AES block size, which is also the cbc IV size
pub const BLOCK_SIZE: usize = 16;

pub const CBC_IV_SIZE: usize = BLOCK_SIZE;

pub const GCM_HEADER_SIZE: usize = VERSION_SIZE + GCM_NONCE_SIZE;

pub const CBC_HEADER_SIZE: usize = VERSION_SIZE + CBC_IV_SIZE;

/// Bytes a gcm frame adds on top of its plaintext (version + nonce + tag)
pub const GCM_FRAME_OVERHEAD: usize = GCM_HEADER_SIZE + GCM_TAG_SIZE;

/// A frame split into its three fields, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParts<'a> {
    pub version: &'a [u8],
    pub nonce: &'a [u8],
    pub payload: &'a [u8],
}

/// AAD for a gcm frame: version bytes followed by the password bytes.
pub fn build_aad(version: &[u8], password: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(version.len() + password.len());
    aad.extend_from_slice(version);
    aad.extend_from_slice(password.as_bytes());
    aad
}

/// Start a frame buffer holding `version || nonce`, with room for `payload_len`.
pub fn frame_with_header(version: &Version, nonce: &[u8], payload_len: usize) -> Vec<u8> {
    let mut frame = Vec::with_capacity(VERSION_SIZE + nonce.len() + payload_len);
    frame.extend_from_slice(version);
    frame.extend_from_slice(nonce);
    frame
}

/// Split a frame whose nonce/IV is `nonce_size` bytes long.
pub fn split(frame: &[u8], nonce_size: usize) -> CframeResult<FrameParts<'_>> {
    let header = VERSION_SIZE + nonce_size;
    if frame.len() < header {
        return Err(CframeError::MalformedCiphertext(format!(
            "frame too short: {} bytes (header is {header})",
            frame.len()
        )));
    }
    let (version, rest) = frame.split_at(VERSION_SIZE);
    let (nonce, payload) = rest.split_at(nonce_size);
    Ok(FrameParts {
        version,
        nonce,
        payload,
    })
}

pub fn split_gcm(frame: &[u8]) -> CframeResult<FrameParts<'_>> {
    split(frame, GCM_NONCE_SIZE)
}

/// Split a cbc frame, rejecting payloads that are not whole blocks.
pub fn split_cbc(frame: &[u8]) -> CframeResult<FrameParts<'_>> {
    let parts = split(frame, CBC_IV_SIZE)?;
    if parts.payload.len() % BLOCK_SIZE != 0 {
        return Err(CframeError::MalformedCiphertext(format!(
            "ciphertext is not a multiple of the block size: {} bytes",
            parts.payload.len()
        )));
    }
    Ok(parts)
}

/// Render a binary frame as text.
pub fn encode_text(frame: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Base64 => STANDARD.encode(frame),
        TextEncoding::Hex => hex::encode(frame),
    }
}

/// Parse text produced by [`encode_text`] back into a binary frame.
pub fn decode_text(text: &str, encoding: TextEncoding) -> CframeResult<Vec<u8>> {
    match encoding {
        TextEncoding::Base64 => STANDARD
            .decode(text)
            .map_err(|e| CframeError::MalformedCiphertext(format!("base64 decode: {e}"))),
        TextEncoding::Hex => hex::decode(text)
            .map_err(|e| CframeError::MalformedCiphertext(format!("hex decode: {e}"))),
    }
}
