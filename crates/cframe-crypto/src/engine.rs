//! The engine: one immutable configuration exposing byte, text and file operations
//!
//! Both modes share the operation set. Buffer and text calls produce one
//! frame; file calls go through [`crate::stream`]. The `password` argument is
//! bound into gcm frames (falling back to the engine default when empty) and
//! accepted but ignored in cbc mode.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use cframe_core::{CframeResult, Mode, TextEncoding};

use crate::aead::GcmCipher;
use crate::block::CbcCipher;
use crate::frame::{self, Version};
use crate::stream::{self, ChunkLayout, StreamSummary};

#[derive(Debug)]
pub(crate) enum Cipher {
    Gcm(GcmCipher),
    Cbc(CbcCipher),
}

/// Symmetric encryption engine. Holds no per-call state, so one instance can
/// serve any number of threads.
#[derive(Debug)]
pub struct Engine {
    cipher: Cipher,
    encoding: TextEncoding,
    buffer_size: usize,
}

impl Engine {
    pub(crate) fn from_parts(cipher: Cipher, encoding: TextEncoding, buffer_size: usize) -> Self {
        Self {
            cipher,
            encoding,
            buffer_size,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.cipher {
            Cipher::Gcm(_) => Mode::Gcm,
            Cipher::Cbc(_) => Mode::Cbc,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Version tag written into new frames
    pub fn version(&self) -> Version {
        match &self.cipher {
            Cipher::Gcm(c) => c.version(),
            Cipher::Cbc(c) => c.version(),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Chunk sizes used by the file operations
    pub fn chunk_layout(&self) -> CframeResult<ChunkLayout> {
        match self.cipher {
            Cipher::Gcm(_) => ChunkLayout::gcm(self.buffer_size),
            Cipher::Cbc(_) => ChunkLayout::cbc(self.buffer_size),
        }
    }

    pub fn encrypt_bytes(&self, plaintext: &[u8], password: &str) -> CframeResult<Vec<u8>> {
        match &self.cipher {
            Cipher::Gcm(c) => c.seal(plaintext, password),
            Cipher::Cbc(c) => c.seal(plaintext),
        }
    }

    pub fn decrypt_bytes(&self, ciphertext: &[u8], password: &str) -> CframeResult<Vec<u8>> {
        match &self.cipher {
            Cipher::Gcm(c) => c.open(ciphertext, password),
            Cipher::Cbc(c) => c.open(ciphertext),
        }
    }

    /// Encrypt a string into a frame rendered in the engine's text encoding.
    pub fn encrypt_text(&self, plaintext: &str, password: &str) -> CframeResult<String> {
        let frame = self.encrypt_bytes(plaintext.as_bytes(), password)?;
        Ok(frame::encode_text(&frame, self.encoding))
    }

    pub fn decrypt_text(&self, ciphertext: &str, password: &str) -> CframeResult<String> {
        let frame = frame::decode_text(ciphertext, self.encoding)?;
        let plain = self.decrypt_bytes(&frame, password)?;
        Ok(String::from_utf8(plain)?)
    }

    /// Encrypt everything `reader` yields into `writer`, chunk by chunk.
    pub fn encrypt_stream<R: Read, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        password: &str,
    ) -> CframeResult<StreamSummary> {
        let layout = self.chunk_layout()?;
        match &self.cipher {
            Cipher::Gcm(c) => stream::encrypt_gcm(c, layout, reader, writer, password),
            Cipher::Cbc(c) => stream::encrypt_cbc(c, layout, reader, writer),
        }
    }

    pub fn decrypt_stream<R: Read, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        password: &str,
    ) -> CframeResult<StreamSummary> {
        let layout = self.chunk_layout()?;
        match &self.cipher {
            Cipher::Gcm(c) => stream::decrypt_gcm(c, layout, reader, writer, password),
            Cipher::Cbc(c) => stream::decrypt_cbc(c, layout, reader, writer),
        }
    }

    /// Encrypt the file at `src` into `dst` (created or truncated).
    ///
    /// On failure `dst` is left as written so far; removing it is up to the caller.
    pub fn encrypt_file(
        &self,
        src: &Path,
        dst: &Path,
        password: &str,
    ) -> CframeResult<StreamSummary> {
        let mut input = File::open(src)?;
        let mut output = File::create(dst)?;
        tracing::debug!(
            src = %src.display(),
            dst = %dst.display(),
            mode = %self.mode(),
            "encrypting file"
        );
        self.encrypt_stream(&mut input, &mut output, password)
    }

    /// Decrypt the file at `src` into `dst` (created or truncated).
    pub fn decrypt_file(
        &self,
        src: &Path,
        dst: &Path,
        password: &str,
    ) -> CframeResult<StreamSummary> {
        let mut input = File::open(src)?;
        let mut output = File::create(dst)?;
        tracing::debug!(
            src = %src.display(),
            dst = %dst.display(),
            mode = %self.mode(),
            "decrypting file"
        );
        self.decrypt_stream(&mut input, &mut output, password)
    }
}
