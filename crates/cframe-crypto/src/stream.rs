//! Chunked streaming over `Read`/`Write`
//!
//! gcm streams are a concatenation of independent frames. The encrypt side
//! reads `buffer_size - 30` bytes per chunk so that every sealed frame is at
//! most `buffer_size` bytes; the decrypt side reads exactly `buffer_size`
//! bytes per frame. Both sides must use the same `buffer_size`:
//!
//! ```text
//! output_chunk = read_chunk + GCM_FRAME_OVERHEAD   (2 version + 12 nonce + 16 tag)
//! ```
//!
//! gcm frames authenticate only the version tag and password, not their
//! position. A corrupted or cut-short frame fails, but a whole frame that is
//! dropped, duplicated or swapped with another full-size frame goes unnoticed.
//!
//! cbc streams are one frame: the header is written once, then the whole
//! input is chained through a single CBC state. The final chunk is always
//! padded, even when the input ends exactly on a buffer boundary, so the output
//! is identical in layout to a single-buffer cbc frame. Streams written without
//! that trailing pad block do not decode correctly: the last chunk gets unpadded
//! anyway and comes back short.
//!
//! A failing chunk aborts the stream. Bytes already written stay in the sink.

use std::io::{self, Read, Write};

use cframe_core::{CframeError, CframeResult};

use crate::aead::GcmCipher;
use crate::block::CbcCipher;
use crate::frame::{BLOCK_SIZE, CBC_HEADER_SIZE, CBC_IV_SIZE, GCM_FRAME_OVERHEAD};
use crate::padding;
use crate::random::random_array;

/// Default chunk buffer size (16 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Per-direction chunk sizes derived from one buffer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Bytes read per chunk when encrypting
    pub read_chunk: usize,
    /// Bytes read per chunk when decrypting (the encrypted chunk size)
    pub output_chunk: usize,
}

impl ChunkLayout {
    pub fn gcm(buffer_size: usize) -> CframeResult<Self> {
        validate_buffer_size(buffer_size)?;
        Ok(Self {
            read_chunk: buffer_size - GCM_FRAME_OVERHEAD,
            output_chunk: buffer_size,
        })
    }

    /// cbc chunks are raw block runs, so both directions use the full buffer.
    pub fn cbc(buffer_size: usize) -> CframeResult<Self> {
        validate_buffer_size(buffer_size)?;
        Ok(Self {
            read_chunk: buffer_size,
            output_chunk: buffer_size,
        })
    }
}

/// A buffer size must be whole AES blocks and leave room for gcm payload.
pub fn validate_buffer_size(buffer_size: usize) -> CframeResult<()> {
    if buffer_size <= GCM_FRAME_OVERHEAD || buffer_size % BLOCK_SIZE != 0 {
        return Err(CframeError::Config(format!(
            "stream buffer size {buffer_size} must be a multiple of {BLOCK_SIZE} \
             and larger than {GCM_FRAME_OVERHEAD}"
        )));
    }
    Ok(())
}

/// Totals for one streamed operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Chunks processed
    pub chunks: u64,
    /// Bytes read from the source
    pub bytes_in: u64,
    /// Bytes written to the sink
    pub bytes_out: u64,
}

/// Fill `buf` from `reader`, stopping early only at EOF.
///
/// A single `read` may return fewer bytes than asked for; looping keeps
/// chunk boundaries independent of how the source delivers data.
pub fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Seal `reader` chunk by chunk, each chunk as its own gcm frame.
pub fn encrypt_gcm<R: Read, W: Write>(
    cipher: &GcmCipher,
    layout: ChunkLayout,
    reader: &mut R,
    writer: &mut W,
    password: &str,
) -> CframeResult<StreamSummary> {
    let mut summary = StreamSummary::default();
    let mut buf = vec![0u8; layout.read_chunk];

    loop {
        let n = read_chunk(reader, &mut buf)?;
        if n == 0 {
            break;
        }
        let sealed = cipher.seal(&buf[..n], password)?;
        writer.write_all(&sealed)?;

        summary.chunks += 1;
        summary.bytes_in += n as u64;
        summary.bytes_out += sealed.len() as u64;

        if n < layout.read_chunk {
            break;
        }
    }
    writer.flush()?;

    tracing::debug!(
        chunks = summary.chunks,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "gcm stream encrypted"
    );
    Ok(summary)
}

/// Open a stream produced by [`encrypt_gcm`] with the same layout.
pub fn decrypt_gcm<R: Read, W: Write>(
    cipher: &GcmCipher,
    layout: ChunkLayout,
    reader: &mut R,
    writer: &mut W,
    password: &str,
) -> CframeResult<StreamSummary> {
    let mut summary = StreamSummary::default();
    let mut buf = vec![0u8; layout.output_chunk];

    loop {
        let n = read_chunk(reader, &mut buf)?;
        if n == 0 {
            break;
        }
        let plain = cipher.open(&buf[..n], password).map_err(|e| {
            tracing::debug!(chunk = summary.chunks, "gcm chunk rejected");
            e
        })?;
        writer.write_all(&plain)?;

        summary.chunks += 1;
        summary.bytes_in += n as u64;
        summary.bytes_out += plain.len() as u64;

        if n < layout.output_chunk {
            break;
        }
    }
    writer.flush()?;

    tracing::debug!(
        chunks = summary.chunks,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "gcm stream decrypted"
    );
    Ok(summary)
}

/// Encrypt `reader` as one continuous cbc frame.
pub fn encrypt_cbc<R: Read, W: Write>(
    cipher: &CbcCipher,
    layout: ChunkLayout,
    reader: &mut R,
    writer: &mut W,
) -> CframeResult<StreamSummary> {
    let iv: [u8; CBC_IV_SIZE] = random_array()?;
    let mut encryptor = cipher.encryptor(&iv)?;

    writer.write_all(&cipher.version())?;
    writer.write_all(&iv)?;

    let mut summary = StreamSummary {
        bytes_out: CBC_HEADER_SIZE as u64,
        ..StreamSummary::default()
    };
    let mut buf = vec![0u8; layout.read_chunk];

    loop {
        let n = read_chunk(reader, &mut buf)?;
        summary.bytes_in += n as u64;
        summary.chunks += 1;

        if n < layout.read_chunk {
            // Final chunk. May be empty when the input ended on a chunk
            // boundary; padding then supplies one whole block.
            let mut last = buf[..n].to_vec();
            padding::pad(&mut last, BLOCK_SIZE);
            encryptor.encrypt_blocks(&mut last);
            writer.write_all(&last)?;
            summary.bytes_out += last.len() as u64;
            break;
        }

        encryptor.encrypt_blocks(&mut buf);
        writer.write_all(&buf)?;
        summary.bytes_out += buf.len() as u64;
    }
    writer.flush()?;

    tracing::debug!(
        chunks = summary.chunks,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "cbc stream encrypted"
    );
    Ok(summary)
}

/// Decrypt a stream produced by [`encrypt_cbc`].
///
/// Reads one chunk ahead so the chunk followed by EOF can be unpadded.
pub fn decrypt_cbc<R: Read, W: Write>(
    cipher: &CbcCipher,
    layout: ChunkLayout,
    reader: &mut R,
    writer: &mut W,
) -> CframeResult<StreamSummary> {
    let mut header = [0u8; CBC_HEADER_SIZE];
    let n = read_chunk(reader, &mut header)?;
    if n != CBC_HEADER_SIZE {
        return Err(CframeError::MalformedCiphertext(format!(
            "stream too short: {n} bytes (header is {CBC_HEADER_SIZE})"
        )));
    }
    let mut decryptor = cipher.decryptor(&header[2..])?;

    let mut summary = StreamSummary {
        bytes_in: CBC_HEADER_SIZE as u64,
        ..StreamSummary::default()
    };
    let mut current = vec![0u8; layout.read_chunk];
    let mut next = vec![0u8; layout.read_chunk];

    let mut n = read_chunk(reader, &mut current)?;
    if n == 0 {
        return Err(CframeError::MalformedCiphertext(
            "stream has no padded final block".into(),
        ));
    }

    loop {
        if n % BLOCK_SIZE != 0 {
            return Err(CframeError::MalformedCiphertext(format!(
                "ciphertext is not a multiple of the block size: chunk of {n} bytes"
            )));
        }
        summary.bytes_in += n as u64;
        summary.chunks += 1;

        let m = if n < layout.read_chunk {
            0
        } else {
            read_chunk(reader, &mut next)?
        };

        decryptor.decrypt_blocks(&mut current[..n]);
        let plain = if m == 0 {
            padding::unpad(&current[..n])?
        } else {
            &current[..n]
        };
        writer.write_all(plain)?;
        summary.bytes_out += plain.len() as u64;

        if m == 0 {
            break;
        }
        std::mem::swap(&mut current, &mut next);
        n = m;
    }
    writer.flush()?;

    tracing::debug!(
        chunks = summary.chunks,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "cbc stream decrypted"
    );
    Ok(summary)
}
