//! PKCS#7 block padding for cbc frames
//!
//! `pad` always appends at least one byte: an input that is already block
//! aligned gets a whole extra block whose bytes all equal the block size.
//!
//! `unpad` trusts the final byte. It only range-checks the pad length so a
//! corrupt frame cannot slice out of bounds; it does not compare the other
//! padding bytes.

use cframe_core::{CframeError, CframeResult};

/// Number of padding bytes `pad` appends to a buffer of `len` bytes.
pub fn pad_len(len: usize, block_size: usize) -> usize {
    block_size - len % block_size
}

/// Append PKCS#7 padding so that `buf.len()` becomes a multiple of `block_size`.
pub fn pad(buf: &mut Vec<u8>, block_size: usize) {
    debug_assert!((1..=255).contains(&block_size));
    let n = pad_len(buf.len(), block_size);
    buf.resize(buf.len() + n, n as u8);
}

/// Strip padding, returning the unpadded prefix of `buf`.
pub fn unpad(buf: &[u8]) -> CframeResult<&[u8]> {
    let Some(&last) = buf.last() else {
        return Err(CframeError::MalformedCiphertext(
            "no padded block to strip".into(),
        ));
    };
    let n = last as usize;
    if n == 0 || n > buf.len() {
        return Err(CframeError::MalformedCiphertext(format!(
            "invalid padding length {n} for {} bytes",
            buf.len()
        )));
    }
    Ok(&buf[..buf.len() - n])
}
