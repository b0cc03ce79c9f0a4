//! Nonce / IV source
//!
//! Every call draws fresh bytes from the operating system CSPRNG. There is no
//! counter: with random 96-bit GCM nonces, do not seal more than 2^32 frames
//! under one key.

use rand::rngs::OsRng;
use rand::RngCore;

use cframe_core::{CframeError, CframeResult};

/// Read `len` bytes from the OS random source.
pub fn random_bytes(len: usize) -> CframeResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    fill(&mut buf)?;
    Ok(buf)
}

/// Fixed-size variant of [`random_bytes`], used for nonces and IVs.
pub fn random_array<const N: usize>() -> CframeResult<[u8; N]> {
    let mut buf = [0u8; N];
    fill(&mut buf)?;
    Ok(buf)
}

fn fill(buf: &mut [u8]) -> CframeResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CframeError::EntropyFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_length() {
        assert_eq!(random_bytes(0).unwrap().len(), 0);
        assert_eq!(random_bytes(12).unwrap().len(), 12);
        assert_eq!(random_bytes(1000).unwrap().len(), 1000);
    }

    #[test]
    fn calls_are_independent() {
        let a: [u8; 16] = random_array().unwrap();
        let b: [u8; 16] = random_array().unwrap();
        assert_ne!(a, b, "two 128-bit draws must differ");
    }
}
