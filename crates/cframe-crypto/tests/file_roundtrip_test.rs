//! File streaming: encrypt a file to disk, decrypt it back, compare bytes.
//!
//! Sizes cover empty files, files inside one chunk, and files landing exactly
//! on chunk boundaries for both the default and a small buffer size.

use std::path::{Path, PathBuf};

use cframe_crypto::{CframeError, Engine, Mode, DEFAULT_BUFFER_SIZE};
use tempfile::TempDir;

fn write_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn gcm_engine(buffer_size: usize) -> Engine {
    Engine::builder()
        .mode(Mode::Gcm)
        .password("my-password")
        .buffer_size(buffer_size)
        .build()
        .expect("gcm engine")
}

fn cbc_engine(buffer_size: usize) -> Engine {
    Engine::builder()
        .mode(Mode::Cbc)
        .buffer_size(buffer_size)
        .build()
        .expect("cbc engine")
}

fn roundtrip(engine: &Engine, tmp: &TempDir, content: &[u8]) {
    let src = write_test_file(tmp.path(), "plain.bin", content);
    let enc = tmp.path().join("plain.bin.enc");
    let dec = tmp.path().join("plain.dec.bin");

    let sealed = engine.encrypt_file(&src, &enc, "").expect("encrypt file");
    assert_eq!(sealed.bytes_in, content.len() as u64);
    assert_eq!(
        sealed.bytes_out,
        std::fs::metadata(&enc).unwrap().len(),
        "summary must match the bytes on disk"
    );

    let opened = engine.decrypt_file(&enc, &dec, "").expect("decrypt file");
    assert_eq!(opened.bytes_out, content.len() as u64);

    let output = std::fs::read(&dec).unwrap();
    assert_eq!(output.len(), content.len());
    assert!(output == content, "decrypted file differs ({} bytes)", content.len());
}

#[test]
fn gcm_file_roundtrip_default_buffer() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(DEFAULT_BUFFER_SIZE);
    let read_chunk = engine.chunk_layout().unwrap().read_chunk;

    for size in [
        0,
        1,
        1000,
        read_chunk - 1,
        read_chunk,
        read_chunk + 1,
        read_chunk * 3,
        DEFAULT_BUFFER_SIZE * 5 + 123,
    ] {
        roundtrip(&engine, &tmp, &make_data(size));
    }
}

#[test]
fn gcm_file_roundtrip_small_buffer() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(256);
    for size in [0, 1, 225, 226, 227, 452, 10_000] {
        roundtrip(&engine, &tmp, &make_data(size));
    }
}

#[test]
fn cbc_file_roundtrip() {
    let tmp = TempDir::new().unwrap();
    for buffer_size in [64, DEFAULT_BUFFER_SIZE] {
        let engine = cbc_engine(buffer_size);
        for size in [
            0,
            1,
            15,
            16,
            17,
            buffer_size - 1,
            buffer_size,
            buffer_size + 1,
            buffer_size * 4,
            buffer_size * 4 + 9,
        ] {
            roundtrip(&engine, &tmp, &make_data(size));
        }
    }
}

#[test]
fn gcm_chunk_count_matches_layout() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(1024);
    let layout = engine.chunk_layout().unwrap();
    let content = make_data(layout.read_chunk * 2 + 10);

    let src = write_test_file(tmp.path(), "chunks.bin", &content);
    let enc = tmp.path().join("chunks.enc");
    let summary = engine.encrypt_file(&src, &enc, "").unwrap();

    assert_eq!(summary.chunks, 3);
    let encrypted_len = std::fs::metadata(&enc).unwrap().len() as usize;
    assert_eq!(encrypted_len, layout.output_chunk * 2 + 10 + 30);
}

#[test]
fn cbc_file_opens_as_single_frame() {
    let tmp = TempDir::new().unwrap();
    let engine = cbc_engine(128);
    let content = make_data(1000);

    let src = write_test_file(tmp.path(), "one.bin", &content);
    let enc = tmp.path().join("one.enc");
    engine.encrypt_file(&src, &enc, "").unwrap();

    let frame = std::fs::read(&enc).unwrap();
    assert_eq!(frame.len(), 18 + 1000 + 8);
    assert_eq!(engine.decrypt_bytes(&frame, "").unwrap(), content);
}

#[test]
fn gcm_file_wrong_password_fails() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(DEFAULT_BUFFER_SIZE);
    let src = write_test_file(tmp.path(), "secret.txt", b"top secret file contents");
    let enc = tmp.path().join("secret.enc");
    let dec = tmp.path().join("secret.dec");

    engine.encrypt_file(&src, &enc, "a").unwrap();
    let err = engine.decrypt_file(&enc, &dec, "b").unwrap_err();
    assert!(matches!(err, CframeError::AuthenticationFailed));
}

#[test]
fn gcm_file_tampered_chunk_aborts() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(512);
    let layout = engine.chunk_layout().unwrap();
    let content = make_data(layout.read_chunk * 4);

    let src = write_test_file(tmp.path(), "big.bin", &content);
    let enc = tmp.path().join("big.enc");
    let dec = tmp.path().join("big.dec");
    engine.encrypt_file(&src, &enc, "").unwrap();

    // Corrupt a byte inside the third chunk.
    let mut bytes = std::fs::read(&enc).unwrap();
    bytes[layout.output_chunk * 2 + 40] ^= 0x80;
    std::fs::write(&enc, &bytes).unwrap();

    let err = engine.decrypt_file(&enc, &dec, "").unwrap_err();
    assert!(matches!(err, CframeError::AuthenticationFailed));

    // The first two chunks were already written; cleanup is the caller's job.
    let partial = std::fs::read(&dec).unwrap();
    assert_eq!(partial, &content[..layout.read_chunk * 2]);
}

#[test]
fn gcm_file_truncated_tail_fails() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(512);
    let layout = engine.chunk_layout().unwrap();
    let content = make_data(layout.read_chunk * 2 + 5);

    let src = write_test_file(tmp.path(), "tail.bin", &content);
    let enc = tmp.path().join("tail.enc");
    let dec = tmp.path().join("tail.dec");
    engine.encrypt_file(&src, &enc, "").unwrap();

    let bytes = std::fs::read(&enc).unwrap();
    std::fs::write(&enc, &bytes[..bytes.len() - 3]).unwrap();

    let err = engine.decrypt_file(&enc, &dec, "").unwrap_err();
    assert!(matches!(err, CframeError::AuthenticationFailed));
}

#[test]
fn missing_source_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let engine = gcm_engine(DEFAULT_BUFFER_SIZE);
    let err = engine
        .encrypt_file(
            &tmp.path().join("does-not-exist"),
            &tmp.path().join("out"),
            "",
        )
        .unwrap_err();
    assert!(matches!(err, CframeError::Io(_)));
}

#[test]
fn cbc_file_truncated_header() {
    let tmp = TempDir::new().unwrap();
    let engine = cbc_engine(DEFAULT_BUFFER_SIZE);
    let enc = write_test_file(tmp.path(), "short.enc", &[0x01, 0x04, 0xAA]);
    let err = engine
        .decrypt_file(&enc, &tmp.path().join("short.dec"), "")
        .unwrap_err();
    assert!(matches!(err, CframeError::MalformedCiphertext(_)));
}
