//! cframe-crypto: symmetric encryption of buffers, text and files under a
//! small versioned wire format
//!
//! Modes:
//! ```text
//! gcm: [version 2][nonce 12][ciphertext][tag 16]      AAD = version || password
//!      key: 128, 192 or 256 bits; one frame per buffer, one frame per file chunk
//! cbc: [version 2][IV 16][CBC(PKCS#7(plaintext))]
//!      key: 256 bits; one frame per buffer, one frame per file
//! ```
//!
//! Layers, leaves first: `random` (nonces/IVs) → `keys` → `padding` →
//! `frame` → `aead` / `block` → `stream` → `engine` (built by `resolver`).

pub mod aead;
pub mod block;
pub mod engine;
pub mod frame;
pub mod keys;
pub mod padding;
pub mod random;
pub mod resolver;
pub mod stream;

pub use cframe_core::{CframeError, CframeResult, Mode, TextEncoding};
pub use engine::Engine;
pub use frame::{Version, DEFAULT_CBC_VERSION, DEFAULT_GCM_VERSION};
pub use keys::{generate_key, SymmetricKey, DEFAULT_KEY};
pub use resolver::EngineBuilder;
pub use stream::{ChunkLayout, StreamSummary, DEFAULT_BUFFER_SIZE};
