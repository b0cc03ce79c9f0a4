pub mod config;
pub mod error;
pub mod types;

pub use error::{CframeError, CframeResult};
pub use types::{Mode, TextEncoding};
