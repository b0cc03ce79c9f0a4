use thiserror::Error;

pub type CframeResult<T> = Result<T, CframeError>;

#[derive(Debug, Error)]
pub enum CframeError {
    #[error("unsupported mode: {0:?} (only gcm and cbc are supported)")]
    UnsupportedMode(String),

    #[error("unsupported text encoding: {0:?} (only base64 and hex are supported)")]
    UnsupportedEncoding(String),

    #[error("password is required in gcm mode")]
    MissingPassword,

    #[error("key is not a valid base64 string: {0}")]
    InvalidKeyEncoding(String),

    #[error("invalid key size: {bits} bits (gcm allows 128, 192 or 256; cbc requires 256)")]
    InvalidKeySize { bits: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("secure random source failed: {0}")]
    EntropyFailure(String),

    /// Tag mismatch. Deliberately carries no detail: wrong key, wrong
    /// password and tampered bytes all look the same to the caller.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("decrypted text is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CframeError {
    /// True for errors raised while resolving an engine (bad mode, encoding,
    /// password, key or config). These never go away on retry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMode(_)
                | Self::UnsupportedEncoding(_)
                | Self::MissingPassword
                | Self::InvalidKeyEncoding(_)
                | Self::InvalidKeySize { .. }
                | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_family() {
        assert!(CframeError::MissingPassword.is_configuration());
        assert!(CframeError::InvalidKeySize { bits: 64 }.is_configuration());
        assert!(CframeError::UnsupportedMode("ecb".into()).is_configuration());
        assert!(!CframeError::AuthenticationFailed.is_configuration());
        assert!(!CframeError::MalformedCiphertext("short".into()).is_configuration());
    }

    #[test]
    fn authentication_message_is_opaque() {
        assert_eq!(
            CframeError::AuthenticationFailed.to_string(),
            "authentication failed"
        );
    }
}
