use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CframeError;

/// Cipher mode of an engine
///
/// Deserializes through [`FromStr`], so config files accept the same
/// spellings as the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    /// AES-GCM (AEAD). Frames carry a 12-byte nonce and a 16-byte tag.
    #[default]
    #[serde(rename = "gcm")]
    Gcm,
    /// AES-256-CBC with PKCS#7 padding. Frames carry a 16-byte IV.
    #[serde(rename = "cbc")]
    Cbc,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Gcm => "gcm",
            Mode::Cbc => "cbc",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcm" | "aead" => Ok(Mode::Gcm),
            "cbc" | "block" => Ok(Mode::Cbc),
            _ => Err(CframeError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Textual encoding applied to whole frames by the text operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Standard alphabet, padded
    #[default]
    Base64,
    /// Lowercase
    Hex,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Base64 => "base64",
            TextEncoding::Hex => "hex",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = CframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(TextEncoding::Base64),
            "hex" => Ok(TextEncoding::Hex),
            _ => Err(CframeError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for TextEncoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_from_str(deserializer)
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_from_str(deserializer)
    }
}

fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = CframeError>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        assert_eq!("gcm".parse::<Mode>().unwrap(), Mode::Gcm);
        assert_eq!("GCM".parse::<Mode>().unwrap(), Mode::Gcm);
        assert_eq!("aead".parse::<Mode>().unwrap(), Mode::Gcm);
        assert_eq!("cbc".parse::<Mode>().unwrap(), Mode::Cbc);
        assert_eq!("block".parse::<Mode>().unwrap(), Mode::Cbc);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "ecb".parse::<Mode>().unwrap_err();
        assert!(matches!(err, CframeError::UnsupportedMode(m) if m == "ecb"));
    }

    #[test]
    fn parse_encodings() {
        assert_eq!("base64".parse::<TextEncoding>().unwrap(), TextEncoding::Base64);
        assert_eq!("Hex".parse::<TextEncoding>().unwrap(), TextEncoding::Hex);
        assert!(matches!(
            "base32".parse::<TextEncoding>(),
            Err(CframeError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn defaults() {
        assert_eq!(Mode::default(), Mode::Gcm);
        assert_eq!(TextEncoding::default(), TextEncoding::Base64);
    }

    #[test]
    fn display_matches_parse() {
        for mode in [Mode::Gcm, Mode::Cbc] {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
        for enc in [TextEncoding::Base64, TextEncoding::Hex] {
            assert_eq!(enc.to_string().parse::<TextEncoding>().unwrap(), enc);
        }
    }
}
