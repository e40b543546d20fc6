//! Text encoding conversion for location strings.
//!
//! Databases store strings in a legacy 8-bit encoding (GBK for the common
//! releases). These helpers are pure functions: the source and target
//! encodings are always explicit and no process-wide locale is consulted.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Supported string encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// GBK (superset of GB2312)
    #[default]
    Gbk,
    /// UTF-8
    Utf8,
}

impl Encoding {
    /// Canonical label of this encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Gbk => "gbk",
            Encoding::Utf8 => "utf-8",
        }
    }

    /// Parse an encoding label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "gbk" | "gb2312" | "cp936" => Some(Encoding::Gbk),
            "utf8" | "utf-8" => Some(Encoding::Utf8),
            _ => None,
        }
    }

    fn codec(self) -> &'static encoding_rs::Encoding {
        match self {
            Encoding::Gbk => encoding_rs::GBK,
            Encoding::Utf8 => encoding_rs::UTF_8,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s).ok_or_else(|| Error::Config(format!("unknown encoding: {}", s)))
    }
}

/// Decode `bytes` as `from`, failing on malformed input.
pub fn decode(bytes: &[u8], from: Encoding) -> Result<Cow<'_, str>> {
    from.codec()
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(Error::Encoding(from.name()))
}

/// Decode `bytes` as `from`, replacing malformed sequences with U+FFFD.
pub fn decode_lossy(bytes: &[u8], from: Encoding) -> Cow<'_, str> {
    from.codec().decode_without_bom_handling(bytes).0
}

/// Encode `text` as `to`, failing on characters `to` cannot represent.
pub fn encode(text: &str, to: Encoding) -> Result<Cow<'_, [u8]>> {
    let (bytes, _, unmappable) = to.codec().encode(text);
    if unmappable {
        return Err(Error::Encoding(to.name()));
    }
    Ok(bytes)
}

/// Re-encode `bytes` from one encoding to another.
pub fn convert(bytes: &[u8], from: Encoding, to: Encoding) -> Result<Vec<u8>> {
    if from == to {
        return Ok(bytes.to_vec());
    }
    let text = decode(bytes, from)?;
    Ok(encode(&text, to)?.into_owned())
}

/// Decode `bytes` into UTF-16 code units.
pub fn to_wide(bytes: &[u8], from: Encoding) -> Result<Vec<u16>> {
    Ok(decode(bytes, from)?.encode_utf16().collect())
}

/// Encode UTF-16 code units as `to`.
pub fn from_wide(wide: &[u16], to: Encoding) -> Result<Vec<u8>> {
    let text = String::from_utf16(wide).map_err(|_| Error::Encoding("utf-16"))?;
    Ok(encode(&text, to)?.into_owned())
}
