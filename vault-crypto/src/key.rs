//! Cipher key normalization and generation.
//!
//! Keys arrive either as raw bytes or as text. Text keys are 16 characters
//! (used verbatim as UTF-8) or 32 hex characters (decoded to 16 bytes).

use alloc::string::String;
use core::fmt;

use crate::Rng;

pub const KEY_SIZE: usize = 16;
const TEXT_KEY_CHARS: usize = 16;
const HEX_KEY_CHARS: usize = 32;

const KEY_CHARSET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Neither 16 nor 32 characters.
    InvalidKeyFormat,
    /// Right shape, wrong number of bytes (binary keys, or non-ASCII text keys).
    InvalidKeyLength,
    /// 32 characters that are not all hex digits.
    InvalidKeyEncoding,
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidKeyFormat => {
                write!(f, "Key must be 16 characters (text) or 32 characters (hex)")
            }
            KeyError::InvalidKeyLength => write!(f, "Key must be exactly 128 bits (16 bytes)"),
            KeyError::InvalidKeyEncoding => write!(f, "Invalid hex character in 32-character key"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KeyError {}

/// An external key representation, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl<'a> From<&'a str> for KeyInput<'a> {
    fn from(s: &'a str) -> Self {
        KeyInput::Text(s)
    }
}

impl<'a> From<&'a [u8]> for KeyInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        KeyInput::Bytes(b)
    }
}

impl KeyInput<'_> {
    /// Reduce to exactly 16 raw key bytes.
    pub fn normalize(&self) -> Result<[u8; KEY_SIZE], KeyError> {
        match *self {
            KeyInput::Bytes(bytes) => {
                bytes.try_into().map_err(|_| KeyError::InvalidKeyLength)
            }
            KeyInput::Text(text) => normalize_text(text),
        }
    }
}

fn normalize_text(text: &str) -> Result<[u8; KEY_SIZE], KeyError> {
    match text.chars().count() {
        HEX_KEY_CHARS => decode_hex_key(text),
        TEXT_KEY_CHARS => text
            .as_bytes()
            .try_into()
            .map_err(|_| KeyError::InvalidKeyLength),
        _ => Err(KeyError::InvalidKeyFormat),
    }
}

fn decode_hex_key(text: &str) -> Result<[u8; KEY_SIZE], KeyError> {
    let bytes = text.as_bytes();
    // Multi-byte characters make the byte length exceed 32; those are not hex either.
    if bytes.len() != HEX_KEY_CHARS {
        return Err(KeyError::InvalidKeyEncoding);
    }
    let mut key = [0u8; KEY_SIZE];
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let hi = hex_val(pair[0]).ok_or(KeyError::InvalidKeyEncoding)?;
        let lo = hex_val(pair[1]).ok_or(KeyError::InvalidKeyEncoding)?;
        key[i] = (hi << 4) | lo;
    }
    Ok(key)
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Generate a 16-character alphanumeric text key.
pub fn generate_text_key(rng: &mut dyn Rng) -> String {
    let mut raw = [0u8; TEXT_KEY_CHARS];
    rng.fill_bytes(&mut raw);
    raw.iter()
        .map(|&b| KEY_CHARSET[b as usize % KEY_CHARSET.len()] as char)
        .collect()
}

/// Generate a key as 32 lowercase hex characters.
pub fn generate_hex_key(rng: &mut dyn Rng) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut raw = [0u8; KEY_SIZE];
    rng.fill_bytes(&mut raw);
    let mut s = String::with_capacity(HEX_KEY_CHARS);
    for b in raw {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0f) as usize] as char);
    }
    s
}
