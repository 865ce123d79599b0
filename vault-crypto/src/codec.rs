//! Base64 wrapping of binary payloads.
//!
//! File contents are turned into standard (padded) base64 text before
//! encryption, and decoded again after decryption.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

#[derive(Debug, PartialEq, Eq)]
pub enum CodecError {
    InvalidBase64,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidBase64 => write!(f, "Invalid base64 payload"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(text: &[u8]) -> Result<Vec<u8>, CodecError> {
    STANDARD.decode(text).map_err(|_| CodecError::InvalidBase64)
}

/// Length of `encode(data)` for `data.len() == n`.
pub fn encoded_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}
