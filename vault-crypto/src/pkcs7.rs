use alloc::vec::Vec;
use core::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum PadError {
    InvalidPadding,
}

impl fmt::Display for PadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadError::InvalidPadding => write!(f, "Invalid padding"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PadError {}

pub const BLOCK_SIZE: usize = 16;

/// Append 1..=block_size bytes, each equal to the pad length.
/// Aligned input gains a whole extra block.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let n = block_size - (data.len() % block_size);
    let mut result = Vec::with_capacity(data.len() + n);
    result.extend_from_slice(data);
    result.resize(data.len() + n, n as u8);
    result
}

/// Strip and verify padding. Every pad byte must equal the pad length.
pub fn unpad(data: &[u8], block_size: usize) -> Result<&[u8], PadError> {
    if data.is_empty() || data.len() % block_size != 0 {
        return Err(PadError::InvalidPadding);
    }
    let n = data[data.len() - 1] as usize;
    if n == 0 || n > block_size {
        return Err(PadError::InvalidPadding);
    }
    let (body, padding) = data.split_at(data.len() - n);
    if padding.iter().any(|&b| b as usize != n) {
        return Err(PadError::InvalidPadding);
    }
    Ok(body)
}
