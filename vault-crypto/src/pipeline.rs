//! File encryption and decryption pipelines.
//!
//! Encryption: raw bytes -> base64 text -> PKCS#7 pad -> AES-128-ECB.
//! Decryption is the exact reverse.
//!
//! The output has no header, IV or MAC: it is just `n * 16` bytes of ECB
//! ciphertext. Identical plaintext blocks give identical ciphertext blocks,
//! and the only integrity check is padding validation, so a wrong key or a
//! corrupted object is detected with high probability but not with
//! certainty. Every decryption failure is reported as
//! [`CipherError::DecryptionFailed`] without saying which step rejected it.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::aes128::{Aes128, BlockError, BLOCK_SIZE};
use crate::codec;
use crate::key::{KeyError, KeyInput};
use crate::pkcs7;

/// Tag attached to every pipeline result.
pub const ALGORITHM_TAG: &str = "AES-128-Binary-Custom";

/// Payloads of at least this many padded bytes are split across threads
/// when the `parallel` feature is enabled.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    InvalidKey(KeyError),
    InvalidBlockSize(usize),
    /// Wrong key or corrupted ciphertext.
    DecryptionFailed,
}

impl fmt::Display for CipherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherError::InvalidKey(e) => write!(f, "Invalid cipher key: {}", e),
            CipherError::InvalidBlockSize(len) => write!(f, "Invalid block size: {}", len),
            CipherError::DecryptionFailed => {
                write!(f, "Decryption failed (wrong key or corrupted data)")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CipherError {}

impl From<KeyError> for CipherError {
    fn from(e: KeyError) -> Self {
        CipherError::InvalidKey(e)
    }
}

impl From<BlockError> for CipherError {
    fn from(e: BlockError) -> Self {
        match e {
            BlockError::InvalidBlockSize(len) => CipherError::InvalidBlockSize(len),
        }
    }
}

/// Outcome of a successful encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherResult {
    pub ciphertext: Vec<u8>,
    pub original_size: usize,
    pub encrypted_size: usize,
    pub algorithm: &'static str,
}

/// Outcome of a successful decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainResult {
    pub plaintext: Vec<u8>,
    pub original_size: usize,
    pub encrypted_size: usize,
    pub algorithm: &'static str,
}

/// Static description of the engine, for diagnostics and the `info` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherInfo {
    pub algorithm: &'static str,
    pub implementation: &'static str,
    pub key_size_bits: u32,
    pub block_size_bits: u32,
    pub mode: &'static str,
    pub padding: &'static str,
    pub key_formats: [&'static str; 2],
    pub input_format: &'static str,
    pub output_format: &'static str,
}

impl CipherInfo {
    pub const fn describe() -> Self {
        CipherInfo {
            algorithm: "AES-128-ECB",
            implementation: "from scratch, base64-wrapped binary payloads",
            key_size_bits: 128,
            block_size_bits: 128,
            mode: "ECB",
            padding: "PKCS#7",
            key_formats: ["16-character text", "32-character hex"],
            input_format: "binary",
            output_format: "binary",
        }
    }
}

/// Bounds on what a ciphertext of a given length decrypts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    pub blocks: usize,
    pub min_encoded: usize,
    pub max_encoded: usize,
    pub min_plain: usize,
    pub max_plain: usize,
}

/// Cheap structural check: non-empty and block aligned.
pub fn validate_ciphertext(ciphertext: &[u8]) -> bool {
    !ciphertext.is_empty() && ciphertext.len() % BLOCK_SIZE == 0
}

/// Estimate the decrypted size without the key. `None` for misaligned input.
pub fn estimate_plaintext_size(encrypted_len: usize) -> Option<SizeEstimate> {
    if encrypted_len == 0 || encrypted_len % BLOCK_SIZE != 0 {
        return None;
    }
    // Padding strips 1..=16 bytes.
    let min_encoded = encrypted_len - BLOCK_SIZE;
    let max_encoded = encrypted_len - 1;
    Some(SizeEstimate {
        blocks: encrypted_len / BLOCK_SIZE,
        min_encoded,
        max_encoded,
        min_plain: (min_encoded / 4 * 3).saturating_sub(2),
        max_plain: max_encoded / 4 * 3,
    })
}

/// Cipher plus the choice between sequential and block-parallel ECB.
#[derive(Clone)]
struct BlockEngine {
    cipher: Aes128,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel_threshold: usize,
}

impl BlockEngine {
    fn new(cipher: Aes128) -> Self {
        BlockEngine {
            cipher,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    #[cfg(feature = "parallel")]
    fn encrypt(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        if buf.len() >= self.parallel_threshold {
            self.cipher.par_encrypt_ecb_in_place(buf)
        } else {
            self.cipher.encrypt_ecb_in_place(buf)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn encrypt(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        self.cipher.encrypt_ecb_in_place(buf)
    }

    #[cfg(feature = "parallel")]
    fn decrypt(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        if buf.len() >= self.parallel_threshold {
            self.cipher.par_decrypt_ecb_in_place(buf)
        } else {
            self.cipher.decrypt_ecb_in_place(buf)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn decrypt(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        self.cipher.decrypt_ecb_in_place(buf)
    }
}

#[derive(Clone)]
pub struct FileEncryptionPipeline {
    engine: BlockEngine,
}

impl FileEncryptionPipeline {
    pub fn new(key: KeyInput<'_>) -> Result<Self, CipherError> {
        Ok(Self::from_cipher(Aes128::from_key(key)?))
    }

    pub fn from_cipher(cipher: Aes128) -> Self {
        FileEncryptionPipeline {
            engine: BlockEngine::new(cipher),
        }
    }

    /// Padded length at or above which blocks are processed in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.engine.parallel_threshold = threshold;
        self
    }

    /// Encrypt a binary payload.
    pub fn encrypt(&self, raw: &[u8]) -> Result<CipherResult, CipherError> {
        let encoded = codec::encode(raw);
        let ciphertext = self.seal(encoded.as_bytes())?;
        Ok(CipherResult {
            encrypted_size: ciphertext.len(),
            ciphertext,
            original_size: raw.len(),
            algorithm: ALGORITHM_TAG,
        })
    }

    /// Encrypt UTF-8 text directly, without the base64 step.
    pub fn encrypt_text(&self, text: &str) -> Result<CipherResult, CipherError> {
        let ciphertext = self.seal(text.as_bytes())?;
        Ok(CipherResult {
            encrypted_size: ciphertext.len(),
            ciphertext,
            original_size: text.len(),
            algorithm: ALGORITHM_TAG,
        })
    }

    fn seal(&self, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut buf = pkcs7::pad(data, BLOCK_SIZE);
        self.engine.encrypt(&mut buf)?;
        Ok(buf)
    }
}

#[derive(Clone)]
pub struct FileDecryptionPipeline {
    engine: BlockEngine,
}

impl FileDecryptionPipeline {
    pub fn new(key: KeyInput<'_>) -> Result<Self, CipherError> {
        Ok(Self::from_cipher(Aes128::from_key(key)?))
    }

    pub fn from_cipher(cipher: Aes128) -> Self {
        FileDecryptionPipeline {
            engine: BlockEngine::new(cipher),
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.engine.parallel_threshold = threshold;
        self
    }

    /// Decrypt a payload produced by [`FileEncryptionPipeline::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<PlainResult, CipherError> {
        let encoded = self.open(ciphertext)?;
        let plaintext = codec::decode(&encoded).map_err(|_| CipherError::DecryptionFailed)?;
        Ok(PlainResult {
            original_size: plaintext.len(),
            plaintext,
            encrypted_size: ciphertext.len(),
            algorithm: ALGORITHM_TAG,
        })
    }

    /// Decrypt a payload produced by [`FileEncryptionPipeline::encrypt_text`].
    /// Line endings are normalized to `\n`.
    pub fn decrypt_text(&self, ciphertext: &[u8]) -> Result<String, CipherError> {
        let bytes = self.open(ciphertext)?;
        let text = String::from_utf8(bytes).map_err(|_| CipherError::DecryptionFailed)?;
        Ok(text.replace("\r\n", "\n"))
    }

    fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if !validate_ciphertext(ciphertext) {
            return Err(CipherError::DecryptionFailed);
        }
        let mut buf = ciphertext.to_vec();
        self.engine.decrypt(&mut buf)?;
        let len = pkcs7::unpad(&buf, BLOCK_SIZE)
            .map_err(|_| CipherError::DecryptionFailed)?
            .len();
        buf.truncate(len);
        Ok(buf)
    }
}

/// One-shot encryption under a key given in any accepted format.
pub fn encrypt(raw: &[u8], key: KeyInput<'_>) -> Result<CipherResult, CipherError> {
    FileEncryptionPipeline::new(key)?.encrypt(raw)
}

/// One-shot decryption under a key given in any accepted format.
pub fn decrypt(ciphertext: &[u8], key: KeyInput<'_>) -> Result<PlainResult, CipherError> {
    FileDecryptionPipeline::new(key)?.decrypt(ciphertext)
}
