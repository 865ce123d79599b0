//! vault-crypto: hand-built AES-128 for the file vault.
//!
//! Everything here is pure and synchronous. The cipher runs in ECB mode with
//! PKCS#7 padding, and file payloads are base64-wrapped before encryption so
//! that ciphertexts stay byte-compatible with the vault's existing objects.
//! ECB leaks repeated plaintext blocks and there is no MAC; see `pipeline`.

#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub mod gf;
pub mod aes;
pub mod aes128;
pub mod key;
pub mod pkcs7;
pub mod codec;
pub mod pipeline;

pub use aes128::{Aes128, BlockError, BLOCK_SIZE};
pub use key::{KeyError, KeyInput};
pub use pipeline::{
    CipherError, CipherInfo, CipherResult, FileDecryptionPipeline, FileEncryptionPipeline,
    PlainResult, ALGORITHM_TAG,
};

/// Random byte source used for key generation.
pub trait Rng {
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Repeats a fixed byte pattern. Only useful in tests.
pub struct FixedRng {
    bytes: alloc::vec::Vec<u8>,
    pos: usize,
}

impl FixedRng {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            pos: 0,
        }
    }
}

impl Rng for FixedRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for b in dest.iter_mut() {
            *b = self.bytes[self.pos % self.bytes.len()];
            self.pos += 1;
        }
    }
}

/// OS-backed RNG reading `/dev/urandom`.
#[cfg(feature = "std")]
pub struct OsRng;

#[cfg(feature = "std")]
impl Rng for OsRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        use std::io::Read;
        let mut f = std::fs::File::open("/dev/urandom").expect("Failed to open /dev/urandom");
        f.read_exact(dest).expect("Failed to read from /dev/urandom");
    }
}
