use alloc::vec::Vec;
use core::fmt;

use crate::aes::{
    self, add_round_key, inv_mix_columns, inv_shift_rows, inv_sub_bytes, mix_columns,
    shift_rows, sub_bytes, RoundKeys, State, ROUNDS,
};
use crate::key::{KeyError, KeyInput};

pub const BLOCK_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// Input was not exactly one block (or, for ECB, not a whole number of blocks).
    InvalidBlockSize(usize),
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::InvalidBlockSize(len) => {
                write!(f, "Block data must be a multiple of {} bytes, got {}", BLOCK_SIZE, len)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BlockError {}

/// AES-128 with the round keys expanded once at construction.
#[derive(Clone)]
pub struct Aes128 {
    round_keys: RoundKeys,
}

impl Aes128 {
    pub fn new(key: &[u8; 16]) -> Self {
        Aes128 {
            round_keys: aes::expand_key(key),
        }
    }

    /// Normalize an external key representation and build the cipher.
    pub fn from_key(key: KeyInput<'_>) -> Result<Self, KeyError> {
        Ok(Self::new(&key.normalize()?))
    }

    pub fn round_keys(&self) -> &RoundKeys {
        &self.round_keys
    }

    pub fn encrypt_block(&self, block: &[u8]) -> Result<[u8; 16], BlockError> {
        let mut state = to_state(block)?;
        self.encrypt_state(&mut state);
        Ok(state)
    }

    pub fn decrypt_block(&self, block: &[u8]) -> Result<[u8; 16], BlockError> {
        let mut state = to_state(block)?;
        self.decrypt_state(&mut state);
        Ok(state)
    }

    fn encrypt_state(&self, state: &mut State) {
        add_round_key(state, &self.round_keys[0]);

        for round_key in &self.round_keys[1..ROUNDS] {
            sub_bytes(state);
            shift_rows(state);
            mix_columns(state);
            add_round_key(state, round_key);
        }

        sub_bytes(state);
        shift_rows(state);
        add_round_key(state, &self.round_keys[ROUNDS]);
    }

    fn decrypt_state(&self, state: &mut State) {
        add_round_key(state, &self.round_keys[ROUNDS]);
        inv_shift_rows(state);
        inv_sub_bytes(state);

        for round_key in self.round_keys[1..ROUNDS].iter().rev() {
            add_round_key(state, round_key);
            inv_mix_columns(state);
            inv_shift_rows(state);
            inv_sub_bytes(state);
        }

        add_round_key(state, &self.round_keys[0]);
    }

    /// Encrypt whole blocks in place, each block independently (ECB).
    pub fn encrypt_ecb_in_place(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        check_aligned(buf)?;
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.encrypt_chunk(chunk);
        }
        Ok(())
    }

    pub fn decrypt_ecb_in_place(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        check_aligned(buf)?;
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.decrypt_chunk(chunk);
        }
        Ok(())
    }

    pub fn encrypt_ecb(&self, plaintext: &[u8]) -> Result<Vec<u8>, BlockError> {
        let mut buf = plaintext.to_vec();
        self.encrypt_ecb_in_place(&mut buf)?;
        Ok(buf)
    }

    pub fn decrypt_ecb(&self, ciphertext: &[u8]) -> Result<Vec<u8>, BlockError> {
        let mut buf = ciphertext.to_vec();
        self.decrypt_ecb_in_place(&mut buf)?;
        Ok(buf)
    }

    /// ECB has no chaining, so blocks can be spread across the rayon pool.
    #[cfg(feature = "parallel")]
    pub fn par_encrypt_ecb_in_place(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        use rayon::prelude::*;
        check_aligned(buf)?;
        buf.par_chunks_exact_mut(BLOCK_SIZE)
            .for_each(|chunk| self.encrypt_chunk(chunk));
        Ok(())
    }

    #[cfg(feature = "parallel")]
    pub fn par_decrypt_ecb_in_place(&self, buf: &mut [u8]) -> Result<(), BlockError> {
        use rayon::prelude::*;
        check_aligned(buf)?;
        buf.par_chunks_exact_mut(BLOCK_SIZE)
            .for_each(|chunk| self.decrypt_chunk(chunk));
        Ok(())
    }

    fn encrypt_chunk(&self, chunk: &mut [u8]) {
        let mut state = [0u8; 16];
        state.copy_from_slice(chunk);
        self.encrypt_state(&mut state);
        chunk.copy_from_slice(&state);
    }

    fn decrypt_chunk(&self, chunk: &mut [u8]) {
        let mut state = [0u8; 16];
        state.copy_from_slice(chunk);
        self.decrypt_state(&mut state);
        chunk.copy_from_slice(&state);
    }
}

fn to_state(block: &[u8]) -> Result<State, BlockError> {
    block
        .try_into()
        .map_err(|_| BlockError::InvalidBlockSize(block.len()))
}

fn check_aligned(buf: &[u8]) -> Result<(), BlockError> {
    if buf.len() % BLOCK_SIZE != 0 {
        return Err(BlockError::InvalidBlockSize(buf.len()));
    }
    Ok(())
}
