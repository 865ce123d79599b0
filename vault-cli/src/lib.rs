//! Shared pieces of the vault command-line tools.

pub mod args;
pub mod format;
