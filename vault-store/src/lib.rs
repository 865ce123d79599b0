//! vault-store: the encrypted file vault built on `vault-crypto`.
//!
//! Configuration loading, the object store collaborator, name masking,
//! folder views and the `FileVault` service that ties them together.

pub mod config;
pub mod folders;
pub mod label;
pub mod report;
pub mod store;
pub mod vault;

pub use config::{ConfigError, Overrides, VaultConfig};
pub use folders::FolderListing;
pub use label::LabelRules;
pub use report::{PipelineResult, Status};
pub use store::{FsStore, MemoryStore, ObjectEntry, ObjectStore, StoreError};
pub use vault::{FileVault, VaultError};
