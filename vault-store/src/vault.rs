//! The file vault: encrypt on upload, decrypt on download, folders on top
//! of an object store.
//!
//! Names passed in are user-facing; they go through the label rules before
//! reaching the store. Ciphertext is the only thing ever written.

use std::fmt;

use vault_crypto::key::KeyInput;
use vault_crypto::{CipherError, FileDecryptionPipeline, FileEncryptionPipeline};

use crate::config::{ConfigError, VaultConfig};
use crate::folders::{self, FolderListing};
use crate::label::LabelRules;
use crate::report::PipelineResult;
use crate::store::{validate_key, FsStore, ObjectEntry, ObjectStore, StoreError};

#[derive(Debug)]
pub enum VaultError {
    Config(ConfigError),
    Cipher(CipherError),
    Store(StoreError),
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::Config(e) => write!(f, "{}", e),
            VaultError::Cipher(e) => write!(f, "{}", e),
            VaultError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for VaultError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VaultError::Config(e) => Some(e),
            VaultError::Cipher(e) => Some(e),
            VaultError::Store(e) => Some(e),
        }
    }
}

impl From<ConfigError> for VaultError {
    fn from(e: ConfigError) -> Self {
        VaultError::Config(e)
    }
}

impl From<CipherError> for VaultError {
    fn from(e: CipherError) -> Self {
        VaultError::Cipher(e)
    }
}

impl From<StoreError> for VaultError {
    fn from(e: StoreError) -> Self {
        VaultError::Store(e)
    }
}

pub struct FileVault<S: ObjectStore> {
    store: S,
    encryptor: FileEncryptionPipeline,
    decryptor: FileDecryptionPipeline,
    labels: LabelRules,
}

impl FileVault<FsStore> {
    /// Open the filesystem vault described by `config`.
    pub fn open(config: &VaultConfig) -> Result<Self, VaultError> {
        let root = config.storage_root();
        let store = FsStore::open(&root, config.storage.create_root)?;
        log::info!("Vault opened at {}", root.display());
        Self::from_config(store, config)
    }
}

impl<S: ObjectStore> FileVault<S> {
    pub fn new(store: S, key: KeyInput<'_>) -> Result<Self, VaultError> {
        Ok(FileVault {
            store,
            encryptor: FileEncryptionPipeline::new(key)?,
            decryptor: FileDecryptionPipeline::new(key)?,
            labels: LabelRules::default(),
        })
    }

    /// Build a vault over `store` using the key, parallel threshold and
    /// label rules from `config`.
    pub fn from_config(store: S, config: &VaultConfig) -> Result<Self, VaultError> {
        let key = KeyInput::Text(config.key()?);
        let threshold = config.cipher.parallel_threshold;
        Ok(FileVault {
            store,
            encryptor: FileEncryptionPipeline::new(key)?.with_parallel_threshold(threshold),
            decryptor: FileDecryptionPipeline::new(key)?.with_parallel_threshold(threshold),
            labels: config.label_rules(),
        })
    }

    pub fn with_labels(mut self, labels: LabelRules) -> Self {
        self.labels = labels;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn labels(&self) -> &LabelRules {
        &self.labels
    }

    /// Object key a user-facing file name is stored under.
    fn object_key(&self, name: &str) -> Result<String, VaultError> {
        let key = self.labels.storage_name(name.trim_start_matches('/'));
        if key.ends_with('/') {
            return Err(StoreError::InvalidKey(name.to_string()).into());
        }
        validate_key(&key)?;
        Ok(key)
    }

    /// Encrypt `data` and store it under the masked form of `name`.
    pub fn upload(&self, name: &str, data: &[u8]) -> Result<PipelineResult, VaultError> {
        let key = self.object_key(name)?;
        let result = self.encryptor.encrypt(data).map_err(|e| {
            log::warn!("Encryption of {} failed: {}", key, e);
            e
        })?;
        self.store.put(&key, &result.ciphertext).map_err(|e| {
            log::warn!("Storing {} failed: {}", key, e);
            e
        })?;
        log::info!(
            "Uploaded {} ({} bytes -> {} bytes encrypted)",
            key,
            result.original_size,
            result.encrypted_size
        );
        Ok(PipelineResult::encrypted(&result, Some(&key)))
    }

    /// Fetch and decrypt the object stored for `name`.
    pub fn download(&self, name: &str) -> Result<(Vec<u8>, PipelineResult), VaultError> {
        let key = self.object_key(name)?;
        let ciphertext = self.store.get(&key)?;
        let plain = self.decryptor.decrypt(&ciphertext).map_err(|e| {
            log::warn!("Decryption of {} failed: {}", key, e);
            e
        })?;
        log::info!(
            "Downloaded {} ({} bytes encrypted -> {} bytes)",
            key,
            plain.encrypted_size,
            plain.original_size
        );
        let report = PipelineResult::decrypted(&plain, Some(&key));
        Ok((plain.plaintext, report))
    }

    /// Move an object to a new name. The ciphertext is copied as-is.
    pub fn rename(&self, from: &str, to: &str) -> Result<String, VaultError> {
        let from_key = self.object_key(from)?;
        let to_key = self.object_key(to)?;
        if !self.store.exists(&from_key)? {
            return Err(StoreError::NotFound(from_key).into());
        }
        if from_key == to_key {
            return Ok(to_key);
        }
        if self.store.exists(&to_key)? {
            return Err(StoreError::AlreadyExists(to_key).into());
        }
        let data = self.store.get(&from_key)?;
        self.store.put(&to_key, &data)?;
        self.store.delete(&from_key)?;
        log::info!("Renamed {} to {}", from_key, to_key);
        Ok(to_key)
    }

    pub fn remove(&self, name: &str) -> Result<(), VaultError> {
        let key = self.object_key(name)?;
        self.store.delete(&key)?;
        log::info!("Removed {}", key);
        Ok(())
    }

    /// Create a folder marker. Returns the marker key.
    pub fn create_folder(&self, path: &str) -> Result<String, VaultError> {
        let key = folders::folder_key(path)?;
        if key.is_empty() {
            return Err(StoreError::InvalidKey(path.to_string()).into());
        }
        self.store.put(&key, &[])?;
        log::info!("Created folder {}", key);
        Ok(key)
    }

    /// Top-level folders.
    pub fn root_folders(&self) -> Result<Vec<String>, VaultError> {
        Ok(self.list_folder("")?.folders)
    }

    /// Files and sub-folders directly inside `path` ("" for the root).
    pub fn list_folder(&self, path: &str) -> Result<FolderListing, VaultError> {
        let prefix = folders::folder_key(path)?;
        let entries = self.store.list(&prefix)?;
        if !prefix.is_empty() && entries.is_empty() {
            return Err(StoreError::NotFound(prefix).into());
        }
        let listing = folders::direct_children(&entries, &prefix);
        log::debug!(
            "Listed '{}': {} folders, {} files",
            prefix,
            listing.folders.len(),
            listing.files.len()
        );
        Ok(listing)
    }

    /// Delete a folder and everything below it. Returns the number of files
    /// removed; folder markers are not counted.
    pub fn remove_folder(&self, path: &str) -> Result<usize, VaultError> {
        let prefix = folders::folder_key(path)?;
        if prefix.is_empty() {
            return Err(StoreError::InvalidKey(path.to_string()).into());
        }
        let entries = self.store.list(&prefix)?;
        if entries.is_empty() {
            return Err(StoreError::NotFound(prefix).into());
        }
        let removed = self.delete_entries(entries)?;
        log::info!("Removed folder {} ({} files)", prefix, removed);
        Ok(removed)
    }

    /// Move a folder, its sub-folders and files to a new path. Ciphertext is
    /// copied as-is. Returns the new folder key.
    pub fn rename_folder(&self, from: &str, to: &str) -> Result<String, VaultError> {
        let from_prefix = folders::folder_key(from)?;
        let to_prefix = folders::folder_key(to)?;
        if from_prefix.is_empty() {
            return Err(StoreError::InvalidKey(from.to_string()).into());
        }
        // Also covers moving a folder into itself.
        if to_prefix.is_empty() || to_prefix.starts_with(&from_prefix) {
            return Err(StoreError::InvalidKey(to.to_string()).into());
        }
        let entries = self.store.list(&from_prefix)?;
        if entries.is_empty() {
            return Err(StoreError::NotFound(from_prefix).into());
        }
        if !self.store.list(&to_prefix)?.is_empty() {
            return Err(StoreError::AlreadyExists(to_prefix).into());
        }

        // Sorted keys put every marker before what lives under it.
        for entry in &entries {
            let target = format!("{}{}", to_prefix, &entry.key[from_prefix.len()..]);
            if entry.is_folder() {
                self.store.put(&target, &[])?;
            } else {
                let data = self.store.get(&entry.key)?;
                self.store.put(&target, &data)?;
            }
        }
        let moved = self.delete_entries(entries)?;
        log::info!("Renamed folder {} to {} ({} files)", from_prefix, to_prefix, moved);
        Ok(to_prefix)
    }

    /// Delete `entries` files first, markers deepest first. Returns the
    /// number of files deleted.
    fn delete_entries(&self, entries: Vec<ObjectEntry>) -> Result<usize, VaultError> {
        let mut files = 0;
        for entry in folders::removal_order(entries) {
            match self.store.delete(&entry.key) {
                Ok(()) if !entry.is_folder() => files += 1,
                Ok(()) => {}
                // Implicit folders have no marker to delete.
                Err(StoreError::NotFound(_)) if entry.is_folder() => {}
                Err(e) => {
                    log::warn!("Removing {} failed: {}", entry.key, e);
                    return Err(e.into());
                }
            }
        }
        Ok(files)
    }
}
