//! Folder views over flat object keys.
//!
//! A folder exists if it has a marker (`name/`) or if any key lives below it.

use crate::store::{validate_key, ObjectEntry, StoreError};

/// Direct children of one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    /// Full keys of sub-folders, each ending in `/`.
    pub folders: Vec<String>,
    pub files: Vec<ObjectEntry>,
}

/// Turn a user-supplied folder path into its marker key: `docs`, `/docs/`
/// and `docs/` all become `docs/`. The empty path is the root and maps to "".
pub fn folder_key(path: &str) -> Result<String, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let key = format!("{}/", trimmed);
    validate_key(&key).map_err(|_| StoreError::InvalidKey(path.to_string()))?;
    Ok(key)
}

/// Split `entries` (all under `prefix`) into direct files and sub-folders.
/// Deeper keys only contribute the sub-folder they live in.
pub fn direct_children(entries: &[ObjectEntry], prefix: &str) -> FolderListing {
    let mut listing = FolderListing::default();
    for entry in entries {
        let rest = match entry.key.strip_prefix(prefix) {
            Some(rest) if !rest.is_empty() => rest,
            _ => continue,
        };
        match rest.find('/') {
            None => listing.files.push(entry.clone()),
            Some(i) => {
                let folder = format!("{}{}", prefix, &rest[..=i]);
                if !listing.folders.contains(&folder) {
                    listing.folders.push(folder);
                }
            }
        }
    }
    listing.folders.sort();
    listing.files.sort_by(|a, b| a.key.cmp(&b.key));
    listing
}

/// Order in which to delete everything under a folder: files first, then
/// markers deepest first, so each folder is empty when its marker goes.
pub fn removal_order(mut entries: Vec<ObjectEntry>) -> Vec<ObjectEntry> {
    entries.sort_by(|a, b| {
        a.is_folder()
            .cmp(&b.is_folder())
            .then_with(|| depth(&b.key).cmp(&depth(&a.key)))
            .then_with(|| a.key.cmp(&b.key))
    });
    entries
}

fn depth(key: &str) -> usize {
    key.matches('/').count()
}
