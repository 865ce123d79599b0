//! Object storage behind the vault.
//!
//! Keys are `/`-separated relative paths. A key ending in `/` is a folder
//! marker: it holds no data and only records that the folder exists.
//! `MemoryStore` keeps everything in a map, `FsStore` maps each key to a
//! file (or directory, for markers) under a root directory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// A stored object as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

impl ObjectEntry {
    pub fn is_folder(&self) -> bool {
        self.key.ends_with('/')
    }
}

#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    InvalidKey(String),
    AlreadyExists(String),
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(key) => write!(f, "Object not found: {}", key),
            StoreError::InvalidKey(key) => write!(f, "Invalid object key: '{}'", key),
            StoreError::AlreadyExists(key) => write!(f, "Object already exists: {}", key),
            StoreError::Io(e) => write!(f, "Storage I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Byte storage collaborator. Values are opaque; the vault only ever stores
/// ciphertext here.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// All entries whose key starts with `prefix`, sorted by key.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Reject keys that could escape the store root or that no backend can
/// represent: empty, absolute, backslashes, empty segments, `.` and `..`.
/// Segments shaped like an in-flight write (`.name.tmp`) are reserved.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidKey(key.to_string());
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(invalid());
    }
    let body = key.strip_suffix('/').unwrap_or(key);
    for segment in body.split('/') {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || is_partial_write(segment)
        {
            return Err(invalid());
        }
    }
    Ok(())
}

// --- MemoryStore ---

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(io::Error::other("store lock poisoned"))
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let value = if key.ends_with('/') { Vec::new() } else { data.to_vec() };
        self.objects
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        validate_key(key)?;
        self.objects
            .read()
            .map_err(|_| poisoned())?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.objects
            .write()
            .map_err(|_| poisoned())?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| ObjectEntry {
                key: k.clone(),
                size: v.len() as u64,
            })
            .collect())
    }
}

// --- FsStore ---

/// Filesystem-backed store. Every directory under the root is reported as a
/// folder marker, including ones created implicitly as parents of a file.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`. With `create`, a missing root is created;
    /// otherwise it must already exist.
    pub fn open(root: &Path, create: bool) -> Result<Self, StoreError> {
        if !root.is_dir() {
            if !create {
                return Err(StoreError::NotFound(root.display().to_string()));
            }
            fs::create_dir_all(root)?;
            log::debug!("Created storage root {}", root.display());
        }
        Ok(FsStore {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        let body = key.strip_suffix('/').unwrap_or(key);
        Ok(body.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }

    fn walk(&self, dir: &Path, rel: &str, out: &mut Vec<ObjectEntry>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(n) => n,
                // Not representable as a key; skip.
                Err(_) => continue,
            };
            if is_partial_write(&name) {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let key = format!("{}{}/", rel, name);
                self.walk(&entry.path(), &key, out)?;
                out.push(ObjectEntry { key, size: 0 });
            } else if file_type.is_file() {
                out.push(ObjectEntry {
                    key: format!("{}{}", rel, name),
                    size: entry.metadata()?.len(),
                });
            }
        }
        Ok(())
    }
}

/// Per-process counter making every temp file name unique.
static WRITE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn is_partial_write(name: &str) -> bool {
    name.len() > ".tmp".len() && name.starts_with('.') && name.ends_with(".tmp")
}

/// `.name.<pid>.<n>.tmp` next to `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("object");
    path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        name,
        std::process::id(),
        WRITE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

fn not_found_as(key: &str) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(key.to_string())
        } else {
            StoreError::Io(e)
        }
    }
}

impl ObjectStore for FsStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if key.ends_with('/') {
            if path.is_file() {
                return Err(StoreError::AlreadyExists(key.to_string()));
            }
            fs::create_dir_all(&path)?;
            return Ok(());
        }
        if path.is_dir() {
            return Err(StoreError::AlreadyExists(format!("{}/", key)));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Each write gets its own temp file, renamed over the target.
        let tmp = temp_path(&path);
        if let Err(e) = fs::write(&tmp, data).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        if key.ends_with('/') {
            return if path.is_dir() {
                Ok(Vec::new())
            } else {
                Err(StoreError::NotFound(key.to_string()))
            };
        }
        if path.is_dir() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        fs::read(&path).map_err(not_found_as(key))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if key.ends_with('/') {
            // Only empty folders; callers delete contents first.
            fs::remove_dir(&path).map_err(not_found_as(key))
        } else {
            if path.is_dir() {
                return Err(StoreError::NotFound(key.to_string()));
            }
            fs::remove_file(&path).map_err(not_found_as(key))
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let mut entries = Vec::new();
        self.walk(&self.root, "", &mut entries)?;
        entries.retain(|e| e.key.starts_with(prefix));
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        Ok(if key.ends_with('/') {
            path.is_dir()
        } else {
            path.is_file()
        })
    }
}
