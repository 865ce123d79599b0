//! ConfigObj-style configuration for the vault.
//!
//! Sections `[cipher]`, `[storage]` and `[logging]`; `key = value` pairs,
//! `#` comments, booleans `Yes`/`No`/`True`/`False`/`1`/`0`/`on`/`off`.
//! Values from the file are overridden by the environment
//! (`AES_ENCRYPTION_KEY`, `VAULT_ROOT`), which is overridden by CLI flags.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use vault_crypto::key::KeyInput;
use vault_crypto::pipeline::DEFAULT_PARALLEL_THRESHOLD;

use crate::label::{LabelRules, DEFAULT_MASKED_SUFFIX, DEFAULT_MASK_EXTENSION};

pub const KEY_ENV: &str = "AES_ENCRYPTION_KEY";
pub const ROOT_ENV: &str = "VAULT_ROOT";
pub const DEFAULT_ROOT: &str = "./vault";

/// Parsed vault configuration.
#[derive(Debug, Clone, Default)]
pub struct VaultConfig {
    pub cipher: CipherSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

/// The `[cipher]` section.
#[derive(Clone)]
pub struct CipherSection {
    /// 16-character text key or 32 hex characters. Validated when set.
    pub key: Option<String>,
    pub parallel_threshold: usize,
}

impl Default for CipherSection {
    fn default() -> Self {
        CipherSection {
            key: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

// Keeps key material out of debug output.
impl fmt::Debug for CipherSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherSection")
            .field("key", &self.key.as_ref().map(|_| "<set>"))
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

/// The `[storage]` section.
#[derive(Debug, Clone)]
pub struct StorageSection {
    pub root: Option<PathBuf>,
    pub mask_extension: String,
    pub masked_suffix: String,
    pub create_root: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        StorageSection {
            root: None,
            mask_extension: DEFAULT_MASK_EXTENSION.into(),
            masked_suffix: DEFAULT_MASKED_SUFFIX.into(),
            create_root: true,
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone)]
pub struct LoggingSection {
    pub loglevel: u8,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection { loglevel: 4 }
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    InvalidValue { key: String, value: String },
    MissingKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for '{}': '{}'", key, value)
            }
            ConfigError::MissingKey => write!(
                f,
                "No encryption key configured (set [cipher] key, {} or --key)",
                KEY_ENV
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

/// Values given on the command line. Highest priority.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub key: Option<String>,
    pub root: Option<PathBuf>,
}

/// Parse a config string.
pub fn parse(input: &str) -> Result<VaultConfig, ConfigError> {
    let mut current_section: Option<String> = None;
    let mut cipher_kvs: HashMap<String, String> = HashMap::new();
    let mut storage_kvs: HashMap<String, String> = HashMap::new();
    let mut logging_kvs: HashMap<String, String> = HashMap::new();

    for (lineno, line) in input.lines().enumerate() {
        let line = strip_comment(line);
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('[') {
            if !trimmed.ends_with(']') {
                return Err(ConfigError::Parse(format!(
                    "line {}: unterminated section header",
                    lineno + 1
                )));
            }
            let name = trimmed.trim_matches(|c: char| c == '[' || c == ']').trim();
            current_section = Some(name.to_lowercase());
            continue;
        }

        let eq_pos = trimmed.find('=').ok_or_else(|| {
            ConfigError::Parse(format!("line {}: expected 'key = value'", lineno + 1))
        })?;
        let key = trimmed[..eq_pos].trim().to_string();
        let value = unquote(trimmed[eq_pos + 1..].trim()).to_string();

        match current_section.as_deref() {
            Some("cipher") => {
                cipher_kvs.insert(key, value);
            }
            Some("storage") => {
                storage_kvs.insert(key, value);
            }
            Some("logging") => {
                logging_kvs.insert(key, value);
            }
            _ => {} // ignore unknown sections
        }
    }

    Ok(VaultConfig {
        cipher: build_cipher_section(&cipher_kvs)?,
        storage: build_storage_section(&storage_kvs)?,
        logging: build_logging_section(&logging_kvs)?,
    })
}

/// Parse a config file from disk.
pub fn parse_file(path: &Path) -> Result<VaultConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Load the effective configuration: file (if any), then environment, then
/// command-line overrides.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<VaultConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let config = parse_file(p)?;
            log::debug!("Loaded config from {}", p.display());
            config
        }
        None => VaultConfig::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.apply_overrides(overrides)?;
    Ok(config)
}

impl VaultConfig {
    /// Apply environment values, looked up through `lookup`. Empty values
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(KEY_ENV).filter(|v| !v.is_empty()) {
            self.cipher.key = Some(checked_key(KEY_ENV, key)?);
        }
        if let Some(root) = lookup(ROOT_ENV).filter(|v| !v.is_empty()) {
            self.storage.root = Some(PathBuf::from(root));
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(ref key) = overrides.key {
            self.cipher.key = Some(checked_key("--key", key.clone())?);
        }
        if let Some(ref root) = overrides.root {
            self.storage.root = Some(root.clone());
        }
        Ok(())
    }

    /// The configured cipher key.
    pub fn key(&self) -> Result<&str, ConfigError> {
        self.cipher.key.as_deref().ok_or(ConfigError::MissingKey)
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
    }

    pub fn label_rules(&self) -> LabelRules {
        LabelRules {
            mask_extension: self.storage.mask_extension.clone(),
            masked_suffix: self.storage.masked_suffix.clone(),
        }
    }

    /// Map the numeric `loglevel` (0-7) onto a log filter.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.logging.loglevel {
            0 | 1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 | 4 => log::LevelFilter::Info,
            5 | 6 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Validate a key through the key codec. The key itself is never echoed
/// back in the error.
fn checked_key(source: &str, key: String) -> Result<String, ConfigError> {
    match KeyInput::Text(&key).normalize() {
        Ok(_) => Ok(key),
        Err(e) => Err(ConfigError::InvalidValue {
            key: source.into(),
            value: e.to_string(),
        }),
    }
}

/// Strip `#` comments from a line (not inside quotes).
fn strip_comment(line: &str) -> &str {
    let mut in_quote = false;
    let mut quote_char = '"';
    for (i, ch) in line.char_indices() {
        if !in_quote && (ch == '"' || ch == '\'') {
            in_quote = true;
            quote_char = ch;
        } else if in_quote && ch == quote_char {
            in_quote = false;
        } else if !in_quote && ch == '#' {
            return &line[..i];
        }
    }
    line
}

/// Remove one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse a string as a boolean (ConfigObj style).
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn build_cipher_section(kvs: &HashMap<String, String>) -> Result<CipherSection, ConfigError> {
    let mut section = CipherSection::default();

    if let Some(v) = kvs.get("key").filter(|v| !v.is_empty()) {
        section.key = Some(checked_key("key", v.clone())?);
    }
    if let Some(v) = kvs.get("parallel_threshold") {
        section.parallel_threshold = v.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
            key: "parallel_threshold".into(),
            value: v.clone(),
        })?;
    }

    Ok(section)
}

fn build_storage_section(kvs: &HashMap<String, String>) -> Result<StorageSection, ConfigError> {
    let mut section = StorageSection::default();

    if let Some(v) = kvs.get("root").filter(|v| !v.is_empty()) {
        section.root = Some(PathBuf::from(v));
    }
    for (name, slot) in [
        ("mask_extension", &mut section.mask_extension),
        ("masked_suffix", &mut section.masked_suffix),
    ] {
        if let Some(v) = kvs.get(name) {
            if !v.starts_with('.') || v.len() < 2 || v.contains('/') {
                return Err(ConfigError::InvalidValue {
                    key: name.into(),
                    value: v.clone(),
                });
            }
            *slot = v.clone();
        }
    }
    if let Some(v) = kvs.get("create_root") {
        section.create_root = parse_bool(v).ok_or_else(|| ConfigError::InvalidValue {
            key: "create_root".into(),
            value: v.clone(),
        })?;
    }

    Ok(section)
}

fn build_logging_section(kvs: &HashMap<String, String>) -> Result<LoggingSection, ConfigError> {
    let mut section = LoggingSection::default();

    if let Some(v) = kvs.get("loglevel") {
        section.loglevel = v
            .parse::<u8>()
            .ok()
            .filter(|l| *l <= 7)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "loglevel".into(),
                value: v.clone(),
            })?;
    }

    Ok(section)
}
