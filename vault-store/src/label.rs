//! Transport labeling: binary uploads (`.bin`) are stored and served under a
//! masking extension (`.pdf`). Only object names change; payloads are never
//! touched here.

pub const DEFAULT_MASK_EXTENSION: &str = ".pdf";
pub const DEFAULT_MASKED_SUFFIX: &str = ".bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRules {
    /// Extension objects are stored under.
    pub mask_extension: String,
    /// Suffix of names that get masked.
    pub masked_suffix: String,
}

impl Default for LabelRules {
    fn default() -> Self {
        LabelRules {
            mask_extension: DEFAULT_MASK_EXTENSION.into(),
            masked_suffix: DEFAULT_MASKED_SUFFIX.into(),
        }
    }
}

/// `name` without a case-insensitive `suffix`, if it has one and something
/// remains before it.
fn strip_suffix_ci<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() || name.len() <= suffix.len() {
        return None;
    }
    let split = name.len() - suffix.len();
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = name.split_at(split);
    if tail.eq_ignore_ascii_case(suffix) && !stem.ends_with('/') {
        Some(stem)
    } else {
        None
    }
}

impl LabelRules {
    /// Name an object is stored under. `report.BIN` -> `report.pdf`; names
    /// without the masked suffix are kept as they are.
    pub fn storage_name(&self, name: &str) -> String {
        match strip_suffix_ci(name, &self.masked_suffix) {
            Some(stem) => format!("{}{}", stem, self.mask_extension),
            None => name.to_string(),
        }
    }

    /// Name shown to users for a stored object.
    pub fn display_name(&self, stored: &str) -> String {
        match strip_suffix_ci(stored, &self.mask_extension) {
            Some(stem) => format!("{}{}", stem, self.masked_suffix),
            None => stored.to_string(),
        }
    }
}
