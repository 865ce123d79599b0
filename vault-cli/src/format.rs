//! Output formatting for vaultctl.

use serde_json::{json, Value};
use vault_crypto::pipeline::{CipherInfo, SizeEstimate};
use vault_store::{FolderListing, LabelRules};

/// Format a byte count as a human-readable string (decimal units).
pub fn size_str(num: u64) -> String {
    if num < 1000 {
        return format!("{} B", num);
    }
    let units = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut val = num as f64;
    let mut unit_idx = 0;
    while val >= 1000.0 && unit_idx < units.len() - 1 {
        val /= 1000.0;
        unit_idx += 1;
    }
    format!("{:.2} {}", val, units[unit_idx])
}

pub fn info_json(info: &CipherInfo) -> Value {
    json!({
        "algorithm": info.algorithm,
        "implementation": info.implementation,
        "key_size": info.key_size_bits,
        "block_size": info.block_size_bits,
        "mode": info.mode,
        "padding": info.padding,
        "key_formats": info.key_formats,
        "input_format": info.input_format,
        "output_format": info.output_format,
    })
}

/// Result of `inspect` on one file.
pub fn inspect_json(path: &str, len: usize, estimate: Option<&SizeEstimate>) -> Value {
    let mut obj = json!({
        "file": path,
        "size": len,
        "valid": estimate.is_some(),
    });
    if let Some(est) = estimate {
        obj["blocks"] = json!(est.blocks);
        obj["plaintext_min"] = json!(est.min_plain);
        obj["plaintext_max"] = json!(est.max_plain);
    }
    obj
}

pub fn inspect_text(path: &str, len: usize, estimate: Option<&SizeEstimate>) -> String {
    match estimate {
        Some(est) => format!(
            "{}: {} in {} blocks, decrypts to {}-{} bytes",
            path,
            size_str(len as u64),
            est.blocks,
            est.min_plain,
            est.max_plain
        ),
        None => format!(
            "{}: {} is not a valid ciphertext (must be a non-empty multiple of 16 bytes)",
            path,
            size_str(len as u64)
        ),
    }
}

/// Folders first, then files with sizes, using display names.
pub fn listing_lines(listing: &FolderListing, labels: &LabelRules) -> Vec<String> {
    let mut lines = Vec::with_capacity(listing.folders.len() + listing.files.len());
    for folder in &listing.folders {
        lines.push(format!("{:>10}  {}", "-", folder));
    }
    for file in &listing.files {
        lines.push(format!(
            "{:>10}  {}",
            size_str(file.size),
            labels.display_name(&file.key)
        ));
    }
    lines
}

pub fn listing_json(listing: &FolderListing, labels: &LabelRules) -> Value {
    let files: Vec<Value> = listing
        .files
        .iter()
        .map(|f| {
            json!({
                "key": f.key,
                "name": labels.display_name(&f.key),
                "size": f.size,
            })
        })
        .collect();
    json!({
        "folders": listing.folders,
        "files": files,
    })
}
