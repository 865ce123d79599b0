//! Pipeline outcome reports, rendered as JSON for callers.

use std::fmt;

use serde_json::{json, Value};
use vault_crypto::{CipherResult, PlainResult, ALGORITHM_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

/// Summary of one encryption or decryption. Never holds payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub status: Status,
    pub message: String,
    pub original_size: Option<usize>,
    pub encrypted_size: Option<usize>,
    pub algorithm: &'static str,
    /// Stored object name, when the payload went through the store.
    pub name: Option<String>,
}

impl PipelineResult {
    pub fn encrypted(result: &CipherResult, name: Option<&str>) -> Self {
        PipelineResult {
            status: Status::Success,
            message: "File encrypted successfully".into(),
            original_size: Some(result.original_size),
            encrypted_size: Some(result.encrypted_size),
            algorithm: result.algorithm,
            name: name.map(String::from),
        }
    }

    pub fn decrypted(result: &PlainResult, name: Option<&str>) -> Self {
        PipelineResult {
            status: Status::Success,
            message: "File decrypted successfully".into(),
            original_size: Some(result.original_size),
            encrypted_size: Some(result.encrypted_size),
            algorithm: result.algorithm,
            name: name.map(String::from),
        }
    }

    pub fn failure(err: &dyn fmt::Display, name: Option<&str>) -> Self {
        PipelineResult {
            status: Status::Error,
            message: err.to_string(),
            original_size: None,
            encrypted_size: None,
            algorithm: ALGORITHM_TAG,
            name: name.map(String::from),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "status": self.status.as_str(),
            "message": self.message,
            "original_size": self.original_size,
            "encrypted_size": self.encrypted_size,
            "algorithm": self.algorithm,
        });
        if let Some(ref name) = self.name {
            obj["name"] = json!(name);
        }
        obj
    }
}

impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref name) = self.name {
            write!(f, ": {}", name)?;
        }
        if let (Some(orig), Some(enc)) = (self.original_size, self.encrypted_size) {
            write!(f, " ({} bytes plain, {} bytes encrypted, {})", orig, enc, self.algorithm)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_crypto::key::KeyInput;
    use vault_crypto::pipeline;

    const KEY: KeyInput<'static> = KeyInput::Text("abcdefghijklmnop");

    #[test]
    fn success_report_json() {
        let ct = pipeline::encrypt(b"HELLO", KEY).unwrap();
        let report = PipelineResult::encrypted(&ct, Some("hello.pdf"));
        assert!(report.is_success());

        let v = report.to_json();
        assert_eq!(v["status"], "success");
        assert_eq!(v["original_size"], 5);
        assert_eq!(v["encrypted_size"], 16);
        assert_eq!(v["algorithm"], "AES-128-Binary-Custom");
        assert_eq!(v["name"], "hello.pdf");
        assert!(v.get("ciphertext").is_none());
    }

    #[test]
    fn decrypted_report() {
        let ct = pipeline::encrypt(b"HELLO", KEY).unwrap();
        let plain = pipeline::decrypt(&ct.ciphertext, KEY).unwrap();
        let report = PipelineResult::decrypted(&plain, None);
        let v = report.to_json();
        assert_eq!(v["message"], "File decrypted successfully");
        assert_eq!(v["original_size"], 5);
        assert!(v.get("name").is_none());
    }

    #[test]
    fn failure_report_has_no_sizes() {
        let err = pipeline::decrypt(&[0u8; 15], KEY).unwrap_err();
        let report = PipelineResult::failure(&err, Some("broken.pdf"));
        assert!(!report.is_success());

        let v = report.to_json();
        assert_eq!(v["status"], "error");
        assert!(v["original_size"].is_null());
        assert!(v["encrypted_size"].is_null());
        assert!(v["message"].as_str().unwrap().contains("Decryption failed"));
    }

    #[test]
    fn display_line() {
        let ct = pipeline::encrypt(b"HELLO", KEY).unwrap();
        let line = PipelineResult::encrypted(&ct, Some("a.pdf")).to_string();
        assert_eq!(
            line,
            "File encrypted successfully: a.pdf (5 bytes plain, 16 bytes encrypted, AES-128-Binary-Custom)"
        );
    }
}
