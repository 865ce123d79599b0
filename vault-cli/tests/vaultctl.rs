//! Integration tests for the vaultctl binary.
//!
//! Each test runs the real binary against files in a fresh temp directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

use vault_crypto::key::KeyInput;
use vault_crypto::pipeline;

const KEY: &str = "abcdefghijklmnop";

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("vaultctl-test-{}-{}", std::process::id(), id));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn vaultctl(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vaultctl"))
        .args(args)
        .current_dir(dir)
        .env_remove("AES_ENCRYPTION_KEY")
        .env_remove("VAULT_ROOT")
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn version_and_help() {
    let dir = temp_dir();
    let out = vaultctl(&dir, &["--version"]);
    assert!(out.status.success());
    assert!(stdout(&out).starts_with("vaultctl "));

    let out = vaultctl(&dir, &["--help"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Usage: vaultctl"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn encrypt_decrypt_files() {
    let dir = temp_dir();
    fs::write(dir.join("data.bin"), b"HELLO").unwrap();

    let out = vaultctl(&dir, &["--key", KEY, "encrypt", "data.bin"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let ct = fs::read(dir.join("data.bin.enc")).unwrap();
    let expected = pipeline::encrypt(b"HELLO", KeyInput::Text(KEY)).unwrap();
    assert_eq!(ct, expected.ciphertext);

    fs::remove_file(dir.join("data.bin")).unwrap();
    let out = vaultctl(&dir, &["--key", KEY, "decrypt", "data.bin.enc"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read(dir.join("data.bin")).unwrap(), b"HELLO");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn decrypt_to_stdout_with_json_report() {
    let dir = temp_dir();
    let ct = pipeline::encrypt(b"payload", KeyInput::Text(KEY)).unwrap();
    fs::write(dir.join("p.enc"), &ct.ciphertext).unwrap();

    let out = vaultctl(&dir, &["--key", KEY, "decrypt", "p.enc", "-o", "out.bin", "--json"]);
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["status"], "success");
    assert_eq!(report["original_size"], 7);
    assert_eq!(report["algorithm"], "AES-128-Binary-Custom");

    let out = vaultctl(&dir, &["--key", KEY, "decrypt", "p.enc", "-o", "-"]);
    assert!(out.status.success());
    assert_eq!(out.stdout, b"payload");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_ciphertext_exits_nonzero() {
    let dir = temp_dir();
    let ct = pipeline::encrypt(b"HELLO", KeyInput::Text(KEY)).unwrap();
    let mut corrupted = ct.ciphertext.clone();
    corrupted.pop();
    fs::write(dir.join("bad.enc"), &corrupted).unwrap();

    let out = vaultctl(&dir, &["--key", KEY, "decrypt", "bad.enc", "--json"]);
    assert_eq!(out.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["status"], "error");
    assert!(report["original_size"].is_null());
    assert!(!dir.join("bad").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_or_invalid_key() {
    let dir = temp_dir();
    fs::write(dir.join("f.bin"), b"x").unwrap();

    let out = vaultctl(&dir, &["encrypt", "f.bin"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("No encryption key configured"));

    let out = vaultctl(&dir, &["--key", "short", "encrypt", "f.bin"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!stderr(&out).contains("short'"));
    assert!(!dir.join("f.bin.enc").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn key_from_environment_and_config() {
    let dir = temp_dir();
    fs::write(dir.join("f.bin"), b"env").unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_vaultctl"))
        .args(["encrypt", "f.bin", "-o", "f.enc"])
        .current_dir(&dir)
        .env("AES_ENCRYPTION_KEY", "00112233445566778899aabbccddeeff")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    let plain = pipeline::decrypt(
        &fs::read(dir.join("f.enc")).unwrap(),
        KeyInput::Text("00112233445566778899aabbccddeeff"),
    )
    .unwrap();
    assert_eq!(plain.plaintext, b"env");

    fs::write(dir.join("vault.conf"), format!("[cipher]\nkey = {}\n", KEY)).unwrap();
    let out = vaultctl(&dir, &["-c", "vault.conf", "encrypt", "f.bin", "-o", "g.enc"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let plain = pipeline::decrypt(&fs::read(dir.join("g.enc")).unwrap(), KeyInput::Text(KEY));
    assert_eq!(plain.unwrap().plaintext, b"env");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn genkey_formats() {
    let dir = temp_dir();
    let out = vaultctl(&dir, &["genkey"]);
    assert!(out.status.success());
    let key = stdout(&out).trim().to_string();
    assert_eq!(key.len(), 16);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));

    let out = vaultctl(&dir, &["genkey", "--hex"]);
    let key = stdout(&out).trim().to_string();
    assert_eq!(key.len(), 32);
    assert!(KeyInput::Text(&key).normalize().is_ok());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn info_and_inspect() {
    let dir = temp_dir();
    let out = vaultctl(&dir, &["info"]);
    assert!(out.status.success());
    let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(info["mode"], "ECB");
    assert_eq!(info["padding"], "PKCS#7");

    fs::write(dir.join("ok.pdf"), [0u8; 32]).unwrap();
    fs::write(dir.join("bad.pdf"), [0u8; 33]).unwrap();
    let out = vaultctl(&dir, &["inspect", "ok.pdf", "--json"]);
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["valid"], true);
    assert_eq!(v["blocks"], 2);

    let out = vaultctl(&dir, &["inspect", "bad.pdf"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("not a valid ciphertext"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn store_commands() {
    let dir = temp_dir();
    let root = dir.join("store");
    let root_s = root.to_str().unwrap();
    fs::write(dir.join("report.bin"), b"quarterly numbers").unwrap();

    let run = |args: &[&str]| {
        let mut full = vec!["--key", KEY, "--root", root_s];
        full.extend_from_slice(args);
        vaultctl(&dir, &full)
    };

    assert!(run(&["mkdir", "docs"]).status.success());
    let out = run(&["put", "report.bin", "--as", "docs/report.bin"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(root.join("docs").join("report.pdf").is_file());

    let out = run(&["ls", "--json"]);
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["folders"][0], "docs/");

    let out = run(&["ls", "docs"]);
    assert!(stdout(&out).contains("docs/report.bin"));

    assert!(run(&["mv", "docs/report.bin", "final.bin"]).status.success());
    let out = run(&["get", "final.bin", "-o", "back.bin"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read(dir.join("back.bin")).unwrap(), b"quarterly numbers");

    assert_eq!(run(&["mv", "ghost.bin", "ghost.pdf"]).status.code(), Some(1));

    assert!(run(&["put", "report.bin", "--as", "docs/copy.bin"]).status.success());
    let out = run(&["mv", "docs/", "old/"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("old/"));
    assert!(root.join("old").join("copy.pdf").is_file());
    assert!(!root.join("docs").exists());
    assert!(run(&["mkdir", "docs"]).status.success());

    assert!(run(&["rm", "final.bin"]).status.success());
    assert_eq!(run(&["rm", "final.bin"]).status.code(), Some(1));
    assert!(run(&["rm", "docs/"]).status.success());
    assert!(!root.join("docs").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_command() {
    let dir = temp_dir();
    let out = vaultctl(&dir, &["frobnicate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Unknown command"));
    let _ = fs::remove_dir_all(&dir);
}
