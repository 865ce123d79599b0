//! vaultctl - encrypted file vault tool
//!
//! Encrypts and decrypts files with the vault cipher, and manages objects in
//! a filesystem-backed vault.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use vault_cli::args::Args;
use vault_cli::format;
use vault_crypto::key::{self, KeyInput};
use vault_crypto::pipeline::{self, CipherInfo};
use vault_crypto::{FileDecryptionPipeline, FileEncryptionPipeline, OsRng};
use vault_store::config::{self, Overrides, VaultConfig};
use vault_store::{FileVault, FsStore, PipelineResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args = Args::parse();

    if args.has("version") {
        println!("vaultctl {}", VERSION);
        return;
    }

    if args.has("help") || args.command().is_none() {
        print_usage();
        return;
    }

    let overrides = Overrides {
        key: args.get("key").map(String::from),
        root: args.get("root").map(PathBuf::from),
    };
    let loaded = config::load(args.config_path().map(Path::new), &overrides);

    // -v/-q win over the config file's loglevel.
    let log_level = args.log_level().unwrap_or_else(|| match &loaded {
        Ok(cfg) => cfg.log_level(),
        Err(_) => log::LevelFilter::Info,
    });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();

    let cfg = loaded.unwrap_or_else(|e| exit_with(e));
    let json = args.has("json");
    let command = args.command().unwrap_or_default();
    log::debug!("Running {} with {:?}", command, cfg);

    match command {
        "encrypt" => encrypt_file(&args, &cfg, json),
        "decrypt" => decrypt_file(&args, &cfg, json),
        "genkey" => generate_key(&args),
        "info" => print_json(&format::info_json(&CipherInfo::describe())),
        "inspect" => inspect(&args, json),
        "put" => put(&args, &cfg, json),
        "get" => get(&args, &cfg, json),
        "ls" => list(&args, &cfg, json),
        "mkdir" => mkdir(&args, &cfg),
        "rm" => remove(&args, &cfg),
        "mv" => rename(&args, &cfg),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            process::exit(1);
        }
    }
}

fn exit_with(msg: impl fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

fn operand<'a>(args: &'a Args, index: usize, what: &str) -> &'a str {
    match args.operands().get(index) {
        Some(s) => s.as_str(),
        None => exit_with(format!("missing {} (see --help)", what)),
    }
}

fn read_input(path: &str) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| exit_with(format!("reading {}: {}", path, e)))
}

/// Write to `path`, or to stdout for `-`.
fn write_output(path: &str, data: &[u8]) {
    let result = if path == "-" {
        io::stdout().lock().write_all(data)
    } else {
        fs::write(path, data)
    };
    result.unwrap_or_else(|e| exit_with(format!("writing {}: {}", path, e)));
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => exit_with(e),
    }
}

fn report(result: &PipelineResult, json: bool, to_stdout: bool) {
    if json {
        print_json(&result.to_json());
    } else if to_stdout {
        // stdout carries the payload; keep the summary off it.
        eprintln!("{}", result);
    } else {
        println!("{}", result);
    }
}

fn fail(err: impl fmt::Display, name: Option<&str>, json: bool) -> ! {
    if json {
        print_json(&PipelineResult::failure(&err, name).to_json());
        process::exit(1);
    }
    exit_with(err)
}

fn cipher_key(cfg: &VaultConfig) -> KeyInput<'_> {
    KeyInput::Text(cfg.key().unwrap_or_else(|e| exit_with(e)))
}

fn open_vault(cfg: &VaultConfig) -> FileVault<FsStore> {
    FileVault::open(cfg).unwrap_or_else(|e| exit_with(e))
}

fn encrypt_file(args: &Args, cfg: &VaultConfig, json: bool) {
    let input = operand(args, 0, "input file");
    let output = args
        .output()
        .map(String::from)
        .unwrap_or_else(|| format!("{}.enc", input));
    let data = read_input(input);

    let enc = FileEncryptionPipeline::new(cipher_key(cfg))
        .unwrap_or_else(|e| fail(e, Some(input), json))
        .with_parallel_threshold(cfg.cipher.parallel_threshold);
    let result = enc.encrypt(&data).unwrap_or_else(|e| fail(e, Some(input), json));
    write_output(&output, &result.ciphertext);
    log::info!("Encrypted {} -> {}", input, output);
    report(&PipelineResult::encrypted(&result, Some(&output)), json, output == "-");
}

fn decrypt_file(args: &Args, cfg: &VaultConfig, json: bool) {
    let input = operand(args, 0, "input file");
    let output = args.output().map(String::from).unwrap_or_else(|| {
        input
            .strip_suffix(".enc")
            .map(String::from)
            .unwrap_or_else(|| format!("{}.dec", input))
    });
    let data = read_input(input);

    let dec = FileDecryptionPipeline::new(cipher_key(cfg))
        .unwrap_or_else(|e| fail(e, Some(input), json))
        .with_parallel_threshold(cfg.cipher.parallel_threshold);
    let result = dec.decrypt(&data).unwrap_or_else(|e| fail(e, Some(input), json));
    write_output(&output, &result.plaintext);
    log::info!("Decrypted {} -> {}", input, output);
    report(&PipelineResult::decrypted(&result, Some(&output)), json, output == "-");
}

fn generate_key(args: &Args) {
    let key = if args.has("hex") {
        key::generate_hex_key(&mut OsRng)
    } else {
        key::generate_text_key(&mut OsRng)
    };
    println!("{}", key);
}

fn inspect(args: &Args, json: bool) {
    let input = operand(args, 0, "file");
    let data = read_input(input);
    let estimate = if pipeline::validate_ciphertext(&data) {
        pipeline::estimate_plaintext_size(data.len())
    } else {
        None
    };
    if json {
        print_json(&format::inspect_json(input, data.len(), estimate.as_ref()));
    } else {
        println!("{}", format::inspect_text(input, data.len(), estimate.as_ref()));
    }
    if estimate.is_none() {
        process::exit(1);
    }
}

fn put(args: &Args, cfg: &VaultConfig, json: bool) {
    let input = operand(args, 0, "file");
    let name = match args.get("as") {
        Some(n) => n.to_string(),
        None => Path::new(input)
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .unwrap_or_else(|| exit_with(format!("cannot derive a name from {}", input))),
    };
    let data = read_input(input);
    let vault = open_vault(cfg);
    let result = vault
        .upload(&name, &data)
        .unwrap_or_else(|e| fail(e, Some(&name), json));
    report(&result, json, false);
}

fn get(args: &Args, cfg: &VaultConfig, json: bool) {
    let name = operand(args, 0, "object name");
    let vault = open_vault(cfg);
    let output = args.output().map(String::from).unwrap_or_else(|| {
        let shown = vault.labels().display_name(name);
        shown.rsplit('/').next().unwrap_or(&shown).to_string()
    });
    let (data, result) = vault
        .download(name)
        .unwrap_or_else(|e| fail(e, Some(name), json));
    write_output(&output, &data);
    report(&result, json, output == "-");
}

fn list(args: &Args, cfg: &VaultConfig, json: bool) {
    let folder = args.operands().first().map(|s| s.as_str()).unwrap_or("");
    let vault = open_vault(cfg);
    let listing = vault.list_folder(folder).unwrap_or_else(|e| exit_with(e));
    if json {
        print_json(&format::listing_json(&listing, vault.labels()));
    } else {
        for line in format::listing_lines(&listing, vault.labels()) {
            println!("{}", line);
        }
    }
}

fn mkdir(args: &Args, cfg: &VaultConfig) {
    let path = operand(args, 0, "folder");
    let key = open_vault(cfg)
        .create_folder(path)
        .unwrap_or_else(|e| exit_with(e));
    println!("Created {}", key);
}

/// `rm name` removes one object; `rm folder/` removes the folder and
/// everything in it.
fn remove(args: &Args, cfg: &VaultConfig) {
    let name = operand(args, 0, "object name");
    let vault = open_vault(cfg);
    if name.ends_with('/') {
        let count = vault.remove_folder(name).unwrap_or_else(|e| exit_with(e));
        println!("Removed {} ({} files)", name, count);
    } else {
        vault.remove(name).unwrap_or_else(|e| exit_with(e));
        println!("Removed {}", name);
    }
}

/// `mv a b` renames one object; `mv a/ b/` moves a whole folder.
fn rename(args: &Args, cfg: &VaultConfig) {
    let from = operand(args, 0, "source name");
    let to = operand(args, 1, "destination name");
    let vault = open_vault(cfg);
    let key = if from.ends_with('/') {
        vault.rename_folder(from, to)
    } else {
        vault.rename(from, to)
    }
    .unwrap_or_else(|e| exit_with(e));
    println!("Moved {} -> {}", from, key);
}

fn print_usage() {
    println!("Usage: vaultctl [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("Commands:");
    println!("  encrypt <in> [-o out]   Encrypt a file (default output: <in>.enc)");
    println!("  decrypt <in> [-o out]   Decrypt a file (-o - writes to stdout)");
    println!("  genkey [--hex]          Generate a new 16-character (or hex) key");
    println!("  info                    Describe the cipher");
    println!("  inspect <file>          Check a ciphertext and estimate its plaintext size");
    println!("  put <file> [--as name]  Encrypt a file into the vault");
    println!("  get <name> [-o out]     Decrypt a file out of the vault");
    println!("  ls [folder]             List a folder (default: root)");
    println!("  mkdir <folder>          Create a folder");
    println!("  rm <name|folder/>       Remove an object, or a folder and its contents");
    println!("  mv <from> <to>          Rename an object (or a folder, given as name/)");
    println!();
    println!("Options:");
    println!("  --config PATH, -c PATH  Path to config file");
    println!("  --key KEY               Cipher key (overrides config and AES_ENCRYPTION_KEY)");
    println!("  --root PATH             Vault root (overrides config and VAULT_ROOT)");
    println!("  --json                  Machine-readable output");
    println!("  -v                      Increase verbosity (can repeat)");
    println!("  -q                      Decrease verbosity (can repeat)");
    println!("  --version               Print version and exit");
    println!("  --help, -h              Print this help");
}
