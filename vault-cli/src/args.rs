//! Simple command-line argument parser.
//!
//! No external dependencies. Supports `--flag`, `--key value`, `--key=value`,
//! `-v`/`-q` (counted), short flags with values, and positional arguments.
//! The first positional argument is the subcommand.

use std::collections::HashMap;

/// Long flags that never take a value.
const BOOLEAN_FLAGS: &[&str] = &["version", "help", "json", "hex"];

/// Parsed command-line arguments.
pub struct Args {
    pub flags: HashMap<String, String>,
    pub positional: Vec<String>,
    pub verbosity: u8,
    pub quiet: u8,
}

impl Args {
    /// Parse command-line arguments (skipping argv[0]).
    pub fn parse() -> Self {
        Self::parse_from(std::env::args().skip(1).collect())
    }

    /// Parse from a list of argument strings.
    pub fn parse_from(args: Vec<String>) -> Self {
        let mut flags = HashMap::new();
        let mut positional = Vec::new();
        let mut verbosity: u8 = 0;
        let mut quiet: u8 = 0;
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            if arg == "--" {
                // Everything after -- is positional
                positional.extend(iter);
                break;
            } else if let Some(key) = arg.strip_prefix("--") {
                if let Some((k, v)) = key.split_once('=') {
                    flags.insert(k.to_string(), v.to_string());
                } else if BOOLEAN_FLAGS.contains(&key) {
                    flags.insert(key.to_string(), "true".into());
                } else if let Some(val) = iter.next() {
                    flags.insert(key.to_string(), val);
                } else {
                    flags.insert(key.to_string(), "true".into());
                }
            } else if arg.starts_with('-') && arg.len() > 1 {
                let chars: Vec<char> = arg[1..].chars().collect();
                for &c in &chars {
                    match c {
                        'v' => verbosity = verbosity.saturating_add(1),
                        'q' => quiet = quiet.saturating_add(1),
                        'h' => {
                            flags.insert("help".into(), "true".into());
                        }
                        _ => {
                            // -c /path, -o out. Only consume the next arg
                            // if it doesn't look like a flag.
                            let next_is_value = chars.len() == 1
                                && iter
                                    .as_slice()
                                    .first()
                                    .map(|s| !s.starts_with('-') || s == "-")
                                    .unwrap_or(false);
                            let val = if next_is_value { iter.next() } else { None };
                            flags.insert(c.to_string(), val.unwrap_or_else(|| "true".into()));
                        }
                    }
                }
            } else {
                positional.push(arg);
            }
        }

        Args {
            flags,
            positional,
            verbosity,
            quiet,
        }
    }

    /// Get a flag value by long or short name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(|s| s.as_str())
    }

    /// Check if a flag is set.
    pub fn has(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    /// Get config path from --config or -c flag.
    pub fn config_path(&self) -> Option<&str> {
        self.get("config").or_else(|| self.get("c"))
    }

    /// Output path from --output or -o.
    pub fn output(&self) -> Option<&str> {
        self.get("output").or_else(|| self.get("o"))
    }

    pub fn command(&self) -> Option<&str> {
        self.positional.first().map(|s| s.as_str())
    }

    /// Positional arguments after the subcommand.
    pub fn operands(&self) -> &[String] {
        self.positional.get(1..).unwrap_or(&[])
    }

    /// Log filter from -v/-q, or `None` when neither was given.
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        if self.quiet > 0 {
            return Some(match self.quiet {
                1 => log::LevelFilter::Warn,
                _ => log::LevelFilter::Error,
            });
        }
        match self.verbosity {
            0 => None,
            1 => Some(log::LevelFilter::Debug),
            _ => Some(log::LevelFilter::Trace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Args {
        Args::parse_from(s.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn parse_config_and_verbose() {
        let a = args(&["--config", "/path/to/vault.conf", "-vv", "ls"]);
        assert_eq!(a.config_path(), Some("/path/to/vault.conf"));
        assert_eq!(a.verbosity, 2);
        assert_eq!(a.command(), Some("ls"));
    }

    #[test]
    fn parse_version() {
        let a = args(&["--version"]);
        assert!(a.has("version"));
        assert_eq!(a.command(), None);
    }

    #[test]
    fn parse_subcommand_and_operands() {
        let a = args(&["mv", "a.bin", "docs/b.bin"]);
        assert_eq!(a.command(), Some("mv"));
        assert_eq!(a.operands(), ["a.bin", "docs/b.bin"]);
    }

    #[test]
    fn parse_short_values() {
        let a = args(&["-c", "/my/config", "get", "x.bin", "-o", "out.bin"]);
        assert_eq!(a.config_path(), Some("/my/config"));
        assert_eq!(a.output(), Some("out.bin"));
        assert_eq!(a.operands(), ["x.bin"]);
    }

    #[test]
    fn short_flag_before_flag_is_boolean() {
        let a = args(&["-o", "-v"]);
        assert_eq!(a.get("o"), Some("true"));
        assert_eq!(a.verbosity, 1);
    }

    #[test]
    fn dash_is_a_value() {
        let a = args(&["decrypt", "in.bin", "-o", "-"]);
        assert_eq!(a.output(), Some("-"));
    }

    #[test]
    fn parse_boolean_long_flags() {
        let a = args(&["genkey", "--hex", "--json"]);
        assert!(a.has("hex"));
        assert!(a.has("json"));
        assert_eq!(a.operands().len(), 0);
    }

    #[test]
    fn parse_long_values() {
        let a = args(&["put", "f.bin", "--as", "docs/g.bin", "--key=abcdefghijklmnop"]);
        assert_eq!(a.get("as"), Some("docs/g.bin"));
        assert_eq!(a.get("key"), Some("abcdefghijklmnop"));
        assert_eq!(a.operands(), ["f.bin"]);
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = args(&["rm", "--", "-odd.bin"]);
        assert_eq!(a.operands(), ["-odd.bin"]);
    }

    #[test]
    fn log_levels() {
        assert_eq!(args(&[]).log_level(), None);
        assert_eq!(args(&["-v"]).log_level(), Some(log::LevelFilter::Debug));
        assert_eq!(args(&["-vvv"]).log_level(), Some(log::LevelFilter::Trace));
        assert_eq!(args(&["-q"]).log_level(), Some(log::LevelFilter::Warn));
        assert_eq!(args(&["-qq", "-v"]).log_level(), Some(log::LevelFilter::Error));
    }
}
