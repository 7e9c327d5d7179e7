//! Configuration: rendering defaults and evaluation options.
//!
//! Both can be loaded from a TOML file:
//!
//! ```toml
//! [format]
//! decimal_point = ","
//! group_char = "."
//! int_format = "hex"
//!
//! [eval]
//! radix = 16
//! digit_separators = true
//! ```
//!
//! Missing keys keep their defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

// ── FormatConfig ──────────────────────────────────────────────────────────────

/// Locale and default formats used when rendering values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    pub decimal_point: char,
    /// Thousands separator for grouped decimal output.
    pub group_char: char,
    /// Digits per group in grouped decimal output.
    pub group_size: usize,
    /// Used for integers when no format is given.
    pub int_format: String,
    /// Used for unsigned integers when no format is given; falls back to
    /// `int_format` when empty.
    pub unsigned_format: String,
    pub real_format: String,
    pub string_format: String,
    pub date_format: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            decimal_point: '.',
            group_char: ',',
            group_size: 3,
            int_format: String::new(),
            unsigned_format: String::new(),
            real_format: String::new(),
            string_format: "%s".to_owned(),
            date_format: "%Y-%m-%d %H:%M:%S".to_owned(),
        }
    }
}

// ── EvalOptions ───────────────────────────────────────────────────────────────

/// Options that change how an expression is read and evaluated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalOptions {
    /// Radix of integer literals without a `0x`/`0b`/`0o` prefix.
    pub radix: u32,
    /// Allow digit separators inside integer literals.
    pub digit_separators: bool,
    /// Separator for decimal literals; other radixes use a space.
    pub separator: char,
    /// When false, assignments and increments are evaluated but not stored
    /// and no prompt is shown.
    pub side_effects: bool,
    /// Report every missing operand as "Not implemented".
    pub legacy_messages: bool,
    /// Deepest nesting accepted before "Expression too complex".
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            radix: 10,
            digit_separators: false,
            separator: ',',
            side_effects: true,
            legacy_messages: false,
            max_depth: 64,
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// An error encountered while loading a config file.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}{message}", line_prefix(.line))]
pub struct ConfigError {
    /// 1-based line of the problem; 0 when it isn't tied to a line.
    pub line: usize,
    pub message: String,
}

fn line_prefix(line: &usize) -> String {
    match line {
        0 => String::new(),
        n => format!("line {n}: "),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: FormatConfig,
    pub eval: EvalOptions,
}

impl Config {
    pub fn load_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s).map_err(|e| ConfigError {
            line: e.span().map_or(0, |span| line_of(s, span.start)),
            message: e.message().to_owned(),
        })?;
        config.validate(s)?;
        log::debug!("loaded config: radix {}", config.eval.radix);
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|e| ConfigError {
            line: 0,
            message: format!("{}: {e}", path.display()),
        })?;
        Self::load_str(&s)
    }

    fn validate(&self, src: &str) -> Result<(), ConfigError> {
        let key_line = |key: &str| {
            src.lines()
                .position(|l| l.trim_start().starts_with(key))
                .map_or(0, |i| i + 1)
        };
        if !(2..=36).contains(&self.eval.radix) {
            return Err(ConfigError {
                line: key_line("radix"),
                message: format!("radix must be from 2 to 36, not {}", self.eval.radix),
            });
        }
        if self.format.group_size == 0 {
            return Err(ConfigError {
                line: key_line("group_size"),
                message: "group_size must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn line_of(s: &str, offset: usize) -> usize {
    s[..offset.min(s.len())].matches('\n').count() + 1
}

/// `<config dir>/hexpr/config.toml` for the current user.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hexpr").map(|d| d.config_dir().join("config.toml"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(Config::load_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_tables() {
        let cfg = Config::load_str(
            "[format]\ndecimal_point = \",\"\nint_format = \"hex\"\n\n[eval]\nradix = 16\n",
        )
        .unwrap();
        assert_eq!(cfg.format.decimal_point, ',');
        assert_eq!(cfg.format.int_format, "hex");
        assert_eq!(cfg.format.group_size, 3);
        assert_eq!(cfg.eval.radix, 16);
        assert!(cfg.eval.side_effects);
    }

    #[test]
    fn syntax_error_has_line() {
        let err = Config::load_str("[eval]\nradix = 10\nside_effects = maybe\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = Config::load_str("[format]\ncolour = \"red\"\n").unwrap_err();
        assert!(err.message.contains("colour"), "{err}");
    }

    #[test]
    fn radix_out_of_range() {
        let err = Config::load_str("[eval]\n\nradix = 40\n").unwrap_err();
        assert_eq!(err.to_string(), "line 3: radix must be from 2 to 36, not 40");
    }

    #[test]
    fn load_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[eval]\nlegacy_messages = true\n").unwrap();
        assert!(Config::load_file(&path).unwrap().eval.legacy_messages);

        let err = Config::load_file(&dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.line, 0);
        assert_eq!(err.to_string(), err.message);
        let _: &dyn std::error::Error = &err;
    }
}
