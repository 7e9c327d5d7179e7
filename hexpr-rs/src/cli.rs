//! Command-line argument parsing.
//!
//! Usage:
//!   hexpr [OPTIONS] [-e <expr>]...
//!
//! With no `-e`, expressions are read from stdin one per line.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, Config, ConfigError};

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "hexpr", version, about = "Evaluate binary-template expressions", long_about = None)]
pub struct CliArgs {
    /// Evaluate this expression and exit; may be repeated.
    #[arg(short = 'e', long = "eval", value_name = "EXPR")]
    pub exprs: Vec<String>,

    /// Radix of integer literals without a prefix.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(2..=36))]
    pub radix: Option<u32>,

    /// Allow digit separators in integer literals.
    #[arg(short, long)]
    pub separators: bool,

    /// Evaluate without storing assignments or showing prompts.
    #[arg(long)]
    pub no_side_effects: bool,

    /// Report missing operands as "Not implemented".
    #[arg(long)]
    pub legacy: bool,

    /// Format for displaying results (e.g. `hex`, `%08X`, `%Y-%m-%d`).
    #[arg(short, long, default_value = "")]
    pub format: String,

    /// Byte size used when rendering integers and reals.
    #[arg(long, default_value_t = 4)]
    pub size: i32,

    /// Render integers as unsigned.
    #[arg(short, long)]
    pub unsigned: bool,

    /// Config file to load instead of the user's.
    #[arg(short, long, value_name = "FILE", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Don't load any config file.
    #[arg(long)]
    pub no_config: bool,

    /// File whose bytes `get()` reads.
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// How to choose the config file.
#[derive(Debug, PartialEq)]
pub enum ConfigFile {
    /// The user's config file, if there is one (default).
    Search,
    /// `--no-config`: built-in defaults only.
    Skip,
    /// `--config <file>`: this file, which must exist.
    Explicit(PathBuf),
}

impl CliArgs {
    pub fn config_file(&self) -> ConfigFile {
        match (&self.config, self.no_config) {
            (Some(path), _) => ConfigFile::Explicit(path.clone()),
            (None, true) => ConfigFile::Skip,
            (None, false) => ConfigFile::Search,
        }
    }

    /// Load the chosen config and apply the command-line overrides to it.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let path = match self.config_file() {
            ConfigFile::Skip => None,
            ConfigFile::Explicit(path) => Some(path),
            ConfigFile::Search => find_user_config(),
        };
        let mut cfg = match path {
            Some(path) => {
                log::info!("using config {}", path.display());
                Config::load_file(&path)?
            }
            None => Config::default(),
        };
        if let Some(radix) = self.radix {
            cfg.eval.radix = radix;
        }
        cfg.eval.digit_separators |= self.separators;
        cfg.eval.side_effects &= !self.no_side_effects;
        cfg.eval.legacy_messages |= self.legacy;
        Ok(cfg)
    }

    /// `log` level for `-v` count.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`, exiting with usage on error.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Parse a slice of argument strings, without the program name (exposed for
/// testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    CliArgs::try_parse_from(std::iter::once("hexpr").chain(argv.iter().map(String::as_str)))
        .map_err(|e| e.to_string())
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// The user's config file, if it exists.
pub fn find_user_config() -> Option<PathBuf> {
    config::default_path().filter(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
