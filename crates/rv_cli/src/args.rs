// Offline, deterministic CLI argument parsing & validation.
// - No networked paths (reject any "<scheme>://")
// - Optional seed parsing (u64 decimal or 0x-hex up to 16 nybbles)

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "rv", about = "Offline review-voting engine runner", version)]
pub struct Args {
    /// Event fixture: participants, proposals, configuration, ballots.
    #[arg(long)]
    pub fixture: PathBuf,

    /// Output directory for results.json.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Assignment seed override; decimal u64 or 0x-prefixed hex (≤16 hex digits).
    #[arg(long)]
    pub seed: Option<String>,

    /// Upgrade configuration warnings (convergence floor) to errors.
    #[arg(long)]
    pub strict: bool,

    /// Suppress the text report on stdout.
    #[arg(long)]
    pub quiet: bool,

    /// Verbose engine logs on stderr.
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    BadSeed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "non-local path rejected: {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            BadSeed(s) => write!(f, "invalid seed: {s}"),
        }
    }
}

impl std::error::Error for CliError {}

fn looks_like_url(s: &str) -> bool {
    s.contains("://")
}

fn check_local(path: &Path) -> Result<(), CliError> {
    let display = path.display().to_string();
    if looks_like_url(&display) {
        return Err(CliError::NonLocalPath(display));
    }
    Ok(())
}

/// Parse a seed as decimal u64 or 0x-prefixed hex (1..=16 hex digits).
pub fn parse_seed(s: &str) -> Result<u64, CliError> {
    let bad = || CliError::BadSeed(s.to_string());
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() > 16 {
            return Err(bad());
        }
        u64::from_str_radix(hex, 16).map_err(|_| bad())
    } else {
        s.parse::<u64>().map_err(|_| bad())
    }
}

/// Offline policy + existence checks; returns the parsed seed, if any.
pub fn validate(args: &Args) -> Result<Option<u64>, CliError> {
    check_local(&args.fixture)?;
    check_local(&args.out)?;
    if !args.fixture.is_file() {
        return Err(CliError::NotFound(args.fixture.display().to_string()));
    }
    args.seed.as_deref().map(parse_seed).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_accepts_decimal_and_hex() {
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert_eq!(parse_seed("0x2a").unwrap(), 42);
        assert_eq!(parse_seed("0XFFFFFFFFFFFFFFFF").unwrap(), u64::MAX);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0x").is_err());
        assert!(parse_seed("0x10000000000000000").is_err());
        assert!(parse_seed("-1").is_err());
        assert!(parse_seed("forty-two").is_err());
    }

    #[test]
    fn url_paths_are_rejected() {
        assert!(check_local(Path::new("https://example.com/fixture.json")).is_err());
        assert!(check_local(Path::new("fixtures/minimal_event.json")).is_ok());
    }
}
