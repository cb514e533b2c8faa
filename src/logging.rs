//! `tracing` subscriber setup
//!
//! The CLI logs to stderr. The TUI owns the terminal, so it logs to a file
//! under the data directory instead.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::Result;

const ENV_LOG: &str = "MILKTRACK_LOG";

/// Log to stderr
pub fn init_stderr(verbose: bool) {
    let _ = fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to `path`, appending
pub fn init_file(verbose: bool, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let _ = fmt()
        .with_env_filter(filter(verbose))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(directive(verbose, std::env::var(ENV_LOG).ok()))
}

/// `MILKTRACK_LOG` wins when set; otherwise `-v` selects debug
fn directive(verbose: bool, env: Option<String>) -> String {
    match env.filter(|v| !v.trim().is_empty()) {
        Some(value) => value,
        None if verbose => "milktrack=debug".to_string(),
        None => "warn".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_defaults() {
        assert_eq!(directive(false, None), "warn");
        assert_eq!(directive(true, None), "milktrack=debug");
    }

    #[test]
    fn test_directive_env_wins() {
        assert_eq!(directive(true, Some("trace".into())), "trace");
        assert_eq!(directive(false, Some("  ".into())), "warn");
    }
}
