//! Runtime configuration
//!
//! Resolution order, later wins: built-in defaults, `<data_dir>/config.json`,
//! environment (`MILKTRACK_API_URL`, `MILKTRACK_TIMEOUT_SECS`), then the
//! `--api-url` flag.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use tracing::debug;

use crate::types::{MilktrackError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_API_URL: &str = "MILKTRACK_API_URL";
const ENV_TIMEOUT: &str = "MILKTRACK_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL including the `/api` prefix
    pub api_url: String,
    pub timeout_secs: u64,
    /// Holds `session.json`, `config.json` and the TUI log
    pub data_dir: PathBuf,
}

/// On-disk overrides
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// `~/.milktrack`
    pub fn data_dir() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| MilktrackError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".milktrack"))
    }

    /// Resolve from `data_dir` and the process environment
    pub fn load(data_dir: PathBuf, api_url_override: Option<&str>) -> Result<Self> {
        Self::resolve(data_dir, |key| std::env::var(key).ok(), api_url_override)
    }

    pub fn resolve(
        data_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
        api_url_override: Option<&str>,
    ) -> Result<Self> {
        let file = read_config_file(&data_dir.join("config.json"))?;

        let mut api_url = file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut timeout_secs = file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        if let Some(url) = env(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            api_url = url;
        }
        if let Some(raw) = env(ENV_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            timeout_secs = raw.trim().parse().map_err(|_| {
                MilktrackError::Config(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_TIMEOUT, raw
                ))
            })?;
        }
        if let Some(url) = api_url_override {
            api_url = url.to_string();
        }

        let api_url = api_url.trim().trim_end_matches('/').to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(MilktrackError::Config(format!(
                "API URL must start with http:// or https://, got {:?}",
                api_url
            )));
        }
        if timeout_secs == 0 {
            return Err(MilktrackError::Config("timeout must be at least 1 second".into()));
        }

        debug!(%api_url, timeout_secs, data_dir = %data_dir.display(), "resolved config");
        Ok(Self {
            api_url,
            timeout_secs,
            data_dir,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        Self::log_path_in(&self.data_dir)
    }

    /// TUI log file for `data_dir`, known before the rest of the config loads
    pub fn log_path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("milktrack.log")
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| MilktrackError::Config(format!("Invalid {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::resolve(tmp.path().to_path_buf(), env_of(&[]), None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.log_path(), tmp.path().join("milktrack.log"));
        assert_eq!(Config::log_path_in(tmp.path()), config.log_path());
    }

    #[test]
    fn test_resolve_logs_resolved_values() {
        let tmp = TempDir::new().unwrap();
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            Config::resolve(tmp.path().to_path_buf(), env_of(&[]), Some("http://farm:8080/api"))
        })
        .unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("resolved config"));
        assert!(output.contains("http://farm:8080/api"));
    }

    #[test]
    fn test_precedence_file_env_flag() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.json"),
            r#"{ "apiUrl": "http://file:1/api", "timeoutSecs": 3 }"#,
        )
        .unwrap();

        let from_file = Config::resolve(tmp.path().to_path_buf(), env_of(&[]), None).unwrap();
        assert_eq!(from_file.api_url, "http://file:1/api");
        assert_eq!(from_file.timeout_secs, 3);

        let env = env_of(&[(ENV_API_URL, "http://env:2/api/"), (ENV_TIMEOUT, "7")]);
        let from_env = Config::resolve(tmp.path().to_path_buf(), env, None).unwrap();
        assert_eq!(from_env.api_url, "http://env:2/api");
        assert_eq!(from_env.timeout_secs, 7);

        let env = env_of(&[(ENV_API_URL, "http://env:2/api")]);
        let from_flag =
            Config::resolve(tmp.path().to_path_buf(), env, Some("https://flag:3/api")).unwrap();
        assert_eq!(from_flag.api_url, "https://flag:3/api");
    }

    #[test]
    fn test_rejects_bad_values() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();

        assert!(Config::resolve(dir.clone(), env_of(&[(ENV_TIMEOUT, "soon")]), None).is_err());
        assert!(Config::resolve(dir.clone(), env_of(&[(ENV_TIMEOUT, "0")]), None).is_err());
        assert!(Config::resolve(dir.clone(), env_of(&[]), Some("localhost:8080")).is_err());

        fs::write(tmp.path().join("config.json"), "{ not json").unwrap();
        let err = Config::resolve(dir, env_of(&[]), None).unwrap_err();
        assert!(matches!(err, MilktrackError::Config(_)));
    }
}
