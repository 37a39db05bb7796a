use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub cache: CacheConfig,
  pub backend: BackendConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// When false, every read misses and nothing is stored
  pub enabled: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
  /// Simulated latency applied to every backend call
  pub latency_ms: u64,
  /// Transactions per page for `paginatedTransactions`
  pub page_size: usize,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      latency_ms: 300,
      page_size: 5,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Filter used when RUST_LOG is not set (e.g. "info", "txcache=debug")
  #[serde(deserialize_with = "deserialize_lowercase")]
  pub level: String,
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "warn".to_string(),
      file: None,
    }
  }
}

fn deserialize_lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let s = String::deserialize(deserializer)?;
  Ok(s.to_lowercase())
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./txcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/txcache/config.yaml
  ///
  /// Falls back to defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("txcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("txcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    // An empty file is valid and means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  pub fn latency(&self) -> Duration {
    Duration::from_millis(self.backend.latency_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("config.yaml");
    fs::write(&path, contents).expect("Failed to write config");
    (dir, path)
  }

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert!(config.cache.enabled);
    assert_eq!(config.latency(), Duration::from_millis(300));
    assert_eq!(config.backend.page_size, 5);
    assert_eq!(config.log.level, "warn");
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let (_dir, path) = write_config("cache:\n  enabled: false\nlog:\n  level: DEBUG\n");

    let config = Config::load(Some(path.as_path())).unwrap();

    assert!(!config.cache.enabled);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.backend.latency_ms, 300);
  }

  #[test]
  fn test_empty_file_is_defaults() {
    let (_dir, path) = write_config("");
    let config = Config::load(Some(path.as_path())).unwrap();
    assert!(config.cache.enabled);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(Some(dir.path().join("nope.yaml").as_path())).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_invalid_yaml_names_the_file() {
    let (_dir, path) = write_config("backend:\n  latency_ms: soon\n");
    let err = Config::load(Some(path.as_path())).unwrap_err();
    assert!(err.to_string().contains("config.yaml"));
  }
}
