use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub database: DatabaseConfig,
  pub offline: OfflineConfig,
  pub logging: LoggingConfig,
  /// How long toasts stay visible, in seconds
  pub toast_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  /// Database name; the file is `<name>.sqlite` in the data directory
  pub name: String,
  /// Explicit database file, overrides `name`
  pub path: Option<PathBuf>,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      name: "StudentDB".to_string(),
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
  pub enabled: bool,
  /// Base URL the shell is served from
  pub origin: String,
  /// Current cache generation; bump it to ship a new version
  pub cache_name: String,
  /// Shell assets stored at install, relative to `origin`
  pub manifest: Vec<String>,
  /// URL substring that marks API requests
  pub api_marker: String,
  /// Store static assets first fetched after install
  pub cache_static_on_fetch: bool,
}

impl Default for OfflineConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      origin: "http://localhost:8080/".to_string(),
      cache_name: "student-crud-v1".to_string(),
      manifest: vec![
        "./".to_string(),
        "./index.html".to_string(),
        "./assets/css/style.css".to_string(),
        "./assets/js/script.js".to_string(),
        "./assets/manifest.json".to_string(),
      ],
      api_marker: "/api/".to_string(),
      cache_static_on_fetch: false,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Default filter when RUST_LOG is not set
  pub level: String,
  /// Directory for the log file (defaults to the data directory)
  pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rollbook.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rollbook/config.yaml
  ///
  /// Without any file the defaults are used.
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
    let local = PathBuf::from("rollbook.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rollbook").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Base directory for everything rollbook writes.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("rollbook"))
  }

  /// Path of the record database
  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database.path {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join(format!("{}.sqlite", self.database.name))),
    }
  }

  /// Path of the offline cache database
  pub fn cache_path(&self) -> Result<PathBuf> {
    Ok(Self::data_dir()?.join("offline-cache.sqlite"))
  }

  pub fn log_dir(&self) -> Result<PathBuf> {
    match &self.logging.directory {
      Some(dir) => Ok(dir.clone()),
      None => Self::data_dir(),
    }
  }

  pub fn toast_ttl(&self) -> Duration {
    self
      .toast_seconds
      .map(Duration::from_secs)
      .unwrap_or(crate::notify::DEFAULT_TOAST_TTL)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.database.name, "StudentDB");
    assert_eq!(config.offline.cache_name, "student-crud-v1");
    assert_eq!(config.offline.manifest.len(), 5);
    assert_eq!(config.toast_ttl(), Duration::from_secs(3));
  }

  #[test]
  fn test_partial_sections_keep_defaults() {
    let config = Config::parse(
      "offline:\n  cache_name: student-crud-v2\n  cache_static_on_fetch: true\ntoast_seconds: 5\n",
    )
    .unwrap();

    assert_eq!(config.offline.cache_name, "student-crud-v2");
    assert!(config.offline.cache_static_on_fetch);
    assert_eq!(config.offline.api_marker, "/api/");
    assert!(config.offline.enabled);
    assert_eq!(config.toast_ttl(), Duration::from_secs(5));
  }

  #[test]
  fn test_explicit_database_path_wins() {
    let config = Config::parse("database:\n  path: /tmp/students.sqlite\n").unwrap();
    assert_eq!(
      config.database_path().unwrap(),
      PathBuf::from("/tmp/students.sqlite")
    );
  }

  #[test]
  fn test_missing_explicit_config_is_an_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/rollbook.yaml"))).is_err());
  }
}
