use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pagination::DEFAULT_LOG_LIMIT;
use crate::preferences::{Language, Theme};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub language: Language,
  #[serde(default)]
  pub theme: Theme,
  #[serde(default)]
  pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  10
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
  /// Dungeon log entries fetched per page
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

fn default_page_size() -> u32 {
  DEFAULT_LOG_LIMIT
}

impl Default for LogsConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./hoardview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/hoardview/config.yaml
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
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/hoardview/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("hoardview.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("hoardview").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.logs.page_size == 0 {
      return Err(eyre!("logs.page_size must be at least 1"));
    }
    Ok(config)
  }

  /// Get the access token from the environment.
  ///
  /// Reads HOARDVIEW_TOKEN. Without it the app starts signed out.
  pub fn get_access_token() -> Option<String> {
    std::env::var("HOARDVIEW_TOKEN")
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::from_yaml("api:\n  url: https://api.example.com/v1/\n").unwrap();

    assert_eq!(config.api.url, "https://api.example.com/v1/");
    assert_eq!(config.api.timeout(), Duration::from_secs(10));
    assert_eq!(config.language, Language::Ko);
    assert_eq!(config.theme, Theme::System);
    assert_eq!(config.logs.page_size, 10);
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
api:
  url: http://localhost:8080/
  timeout_secs: 3
language: en
theme: dark
logs:
  page_size: 25
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.api.timeout_secs, 3);
    assert_eq!(config.language, Language::En);
    assert_eq!(config.theme, Theme::Dark);
    assert_eq!(config.logs.page_size, 25);
  }

  #[test]
  fn test_unknown_theme_is_rejected() {
    let yaml = "api:\n  url: http://localhost/\ntheme: sepia\n";
    assert!(Config::from_yaml(yaml).is_err());
  }

  #[test]
  fn test_zero_page_size_is_rejected() {
    let yaml = "api:\n  url: http://localhost/\nlogs:\n  page_size: 0\n";
    assert!(Config::from_yaml(yaml).is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/hoardview.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
