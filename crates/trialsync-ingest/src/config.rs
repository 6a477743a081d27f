//! Runtime configuration.
//!
//! Layered with the `config` crate: defaults, then an optional TOML file, then
//! `TRIALSYNC_*` environment variables. Nested keys use `__`, e.g.
//! `TRIALSYNC_EU__MAX_ATTEMPTS=5` or `TRIALSYNC_SCHEDULE__INTERVAL_SECS=600`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use trialsync_sources::{eu::EuConfig, us::UsConfig};

/// Twelve hours.
pub const DEFAULT_INTERVAL_SECS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file; a leading `~/` expands to `$HOME`.
  pub store_path: PathBuf,
  pub us:         UsConfig,
  pub eu:         EuConfig,
  pub schedule:   ScheduleConfig,
  pub api:        ApiConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("trialsync.db"),
      us:         UsConfig::default(),
      eu:         EuConfig::default(),
      schedule:   ScheduleConfig::default(),
      api:        ApiConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
  pub interval_secs: u64,
}

impl Default for ScheduleConfig {
  fn default() -> Self { Self { interval_secs: DEFAULT_INTERVAL_SECS } }
}

impl ScheduleConfig {
  pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs) }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub host: String,
  pub port: u16,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      host: "127.0.0.1".to_owned(),
      port: 8080,
    }
  }
}

impl Settings {
  /// Load settings from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> Result<Self, ::config::ConfigError> {
    ::config::Config::builder()
      .add_source(::config::File::from(path).required(false))
      .add_source(
        ::config::Environment::with_prefix("TRIALSYNC")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~/` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let s = Settings::load(Path::new("/nonexistent/trialsync.toml")).unwrap();
    assert_eq!(s.schedule.interval(), Duration::from_secs(43_200));
    assert_eq!(s.eu.max_attempts, 3);
    assert_eq!(s.eu.retry_delay(), Duration::from_secs(2));
    assert_eq!(s.us.page_size, 100);
  }

  #[test]
  fn file_overrides_nested_keys() {
    let path = std::env::temp_dir().join(format!(
      "trialsync-config-test-{}.toml",
      std::process::id()
    ));
    std::fs::write(
      &path,
      "store_path = \"/tmp/trials.db\"\n\
       [eu]\nmax_attempts = 5\n\
       [schedule]\ninterval_secs = 60\n",
    )
    .unwrap();

    let s = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(s.store_path, PathBuf::from("/tmp/trials.db"));
    assert_eq!(s.eu.max_attempts, 5);
    assert_eq!(s.eu.retry_delay_ms, 2_000);
    assert_eq!(s.schedule.interval_secs, 60);
    assert_eq!(s.api.port, 8080);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/trials.db")),
      PathBuf::from(home).join("data/trials.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
