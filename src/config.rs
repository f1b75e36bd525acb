//! Loading service configuration (server, store backend, evaluation, content bank) from TOML.
//!
//! See `AppConfig` for the expected schema. Every section is optional; env
//! variables override the file for the values operators usually change.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Challenge, Definition};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub server: ServerCfg,
  #[serde(default)]
  pub store: StoreCfg,
  #[serde(default)]
  pub evaluation: EvaluationCfg,
  /// Extra challenges for the memory backend.
  #[serde(default)]
  pub challenges: Vec<Challenge>,
  /// Extra definitions for the memory backend.
  #[serde(default)]
  pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerCfg {
  #[serde(default = "default_port")]
  pub port: u16,
  /// Prebuilt frontend served for every non-API path.
  #[serde(default = "default_static_dir")]
  pub static_dir: String,
}

impl Default for ServerCfg {
  fn default() -> Self {
    Self { port: default_port(), static_dir: default_static_dir() }
  }
}

fn default_port() -> u16 { 3000 }
fn default_static_dir() -> String { "./static".into() }

#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
  #[default]
  Memory,
  Rest,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StoreCfg {
  #[serde(default)]
  pub backend: StoreBackend,
  /// Base URL of the managed backend (REST and auth live under it).
  #[serde(default)]
  pub url: Option<String>,
  /// Service key sent as `apikey` and bearer token. Never logged.
  #[serde(default)]
  pub api_key: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for StoreCfg {
  fn default() -> Self {
    Self { backend: StoreBackend::Memory, url: None, api_key: None, timeout_secs: default_timeout_secs() }
  }
}

fn default_timeout_secs() -> u64 { 20 }

#[derive(Clone, Debug, Deserialize)]
pub struct EvaluationCfg {
  /// Grading strategy name. Only "trivial" exists today.
  #[serde(default = "default_oracle")]
  pub oracle: String,
}

impl Default for EvaluationCfg {
  fn default() -> Self {
    Self { oracle: default_oracle() }
  }
}

fn default_oracle() -> String { "trivial".into() }

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "code_practice", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "code_practice", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "code_practice", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// File config (or defaults) with env overrides applied:
/// PORT, STATIC_DIR, STORE_URL, STORE_API_KEY, STORE_BACKEND.
pub fn resolve_config() -> AppConfig {
  let mut cfg = load_app_config_from_env().unwrap_or_default();
  apply_env(&mut cfg, |k| std::env::var(k).ok());
  cfg
}

fn apply_env(cfg: &mut AppConfig, get: impl Fn(&str) -> Option<String>) {
  if let Some(port) = get("PORT").and_then(|p| p.parse::<u16>().ok()) {
    cfg.server.port = port;
  }
  if let Some(dir) = get("STATIC_DIR") {
    cfg.server.static_dir = dir;
  }
  if let Some(url) = get("STORE_URL") {
    cfg.store.url = Some(url);
  }
  if let Some(key) = get("STORE_API_KEY") {
    cfg.store.api_key = Some(key);
  }
  match get("STORE_BACKEND").as_deref() {
    Some("rest") => cfg.store.backend = StoreBackend::Rest,
    Some("memory") => cfg.store.backend = StoreBackend::Memory,
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg: AppConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert_eq!(cfg.store.timeout_secs, 20);
    assert_eq!(cfg.evaluation.oracle, "trivial");
  }

  #[test]
  fn bank_entries_parse_with_store_column_names() {
    let raw = r#"
      [store]
      backend = "rest"
      url = "https://example.invalid"

      [[challenges]]
      id = "hello"
      title = "Hello"
      difficulty = "easy"
      jezyk_pro = "python"
      topic_pro = "basics"
      solution = "print('hello')"

      [[definitions]]
      id = "tuple"
      title = "Tuple"
      language = "python"
    "#;
    let cfg: AppConfig = toml::from_str(raw).unwrap();
    assert_eq!(cfg.store.backend, StoreBackend::Rest);
    assert_eq!(cfg.challenges.len(), 1);
    assert_eq!(cfg.challenges[0].language, "python");
    assert_eq!(cfg.definitions[0].id, "tuple");
  }

  #[test]
  fn env_overrides_file_values() {
    let mut cfg = AppConfig::default();
    apply_env(&mut cfg, |k| match k {
      "PORT" => Some("8080".into()),
      "STORE_URL" => Some("http://localhost:54321".into()),
      "STORE_BACKEND" => Some("rest".into()),
      _ => None,
    });
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.store.url.as_deref(), Some("http://localhost:54321"));
    assert_eq!(cfg.store.backend, StoreBackend::Rest);
  }

  #[test]
  fn bad_port_is_ignored() {
    let mut cfg = AppConfig::default();
    apply_env(&mut cfg, |k| (k == "PORT").then(|| "not-a-port".to_string()));
    assert_eq!(cfg.server.port, 3000);
  }
}
