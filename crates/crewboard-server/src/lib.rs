//! Server wiring for Crewboard: configuration loading and store/codec setup.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use crewboard_api::AppState;
use crewboard_auth::{CredentialCodec, TokenConfig};
use crewboard_store_sqlite::SqliteStore;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "CREWBOARD";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CREWBOARD_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  pub jwt_secret:   String,
  pub jwt_issuer:   String,
  pub jwt_audience: String,
}

impl std::fmt::Debug for ServerConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ServerConfig")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("store_path", &self.store_path)
      .field("jwt_secret", &"<redacted>")
      .field("jwt_issuer", &self.jwt_issuer)
      .field("jwt_audience", &self.jwt_audience)
      .finish()
  }
}

impl ServerConfig {
  pub fn token_config(&self) -> TokenConfig {
    TokenConfig {
      secret:   self.jwt_secret.clone(),
      issuer:   self.jwt_issuer.clone(),
      audience: self.jwt_audience.clone(),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Layer the optional TOML file at `path` under the environment.
///
/// Everything except the signing secret has a default; an absent secret
/// deserialises as empty and is rejected when the codec is built.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 3000)?
    .set_default("store_path", "crewboard.db")?
    .set_default("jwt_secret", "")?
    .set_default("jwt_issuer", "crewboard")?
    .set_default("jwt_audience", "crewboard-api")?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix(ENV_PREFIX))
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Errors that stop the server before it binds.
#[derive(Debug, Error)]
pub enum StartupError {
  #[error("invalid credential configuration: {0}")]
  Credential(#[source] crewboard_auth::Error),

  #[error("failed to open store: {0}")]
  Store(#[source] crewboard_store_sqlite::Error),
}

/// Build the codec and open the store described by `config`.
///
/// The codec is built first so a missing secret fails before any file is
/// touched.
pub async fn build_state(config: &ServerConfig) -> Result<AppState<SqliteStore>, StartupError> {
  let codec = CredentialCodec::new(&config.token_config()).map_err(StartupError::Credential)?;

  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .map_err(StartupError::Store)?;
  tracing::info!(path = %store_path.display(), "opened store");

  Ok(AppState { store: Arc::new(store), codec: Arc::new(codec) })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write_config(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("crewboard-cfg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = load_config(Path::new("/nonexistent/crewboard.toml")).unwrap();
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.jwt_issuer, "crewboard");
    assert_eq!(cfg.jwt_audience, "crewboard-api");
  }

  #[test]
  fn file_values_override_defaults() {
    let path = write_config(
      "override.toml",
      "host = \"0.0.0.0\"\nport = 8088\njwt_secret = \"s3cret\"\nstore_path = \"/tmp/cb.db\"\n",
    );
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:8088");
    assert_eq!(cfg.token_config().secret, "s3cret");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/cb.db"));
  }

  #[test]
  fn debug_output_hides_secret() {
    let path = write_config("debug.toml", "jwt_secret = \"hunter2\"\n");
    let cfg = load_config(&path).unwrap();
    assert!(!format!("{cfg:?}").contains("hunter2"));
  }

  #[tokio::test]
  async fn missing_secret_is_fatal() {
    let path = write_config("nosecret.toml", "store_path = \":memory:\"\n");
    let mut cfg = load_config(&path).unwrap();
    cfg.jwt_secret = String::new();
    assert!(matches!(build_state(&cfg).await, Err(StartupError::Credential(_))));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/cb.db")), PathBuf::from(home).join("cb.db"));
    assert_eq!(expand_tilde(Path::new("/abs/cb.db")), PathBuf::from("/abs/cb.db"));
  }
}
