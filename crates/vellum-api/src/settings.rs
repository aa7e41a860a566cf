//! Server configuration: defaults, then an optional TOML file, then
//! `VELLUM_*` environment variables.

use std::path::{Path, PathBuf};

use argon2::PasswordHash;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::AuthConfig;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  /// SQLite database file; a leading `~/` is expanded by [`ServerConfig::load`].
  pub store_path:           PathBuf,
  pub request_timeout_secs: u64,
  pub auth_username:        Option<String>,
  /// argon2 PHC string, as printed by `vellum-server --hash-password`.
  pub auth_password_hash:   Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 7390,
      store_path:           PathBuf::from("vellum.db"),
      request_timeout_secs: 30,
      auth_username:        None,
      auth_password_hash:   None,
    }
  }
}

impl ServerConfig {
  /// Layer `path` (if it exists) and the environment over the defaults, then
  /// check the result.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let mut cfg: Self = Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix("VELLUM").try_parsing(true))
      .build()?
      .try_deserialize()?;

    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.validate()?;
    Ok(cfg)
  }

  /// Auth settings come as a pair, and the hash must be a PHC string.
  fn validate(&self) -> Result<(), ConfigError> {
    match (&self.auth_username, &self.auth_password_hash) {
      (None, None) => {}
      (Some(_), Some(hash)) => {
        PasswordHash::new(hash).map_err(|e| {
          ConfigError::Message(format!("auth_password_hash is not a PHC string: {e}"))
        })?;
      }
      _ => {
        return Err(ConfigError::Message(
          "auth_username and auth_password_hash must be set together".into(),
        ));
      }
    }
    if self.request_timeout_secs == 0 {
      return Err(ConfigError::Message("request_timeout_secs must be positive".into()));
    }
    Ok(())
  }

  /// Credentials to enforce; `None` runs the API open.
  pub fn auth(&self) -> Option<AuthConfig> {
    Some(AuthConfig {
      username:      self.auth_username.clone()?,
      password_hash: self.auth_password_hash.clone()?,
    })
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
