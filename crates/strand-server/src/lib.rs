//! Strand identity service: configuration and application assembly.
//!
//! The binary in `main.rs` is a thin shell around [`ServerConfig::load`] and
//! [`app`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use serde::Deserialize;
use strand_core::{resolver::IdentityResolver, store::ContactStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STRAND_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Default tracing directive; `RUST_LOG` takes precedence.
  pub log_level:  String,
}

impl ServerConfig {
  /// Layer defaults, the TOML file at `path` (if it exists), and the
  /// environment, in increasing order of precedence.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 3000)?
      .set_default("store_path", "strand.db")?
      .set_default("log_level", "info")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("STRAND"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~/` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
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

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router wrapped in request tracing.
pub fn app<S>(resolver: Arc<IdentityResolver<S>>) -> Router
where
  S: ContactStore + 'static,
{
  strand_api::api_router(resolver).layer(TraceLayer::new_for_http())
}
