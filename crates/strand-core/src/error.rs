//! Error types for `strand-core`.

use thiserror::Error;

use crate::request::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid request: {0}")]
  InvalidRequest(#[from] ValidationError),

  /// Stored linkage contradicts the cluster invariants. The operation is
  /// rejected rather than guessing which identity a record belongs to.
  #[error("consistency violation: {0}")]
  Consistency(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
