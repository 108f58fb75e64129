//! Error type for `strand-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown link precedence: {0:?}")]
  UnknownPrecedence(String),

  /// A demotion named a contact that does not exist. Nothing was changed.
  #[error("contact not found: {0}")]
  ContactNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
