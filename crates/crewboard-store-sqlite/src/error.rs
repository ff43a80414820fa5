//! Error type for `crewboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value this build does not know.
  #[error("unrecognised {column} value: {value:?}")]
  BadEnum { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
