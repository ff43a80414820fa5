//! Error type for `crewboard-auth`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The signing secret is absent or empty. Fatal at startup.
  #[error("signing secret is not configured")]
  MissingSecret,

  /// Any verification failure. The detail is for logs only; callers see a
  /// uniform denial.
  #[error("invalid credential: {0}")]
  InvalidCredential(String),

  #[error("failed to sign credential: {0}")]
  Signing(#[source] jsonwebtoken::errors::Error),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
