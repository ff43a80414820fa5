//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use crewboard_core::{Error as CoreError, policy::Denial};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Conflict(String),

  /// Covers both an unknown email and a wrong password.
  #[error("invalid email or password")]
  InvalidLogin,

  #[error("credential error: {0}")]
  Credential(#[from] crewboard_auth::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Json(#[from] JsonRejection),

  #[error(transparent)]
  Path(#[from] PathRejection),

  #[error(transparent)]
  Query(#[from] QueryRejection),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store(Box::new(e))
  }
}

impl From<Denial> for ApiError {
  fn from(d: Denial) -> Self { ApiError::Core(d.into()) }
}

fn body(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "error": message.into() }))).into_response()
}

fn denied(denial: Denial) -> Response {
  match denial {
    Denial::MissingCredential | Denial::InvalidCredential | Denial::UnknownIdentity => {
      let mut res = body(StatusCode::UNAUTHORIZED, "access denied");
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
      res
    }
    Denial::NoRole | Denial::InsufficientRole { .. } => {
      body(StatusCode::FORBIDDEN, denial.to_string())
    }
  }
}

fn internal(e: &(dyn std::error::Error + 'static)) -> Response {
  tracing::error!(error = %e, "request failed");
  body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Core(e) => match e {
        CoreError::Denied(d) => denied(d),
        CoreError::InvalidSlotKind(_)
        | CoreError::UnknownRole(_)
        | CoreError::RoleMismatch { .. } => body(StatusCode::BAD_REQUEST, e.to_string()),
        CoreError::ProjectNotFound(_) | CoreError::UserNotFound(_) => {
          body(StatusCode::NOT_FOUND, e.to_string())
        }
        CoreError::SlotAlreadyAssigned { .. } | CoreError::Duplicate(_) => {
          body(StatusCode::CONFLICT, e.to_string())
        }
        CoreError::NotAssigned { .. } => body(StatusCode::FORBIDDEN, e.to_string()),
        CoreError::Store(inner) => internal(inner.as_ref()),
      },
      ApiError::BadRequest(m) => body(StatusCode::BAD_REQUEST, m),
      ApiError::Conflict(m) => body(StatusCode::CONFLICT, m),
      ApiError::InvalidLogin => body(StatusCode::UNAUTHORIZED, "invalid email or password"),
      ApiError::Credential(e) => internal(&e),
      ApiError::Store(e) => internal(e.as_ref()),
      ApiError::Json(r) => body(r.status(), r.body_text()),
      ApiError::Path(r) => body(r.status(), r.body_text()),
      ApiError::Query(r) => body(r.status(), r.body_text()),
    }
  }
}
