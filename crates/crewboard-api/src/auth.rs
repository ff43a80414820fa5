//! The role gate as an axum extractor.
//!
//! A handler declares its requirement in its signature:
//!
//! ```rust,ignore
//! async fn create(auth: Authorized<AdminOnly>, ..)
//! ```
//!
//! Handlers without an [`Authorized`] argument are open.

use std::marker::PhantomData;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use crewboard_auth::admit;
use crewboard_core::{identity::Principal, policy::Denial, role::Role};

use crate::{AppState, Store, error::ApiError};

/// A statically declared set of roles allowed to perform an operation.
pub trait RoleRequirement: Send + Sync + 'static {
  const ROLES: &'static [Role];
}

pub struct AdminOnly;

impl RoleRequirement for AdminOnly {
  const ROLES: &'static [Role] = &[Role::Admin];
}

/// Admins and project managers.
pub struct Managers;

impl RoleRequirement for Managers {
  const ROLES: &'static [Role] = &[Role::Admin, Role::ProjectManager];
}

/// Any authenticated user holding a role.
pub struct AnyRole;

impl RoleRequirement for AnyRole {
  const ROLES: &'static [Role] = &[Role::Admin, Role::ProjectManager, Role::Engineer];
}

/// Present in a handler means the caller passed the gate for `R`.
pub struct Authorized<R> {
  pub principal: Principal,
  _requirement:  PhantomData<fn() -> R>,
}

/// The raw `Authorization` header value, if it is valid UTF-8.
pub(crate) fn authorization(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
}

impl<S, R> FromRequestParts<AppState<S>> for Authorized<R>
where
  S: Store,
  R: RoleRequirement,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let principal = admit(
      &state.codec,
      state.store.as_ref(),
      Some(R::ROLES),
      authorization(&parts.headers),
    )
    .await?
    .ok_or(Denial::MissingCredential)?;

    Ok(Authorized { principal, _requirement: PhantomData })
  }
}
