//! JSON REST API for Crewboard.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`UserStore`] and [`ProjectStore`]. Every protected handler declares its
//! role requirement through an [`auth::Authorized`] argument.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = crewboard_api::api_router(AppState { store, codec });
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod projects;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use crewboard_auth::CredentialCodec;
use crewboard_core::store::{ProjectStore, UserStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// A backend usable by the API.
pub trait Store: UserStore + ProjectStore + 'static {}

impl<T> Store for T where T: UserStore + ProjectStore + 'static {}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub codec: Arc<CredentialCodec>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    AppState {
      store: Arc::clone(&self.store),
      codec: Arc::clone(&self.codec),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router for `state`.
pub fn api_router<S: Store>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Users
    .route("/users/engineer/create", post(users::create_engineer::<S>))
    .route("/users/project-manager/create", post(users::create_project_manager::<S>))
    .route("/users/admin/create", post(users::create_admin::<S>))
    .route("/users/login", post(users::login::<S>))
    .route("/users", get(users::list::<S>))
    .route("/users/{id}", get(users::get_one::<S>).delete(users::delete_one::<S>))
    .route("/users/edit/{id}", put(users::update::<S>))
    // Projects
    .route("/projects/create", post(projects::create::<S>))
    .route("/projects", get(projects::list::<S>))
    .route("/projects/{id}", put(projects::update::<S>).delete(projects::delete_one::<S>))
    .route(
      "/projects/assign/{project_id}/{user_id}/{slot}",
      put(projects::assign_slot::<S>),
    )
    .route("/projects/assigned/{user_id}", get(projects::assigned::<S>))
    .route(
      "/projects/assigned/{user_id}/{project_id}",
      get(projects::assigned_one::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
