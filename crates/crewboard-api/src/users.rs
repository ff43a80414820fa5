//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Access |
//! |----------|------|--------|
//! | `POST`   | `/users/engineer/create` | open |
//! | `POST`   | `/users/project-manager/create` | open |
//! | `POST`   | `/users/admin/create` | open until an admin exists, then ADMIN |
//! | `POST`   | `/users/login` | open |
//! | `GET`    | `/users` | ADMIN, PROJECT_MANAGER; optional `?role=` |
//! | `GET`    | `/users/{id}` | ADMIN, PROJECT_MANAGER |
//! | `PUT`    | `/users/edit/{id}` | ADMIN |
//! | `DELETE` | `/users/{id}` | ADMIN; 409 while the user holds a slot |

use axum::{
  extract::State,
  http::{HeaderMap, StatusCode},
};
use crewboard_auth::{
  admit,
  password::{hash_password, verify_password},
};
use crewboard_core::{
  Error as CoreError,
  identity::IdentityClaim,
  role::Role,
  store::{UserDeletion, UserEdit, UserStore},
  user::{NewUser, User, UserId, UserUpdate},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState, Store,
  auth::{AdminOnly, Authorized, Managers, RoleRequirement, authorization},
  error::ApiError,
  extract::{Json, Path, Query},
};

const MISSING_FIELDS: &str = "Missing required fields";

/// Body returned by registration and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub token:   String,
  pub message: String,
  pub user:    User,
}

// ─── Registration ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterBody {
  pub first_name:   String,
  pub last_name:    String,
  pub email:        String,
  pub phone_number: String,
  pub kra_pin:      String,
  pub address:      String,
  pub password:     String,
}

impl RegisterBody {
  fn validate(&self) -> Result<(), ApiError> {
    let fields = [
      &self.first_name,
      &self.last_name,
      &self.email,
      &self.phone_number,
      &self.kra_pin,
      &self.address,
      &self.password,
    ];
    if fields.iter().any(|f| f.trim().is_empty()) {
      return Err(ApiError::BadRequest(MISSING_FIELDS.into()));
    }
    check_email(&self.email)
  }
}

fn check_email(email: &str) -> Result<(), ApiError> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
    _ => Err(ApiError::BadRequest(format!("invalid email address {email:?}"))),
  }
}

async fn register<S: Store>(
  state: &AppState<S>,
  body: RegisterBody,
  role: Role,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
  body.validate()?;

  let password_hash = hash_password(&body.password)?;
  let user = state
    .store
    .create_user(NewUser {
      first_name: body.first_name,
      last_name: body.last_name,
      email: body.email,
      phone_number: body.phone_number,
      kra_pin: body.kra_pin,
      address: body.address,
      password_hash,
      role,
    })
    .await
    .map_err(ApiError::store)?
    .map_err(CoreError::Duplicate)?;

  let token = state.codec.issue(&IdentityClaim::from(&user))?;
  tracing::info!(user_id = user.user_id, %role, "registered user");

  Ok((
    StatusCode::CREATED,
    Json(TokenResponse {
      token,
      message: format!("{} account created", role.as_str().to_lowercase().replace('_', " ")),
      user,
    }),
  ))
}

/// `POST /users/engineer/create`
pub async fn create_engineer<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
  register(&state, body, Role::Engineer).await
}

/// `POST /users/project-manager/create`
pub async fn create_project_manager<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
  register(&state, body, Role::ProjectManager).await
}

/// `POST /users/admin/create`
///
/// The first admin account can be created without credentials; after that
/// only an existing admin may create another.
pub async fn create_admin<S: Store>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
  let admins = state
    .store
    .list_users(Some(Role::Admin))
    .await
    .map_err(ApiError::store)?;

  if admins.is_empty() {
    tracing::warn!("no admin account exists; accepting unauthenticated admin registration");
  } else {
    admit(
      &state.codec,
      state.store.as_ref(),
      Some(AdminOnly::ROLES),
      authorization(&headers),
    )
    .await?;
  }

  register(&state, body, Role::Admin).await
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /users/login`
pub async fn login<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
  if body.email.trim().is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest(MISSING_FIELDS.into()));
  }

  let user = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .filter(|u| verify_password(&body.password, &u.password_hash))
    .ok_or_else(|| {
      tracing::debug!(email = %body.email, "login rejected");
      ApiError::InvalidLogin
    })?;

  let token = state.codec.issue(&IdentityClaim::from(&user))?;
  tracing::info!(user_id = user.user_id, "user logged in");

  Ok(Json(TokenResponse { token, message: "logged in".into(), user }))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /users[?role=<ROLE>]`
pub async fn list<S: Store>(
  _auth: Authorized<Managers>,
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = state
    .store
    .list_users(params.role)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `GET /users/{id}`
pub async fn get_one<S: Store>(
  _auth: Authorized<Managers>,
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::UserNotFound(id))?;
  Ok(Json(user))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// Every field is optional. There is no role field: roles are fixed at
/// registration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBody {
  pub first_name:   Option<String>,
  pub last_name:    Option<String>,
  pub email:        Option<String>,
  pub phone_number: Option<String>,
  pub kra_pin:      Option<String>,
  pub address:      Option<String>,
  pub password:     Option<String>,
}

/// `PUT /users/edit/{id}`
pub async fn update<S: Store>(
  auth: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<User>, ApiError> {
  let provided = [
    &body.first_name,
    &body.last_name,
    &body.email,
    &body.phone_number,
    &body.kra_pin,
    &body.address,
    &body.password,
  ];
  if provided.iter().any(|f| f.as_deref().is_some_and(|v| v.trim().is_empty())) {
    return Err(ApiError::BadRequest(MISSING_FIELDS.into()));
  }
  if let Some(email) = &body.email {
    check_email(email)?;
  }

  let update = UserUpdate {
    first_name:    body.first_name,
    last_name:     body.last_name,
    email:         body.email,
    phone_number:  body.phone_number,
    kra_pin:       body.kra_pin,
    address:       body.address,
    password_hash: body.password.as_deref().map(hash_password).transpose()?,
  };
  if update.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }

  let user = match state.store.update_user(id, update).await.map_err(ApiError::store)? {
    UserEdit::Edited(user) => user,
    UserEdit::NotFound => return Err(CoreError::UserNotFound(id).into()),
    UserEdit::Duplicate(field) => return Err(CoreError::Duplicate(field).into()),
  };

  tracing::info!(user_id = id, by = auth.principal.user.user_id, "updated user");
  Ok(Json(user))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/{id}`
pub async fn delete_one<S: Store>(
  auth: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
  match state.store.delete_user(id).await.map_err(ApiError::store)? {
    UserDeletion::Deleted => {
      tracing::info!(user_id = id, by = auth.principal.user.user_id, "deleted user");
      Ok(StatusCode::NO_CONTENT)
    }
    UserDeletion::NotFound => Err(CoreError::UserNotFound(id).into()),
    UserDeletion::StillAssigned => Err(ApiError::Conflict(format!(
      "user {id} still occupies a project slot"
    ))),
  }
}
