//! Handlers for `/projects` endpoints.
//!
//! | Method   | Path | Access |
//! |----------|------|--------|
//! | `POST`   | `/projects/create` | ADMIN |
//! | `GET`    | `/projects` | ADMIN; optional `?status=` |
//! | `PUT`    | `/projects/{id}` | ADMIN, PROJECT_MANAGER; non-slot fields only |
//! | `DELETE` | `/projects/{id}` | ADMIN |
//! | `PUT`    | `/projects/assign/{project_id}/{user_id}/{slot}` | ADMIN |
//! | `GET`    | `/projects/assigned/{user_id}` | any role |
//! | `GET`    | `/projects/assigned/{user_id}/{project_id}` | any role |

use axum::{extract::State, http::StatusCode};
use chrono::NaiveDate;
use crewboard_core::{
  Error as CoreError,
  assign,
  project::{Assignment, NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate},
  role::SlotKind,
  store::{ProjectQuery, ProjectStore},
  user::UserId,
};
use serde::Deserialize;

use crate::{
  AppState, Store,
  auth::{AdminOnly, AnyRole, Authorized, Managers},
  error::ApiError,
  extract::{Json, Path, Query},
};

fn check_dates(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
  if end < start {
    return Err(ApiError::BadRequest(format!(
      "end date {end} is before start date {start}"
    )));
  }
  Ok(())
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBody {
  pub name:        String,
  pub description: String,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
}

/// `POST /projects/create`. Both slots start empty.
pub async fn create<S: Store>(
  auth: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
  let (Some(start_date), Some(end_date)) = (body.start_date, body.end_date) else {
    return Err(ApiError::BadRequest("Missing required fields".into()));
  };
  if body.name.trim().is_empty() || body.description.trim().is_empty() {
    return Err(ApiError::BadRequest("Missing required fields".into()));
  }
  check_dates(start_date, end_date)?;

  let project = state
    .store
    .create_project(NewProject {
      name: body.name,
      description: body.description,
      start_date,
      end_date,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    project_id = project.project_id,
    by = auth.principal.user.user_id,
    "created project"
  );
  Ok((StatusCode::CREATED, Json(project)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ProjectStatus>,
}

/// `GET /projects[?status=<STATUS>]`
pub async fn list<S: Store>(
  _auth: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Project>>, ApiError> {
  let query = ProjectQuery { status: params.status, ..Default::default() };
  let projects = state
    .store
    .list_projects(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(projects))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// Slot fields are not accepted here; `engineerId` or `projectManagerId` in
/// the body are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBody {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
  pub status:      Option<ProjectStatus>,
}

/// `PUT /projects/{id}`
pub async fn update<S: Store>(
  auth: Authorized<Managers>,
  State(state): State<AppState<S>>,
  Path(id): Path<ProjectId>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Project>, ApiError> {
  let blank = |f: &Option<String>| f.as_deref().is_some_and(|v| v.trim().is_empty());
  if blank(&body.name) || blank(&body.description) {
    return Err(ApiError::BadRequest("Missing required fields".into()));
  }

  let current = state
    .store
    .get_project(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::ProjectNotFound(id))?;
  check_dates(
    body.start_date.unwrap_or(current.start_date),
    body.end_date.unwrap_or(current.end_date),
  )?;

  let project = state
    .store
    .update_project(id, ProjectUpdate {
      name:        body.name,
      description: body.description,
      start_date:  body.start_date,
      end_date:    body.end_date,
      status:      body.status,
    })
    .await
    .map_err(ApiError::store)?
    .ok_or(CoreError::ProjectNotFound(id))?;

  tracing::info!(project_id = id, by = auth.principal.user.user_id, "updated project");
  Ok(Json(project))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /projects/{id}`
pub async fn delete_one<S: Store>(
  _auth: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Path(id): Path<ProjectId>,
) -> Result<StatusCode, ApiError> {
  assign::delete_project(state.store.as_ref(), id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Assignment ───────────────────────────────────────────────────────────────

/// `PUT /projects/assign/{project_id}/{user_id}/{slot}`
pub async fn assign_slot<S: Store>(
  auth: Authorized<AdminOnly>,
  State(state): State<AppState<S>>,
  Path((project_id, user_id, slot)): Path<(ProjectId, UserId, String)>,
) -> Result<Json<Assignment>, ApiError> {
  let slot: SlotKind = slot.parse()?;
  let assignment = assign::assign(state.store.as_ref(), project_id, user_id, slot).await?;

  tracing::debug!(by = auth.principal.user.user_id, project_id, user_id, %slot, "slot assigned via api");
  Ok(Json(assignment))
}

/// `GET /projects/assigned/{user_id}`. An empty list is a valid answer.
pub async fn assigned<S: Store>(
  _auth: Authorized<AnyRole>,
  State(state): State<AppState<S>>,
  Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Project>>, ApiError> {
  let projects = assign::assigned_projects(state.store.as_ref(), user_id).await?;
  Ok(Json(projects))
}

/// `GET /projects/assigned/{user_id}/{project_id}`
pub async fn assigned_one<S: Store>(
  _auth: Authorized<AnyRole>,
  State(state): State<AppState<S>>,
  Path((user_id, project_id)): Path<(UserId, ProjectId)>,
) -> Result<Json<Project>, ApiError> {
  let project = assign::assigned_project(state.store.as_ref(), user_id, project_id).await?;
  Ok(Json(project))
}
