//! [`SqliteStore`], the SQLite implementation of [`UserStore`] and
//! [`ProjectStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use crewboard_core::{
  project::{NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate},
  role::{Role, SlotKind},
  store::{ProjectQuery, ProjectStore, UserDeletion, UserEdit, UserStore},
  user::{NewUser, UniqueField, User, UserId, UserUpdate},
};

use crate::{
  encode::{
    encode_date, encode_dt, encode_role, encode_status, slot_column, unique_violation,
    RawProject, RawUser,
    PROJECT_COLUMNS, USER_COLUMNS,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Crewboard store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// operation runs as one closure on the connection thread, so the steps
/// inside a single call never interleave with another call.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Look up a single user by an exact match on a unique text column.
  async fn find_user_where(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![value], RawUser::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

fn select_project(
  conn: &rusqlite::Connection,
  id: ProjectId,
) -> rusqlite::Result<Option<RawProject>> {
  conn
    .query_row(
      &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
      rusqlite::params![id],
      RawProject::from_row,
    )
    .optional()
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = crate::Error;

  async fn create_user(&self, input: NewUser) -> Result<Result<User, UniqueField>> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let role_str   = encode_role(input.role).to_owned();

    let row = input.clone();
    let inserted: Result<UserId, UniqueField> = self
      .conn
      .call(move |conn| {
        let outcome = conn.execute(
          "INSERT INTO users (first_name, last_name, email, phone_number, kra_pin, \
           address, password_hash, role, created_at) \
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            row.first_name,
            row.last_name,
            row.email,
            row.phone_number,
            row.kra_pin,
            row.address,
            row.password_hash,
            role_str,
            at_str,
          ],
        );
        match outcome {
          Ok(_) => Ok(Ok(conn.last_insert_rowid())),
          Err(e) => match unique_violation(&e) {
            Some(field) => Ok(Err(field)),
            None => Err(e.into()),
          },
        }
      })
      .await?;

    let user_id = match inserted {
      Ok(id) => id,
      Err(field) => {
        tracing::debug!(?field, "user insert collided with an existing user");
        return Ok(Err(field));
      }
    };

    tracing::debug!(user_id, role = %input.role, "created user");

    Ok(Ok(User {
      user_id,
      first_name: input.first_name,
      last_name: input.last_name,
      email: input.email,
      phone_number: input.phone_number,
      kra_pin: input.kra_pin,
      address: input.address,
      password_hash: input.password_hash,
      role: Some(input.role),
      created_at,
    }))
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.find_user_where("email", email.to_owned()).await
  }

  async fn find_user_by_kra_pin(&self, kra_pin: &str) -> Result<Option<User>> {
    self.find_user_where("kra_pin", kra_pin.to_owned()).await
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    let role_str = role.map(encode_role).map(str::to_owned);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users \
           WHERE (?1 IS NULL OR role = ?1) ORDER BY user_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<UserEdit> {
    let written: Result<Option<RawUser>, UniqueField> = self
      .conn
      .call(move |conn| {
        // Role is not among the columns; it cannot be changed here.
        let outcome = conn.execute(
          "UPDATE users SET \
             first_name    = COALESCE(?2, first_name), \
             last_name     = COALESCE(?3, last_name), \
             email         = COALESCE(?4, email), \
             phone_number  = COALESCE(?5, phone_number), \
             kra_pin       = COALESCE(?6, kra_pin), \
             address       = COALESCE(?7, address), \
             password_hash = COALESCE(?8, password_hash) \
           WHERE user_id = ?1",
          rusqlite::params![
            id,
            update.first_name,
            update.last_name,
            update.email,
            update.phone_number,
            update.kra_pin,
            update.address,
            update.password_hash,
          ],
        );
        let changed = match outcome {
          Ok(n) => n,
          Err(e) => {
            return match unique_violation(&e) {
              Some(field) => Ok(Err(field)),
              None => Err(e.into()),
            };
          }
        };
        if changed == 0 {
          return Ok(Ok(None));
        }
        Ok(Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id],
            RawUser::from_row,
          )
          .optional()?))
      })
      .await?;

    Ok(match written {
      Err(field) => UserEdit::Duplicate(field),
      Ok(None) => UserEdit::NotFound,
      Ok(Some(raw)) => UserEdit::Edited(raw.into_user()?),
    })
  }

  async fn delete_user(&self, id: UserId) -> Result<UserDeletion> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row("SELECT 1 FROM users WHERE user_id = ?1", rusqlite::params![id], |_| Ok(()))
          .optional()?
          .is_some();
        if !exists {
          return Ok(UserDeletion::NotFound);
        }

        let assigned = tx
          .query_row(
            "SELECT 1 FROM projects \
             WHERE engineer_id = ?1 OR project_manager_id = ?1 LIMIT 1",
            rusqlite::params![id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if assigned {
          return Ok(UserDeletion::StillAssigned);
        }

        tx.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(UserDeletion::Deleted)
      })
      .await?;

    Ok(outcome)
  }
}

// ─── ProjectStore impl ───────────────────────────────────────────────────────

impl ProjectStore for SqliteStore {
  type Error = crate::Error;

  async fn create_project(&self, input: NewProject) -> Result<Project> {
    let created_at = Utc::now();
    let status     = ProjectStatus::default();

    let name        = input.name.clone();
    let description = input.description.clone();
    let start_str   = encode_date(input.start_date);
    let end_str     = encode_date(input.end_date);
    let status_str  = encode_status(status).to_owned();
    let at_str      = encode_dt(created_at);

    let project_id: ProjectId = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (name, description, start_date, end_date, status, created_at) \
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![name, description, start_str, end_str, status_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Project {
      project_id,
      name: input.name,
      description: input.description,
      start_date: input.start_date,
      end_date: input.end_date,
      status,
      engineer_id: None,
      project_manager_id: None,
      created_at,
    })
  }

  async fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_project(conn, id)?))
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>> {
    let assigned_to = query.assigned_to;
    let status_str  = query.status.map(encode_status).map(str::to_owned);

    let raws: Vec<RawProject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS} FROM projects \
           WHERE (?1 IS NULL OR engineer_id = ?1 OR project_manager_id = ?1) \
             AND (?2 IS NULL OR status = ?2) \
           ORDER BY project_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![assigned_to, status_str], RawProject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn update_project(&self, id: ProjectId, update: ProjectUpdate) -> Result<Option<Project>> {
    let start_str  = update.start_date.map(encode_date);
    let end_str    = update.end_date.map(encode_date);
    let status_str = update.status.map(encode_status).map(str::to_owned);

    let raw = self
      .conn
      .call(move |conn| {
        // Slot columns are written only by `fill_slot`.
        let changed = conn.execute(
          "UPDATE projects SET \
             name        = COALESCE(?2, name), \
             description = COALESCE(?3, description), \
             start_date  = COALESCE(?4, start_date), \
             end_date    = COALESCE(?5, end_date), \
             status      = COALESCE(?6, status) \
           WHERE project_id = ?1",
          rusqlite::params![id, update.name, update.description, start_str, end_str, status_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_project(conn, id)?)
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn fill_slot(
    &self,
    id: ProjectId,
    slot: SlotKind,
    user_id: UserId,
  ) -> Result<Option<Project>> {
    let column = slot_column(slot);

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          &format!(
            "UPDATE projects SET {column} = ?1 \
             WHERE project_id = ?2 AND {column} IS NULL \
               AND EXISTS (SELECT 1 FROM users WHERE user_id = ?1)"
          ),
          rusqlite::params![user_id, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_project(conn, id)?)
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn delete_project(&self, id: ProjectId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM projects WHERE project_id = ?1", rusqlite::params![id])?)
      })
      .await?;

    Ok(deleted > 0)
  }
}
