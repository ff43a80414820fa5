//! SQL schema for the Crewboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name     TEXT NOT NULL,
    last_name      TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,
    phone_number   TEXT NOT NULL,
    kra_pin        TEXT NOT NULL UNIQUE,
    address        TEXT NOT NULL,
    password_hash  TEXT NOT NULL,
    role           TEXT,            -- 'ADMIN' | 'PROJECT_MANAGER' | 'ENGINEER' | NULL (legacy)
    created_at     TEXT NOT NULL
);

-- engineer_id and project_manager_id are written only by the conditional
-- slot update (`... WHERE <slot> IS NULL`); generic updates never touch them.
-- A user holding a slot cannot be deleted (no ON DELETE action).
CREATE TABLE IF NOT EXISTS projects (
    project_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL,
    description         TEXT NOT NULL,
    start_date          TEXT NOT NULL,   -- YYYY-MM-DD
    end_date            TEXT NOT NULL,   -- YYYY-MM-DD
    status              TEXT NOT NULL DEFAULT 'PENDING',
    engineer_id         INTEGER REFERENCES users(user_id),
    project_manager_id  INTEGER REFERENCES users(user_id),
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS projects_engineer_idx ON projects(engineer_id);
CREATE INDEX IF NOT EXISTS projects_manager_idx  ON projects(project_manager_id);

PRAGMA user_version = 1;
";
