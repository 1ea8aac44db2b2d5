use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::models::User;
use crate::store::{NewUser, StoreError, UserRepository};

/// SQLite-backed user store.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Create parent directories if needed
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(db_error)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                credential_marker TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(db_error)?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// List all users, newest first.
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, email, username, display_name, credential_marker, is_active, created_at
                 FROM users ORDER BY created_at DESC",
            )
            .map_err(db_error)?;

        let users = stmt
            .query_map([], row_to_user)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;

        Ok(users)
    }

    /// Flip the active flag. Returns false if no such user exists.
    pub fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<bool, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Database(e.to_string()))?;

        let changed = conn
            .execute(
                "UPDATE users SET is_active = ?1 WHERE id = ?2",
                params![is_active as i32, id.to_string()],
            )
            .map_err(db_error)?;

        Ok(changed > 0)
    }
}

impl UserRepository for SqliteUserStore {
    fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Database(e.to_string()))?;

        conn.query_row(
            "SELECT id, email, username, display_name, credential_marker, is_active, created_at
             FROM users WHERE id = ?1",
            params![id.to_string()],
            row_to_user,
        )
        .map(Some)
        .or_else(not_found_as_none)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Database(e.to_string()))?;

        conn.query_row(
            "SELECT id, email, username, display_name, credential_marker, is_active, created_at
             FROM users WHERE email = ?1",
            params![email],
            row_to_user,
        )
        .map(Some)
        .or_else(not_found_as_none)
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let conn = self.conn.lock().map_err(|e| StoreError::Database(e.to_string()))?;

        let now = Utc::now();
        conn.execute(
            "INSERT INTO users (id, email, username, display_name, credential_marker, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                new_user.id.to_string(),
                new_user.email,
                new_user.username,
                new_user.display_name,
                new_user.credential_marker,
                now.to_rfc3339(),
            ],
        )
        .map_err(db_error)?;

        tracing::info!("Created new user: {} ({})", new_user.id, new_user.email);

        Ok(User {
            id: new_user.id,
            email: new_user.email,
            username: new_user.username,
            display_name: new_user.display_name,
            credential_marker: new_user.credential_marker,
            is_active: true,
            created_at: now,
        })
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: String = row.get(6)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(User {
        id,
        email: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        credential_marker: row.get(4)?,
        is_active: row.get::<_, i32>(5)? != 0,
        created_at,
    })
}

fn db_error(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(e.to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

fn not_found_as_none(e: rusqlite::Error) -> Result<Option<User>, StoreError> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(db_error(other)),
    }
}
