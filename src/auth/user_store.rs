//! Credential Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{generate_confirmation_key, User};
use anyhow::{Context, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_confirmed, confirmation_key, created_at";

/// Registration failure surfaced to the boundary layer
#[derive(Debug)]
pub enum CreateUserError {
    DuplicateUsername,
    DuplicateEmail,
    Storage(anyhow::Error),
}

impl std::fmt::Display for CreateUserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateUserError::DuplicateUsername => write!(f, "Username already exists"),
            CreateUserError::DuplicateEmail => write!(f, "Email already exists"),
            CreateUserError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for CreateUserError {}

/// Credential store with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new credential store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        // Bound blocking on a contended database file
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_confirmed INTEGER NOT NULL DEFAULT 0,
                confirmation_key TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let id: String = row.get(0)?;
        Ok(User {
            id: Uuid::parse_str(&id).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            is_confirmed: row.get::<_, i64>(4)? != 0,
            confirmation_key: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Create a new, unconfirmed user with a fresh confirmation key
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<User, CreateUserError> {
        let password_hash = hash(password, DEFAULT_COST)
            .context("Failed to hash password")
            .map_err(CreateUserError::Storage)?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_confirmed: false,
            confirmation_key: generate_confirmation_key(),
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open().map_err(CreateUserError::Storage)?;
        let inserted = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, is_confirmed, confirmation_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.is_confirmed as i64,
                user.confirmation_key,
                user.created_at,
            ],
        );

        match inserted {
            Ok(_) => {
                info!("Created user: {} ({})", user.username, user.id);
                Ok(user)
            }
            Err(e) => Err(Self::map_unique_violation(e)),
        }
    }

    fn map_unique_violation(e: rusqlite::Error) -> CreateUserError {
        if let rusqlite::Error::SqliteFailure(err, Some(msg)) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                if msg.contains("users.username") {
                    return CreateUserError::DuplicateUsername;
                }
                if msg.contains("users.email") {
                    return CreateUserError::DuplicateEmail;
                }
            }
        }
        CreateUserError::Storage(e.into())
    }

    /// Get user by username
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("username = ?1", params![username])
    }

    /// Get user by id
    pub fn find_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        self.find_one("id = ?1", params![id.to_string()])
    }

    /// Get user by outstanding confirmation key
    pub fn find_by_confirmation_key(&self, key: &str) -> Result<Option<User>> {
        if key.is_empty() {
            return Ok(None);
        }
        self.find_one("confirmation_key = ?1", params![key])
    }

    fn find_one(&self, predicate: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Option<User>> {
        let conn = self.open()?;
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, predicate);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(args, Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically consume a confirmation key: clear it and mark the user
    /// confirmed in a single conditional UPDATE. Returns `None` once the
    /// key has already been used (or never existed), so two concurrent
    /// confirmations cannot both succeed.
    pub fn confirm(&self, key: &str) -> Result<Option<User>> {
        if key.is_empty() {
            return Ok(None);
        }

        let conn = self.open()?;
        let sql = format!(
            "UPDATE users SET is_confirmed = 1, confirmation_key = ''
             WHERE confirmation_key = ?1 AND confirmation_key <> ''
             RETURNING {}",
            USER_COLUMNS
        );

        match conn.query_row(&sql, params![key], Self::row_to_user) {
            Ok(user) => {
                info!("Confirmed user: {} ({})", user.username, user.id);
                Ok(Some(user))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Change a user's email address: resets the confirmation state and
    /// returns the fresh confirmation key the caller should deliver.
    pub fn reset_confirmation(&self, user_id: &Uuid, new_email: &str) -> Result<String> {
        let key = generate_confirmation_key();

        let conn = self.open()?;
        let updated = conn.execute(
            "UPDATE users SET email = ?1, is_confirmed = 0, confirmation_key = ?2 WHERE id = ?3",
            params![new_email, key, user_id.to_string()],
        )?;

        if updated == 0 {
            anyhow::bail!("User not found");
        }

        info!("Reset confirmation for user {}", user_id);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_created_user_is_unconfirmed_with_key() {
        let (store, _temp) = create_test_store();

        let user = store.create_user("abc", "abc@abc.com", "abcabcabc").unwrap();
        assert!(!user.is_confirmed);
        assert!(!user.confirmation_key.is_empty());
        assert_ne!(user.password_hash, "abcabcabc");

        let found = store.find_by_username("abc").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "abc@abc.com");
    }

    #[test]
    fn test_duplicate_username_and_email_rejected() {
        let (store, _temp) = create_test_store();
        store.create_user("abc", "abc@abc.com", "pass").unwrap();

        let dup_name = store.create_user("abc", "other@abc.com", "pass");
        assert!(matches!(dup_name, Err(CreateUserError::DuplicateUsername)));

        let dup_mail = store.create_user("other", "abc@abc.com", "pass");
        assert!(matches!(dup_mail, Err(CreateUserError::DuplicateEmail)));
    }

    #[test]
    fn test_find_by_id_and_confirmation_key() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("abc", "abc@abc.com", "pass").unwrap();

        let by_id = store.find_by_id(&user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "abc");

        let by_key = store
            .find_by_confirmation_key(&user.confirmation_key)
            .unwrap()
            .unwrap();
        assert_eq!(by_key.id, user.id);

        assert!(store.find_by_confirmation_key("missing").unwrap().is_none());
        // Empty key must never match a confirmed user's cleared key
        assert!(store.find_by_confirmation_key("").unwrap().is_none());
    }

    #[test]
    fn test_confirm_is_single_use() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("abc", "abc@abc.com", "pass").unwrap();
        let key = user.confirmation_key.clone();

        let confirmed = store.confirm(&key).unwrap().unwrap();
        assert!(confirmed.is_confirmed);
        assert!(confirmed.confirmation_key.is_empty());

        // The key is a single-use capability
        assert!(store.confirm(&key).unwrap().is_none());
        assert!(store.confirm("").unwrap().is_none());
    }

    #[test]
    fn test_reset_confirmation_regenerates_key() {
        let (store, _temp) = create_test_store();
        let user = store.create_user("abc", "abc@abc.com", "pass").unwrap();
        store.confirm(&user.confirmation_key).unwrap().unwrap();

        let new_key = store
            .reset_confirmation(&user.id, "new@abc.com")
            .unwrap();
        assert!(!new_key.is_empty());
        assert_ne!(new_key, user.confirmation_key);

        let reloaded = store.find_by_id(&user.id).unwrap().unwrap();
        assert_eq!(reloaded.email, "new@abc.com");
        assert!(!reloaded.is_confirmed);
        assert_eq!(reloaded.confirmation_key, new_key);
    }

    #[test]
    fn test_reset_confirmation_unknown_user_fails() {
        let (store, _temp) = create_test_store();
        assert!(store
            .reset_confirmation(&Uuid::new_v4(), "x@x.com")
            .is_err());
    }
}
