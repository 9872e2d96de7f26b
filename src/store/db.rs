// WebAuthn Vault — SQLite Database Management
//
// Opens and initializes the embedded store. Every collection is a table of
// JSON record bodies keyed by `id`; secondary lookups go through
// `json_extract`, and the uniqueness invariants live in expression indexes.
// When a key is supplied (sqlcipher builds only) it is set via PRAGMA before
// any table is touched.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::StoreError;

/// How long a writer waits on a locked database file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to the embedded store. The connection sits behind a mutex so one
/// handle can be shared by reference between request threads.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at the given path.
    /// `hex_key`, when present, must be the hex-encoded 32-byte SQLCipher key.
    pub fn open(path: &Path, hex_key: Option<&str>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        if let Some(key) = hex_key {
            apply_key(&conn, key)?;
        }

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open an in-memory database (unencrypted, for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Lock and borrow the underlying connection for the duration of one call.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction. The write lock is taken
    /// up front, so a read-then-write sequence inside `f` cannot interleave
    /// with another writer. Commits on `Ok`, rolls back on `Err`.
    pub fn immediate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run schema migrations to create or update tables.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS rps (
                id      TEXT PRIMARY KEY,
                body    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                body    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS credentials (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                body    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                body    TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_users_name
                ON users(json_extract(body, '$.name'));

            CREATE UNIQUE INDEX IF NOT EXISTS idx_credentials_credential_id
                ON credentials(json_extract(body, '$.credential_id'));

            CREATE INDEX IF NOT EXISTS idx_credentials_user_rp
                ON credentials(json_extract(body, '$.user_id'),
                               json_extract(body, '$.relying_party_id'));

            CREATE INDEX IF NOT EXISTS idx_sessions_user_rp
                ON sessions(json_extract(body, '$.user_id'),
                            json_extract(body, '$.relying_party_id'));
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

#[cfg(feature = "sqlcipher")]
fn apply_key(conn: &Connection, hex_key: &str) -> Result<(), StoreError> {
    conn.pragma_update(None, "key", format!("x'{}'", hex_key))?;

    // A wrong key only shows up once the schema is read.
    conn.execute_batch("SELECT count(*) FROM sqlite_master;")
        .map_err(|_| StoreError::InvalidKey)
}

#[cfg(not(feature = "sqlcipher"))]
fn apply_key(_conn: &Connection, _hex_key: &str) -> Result<(), StoreError> {
    Err(StoreError::Unsupported(
        "a database key was configured but this build has no sqlcipher support".to_string(),
    ))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(db: &Database, name: &str) -> bool {
        let count: i64 = db
            .conn()
            .unwrap()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_open_in_memory_succeeds() {
        let db = Database::open_in_memory();
        assert!(db.is_ok(), "Should be able to open an in-memory database");
    }

    #[test]
    fn test_schema_migration_creates_collections() {
        let db = Database::open_in_memory().unwrap();
        for name in ["rps", "users", "credentials", "sessions"] {
            assert!(table_exists(&db, name), "{} table should exist", name);
        }
    }

    #[test]
    fn test_schema_migration_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(
            db.run_migrations().is_ok(),
            "Migrations should be idempotent"
        );
    }

    #[test]
    fn test_immediate_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<(), StoreError> = db.immediate(|tx| {
            tx.execute("INSERT INTO rps (id, body) VALUES ('a', '{}')", [])?;
            Err(StoreError::NotFound("forced".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT count(*) FROM rps", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "Failed transaction must not leave rows behind");
    }

    #[test]
    fn test_open_on_disk_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webauthn.db");

        let _db = Database::open(&path, None).unwrap();
        assert!(path.exists());
    }

    #[cfg(not(feature = "sqlcipher"))]
    #[test]
    fn test_key_without_sqlcipher_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyed.db");

        let result = Database::open(&path, Some("00"));
        assert!(matches!(result, Err(StoreError::Unsupported(_))));
    }

    #[cfg(feature = "sqlcipher")]
    #[test]
    fn test_encrypted_db_wrong_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyed.db");
        let correct = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        let wrong = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

        {
            let _db = Database::open(&path, Some(correct)).unwrap();
        }

        assert!(matches!(
            Database::open(&path, Some(wrong)),
            Err(StoreError::InvalidKey)
        ));
    }
}
