// WebAuthn Vault — User Registry
//
// Lookups by id or name both answer `NotFound` for a missing user; a blank
// `User` is never handed back as a success.

use super::db::Database;
use super::engine::Bucket;
use super::models::User;
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait UserRegistry {
    fn get_by_id(&self, id: i64) -> Result<User, StoreError>;

    fn get_by_username(&self, name: &str) -> Result<User, StoreError>;

    /// Create or update a user. A user with `id == 0` is assigned a fresh id,
    /// which is returned. Fails with `UsernameTaken` if another user already
    /// holds the name.
    fn put(&self, user: &mut User) -> Result<i64, StoreError>;

    fn list(&self) -> Result<Vec<User>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteUserRegistry<'a> {
    db: &'a Database,
}

impl<'a> SqliteUserRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

impl<'a> UserRegistry for SqliteUserRegistry<'a> {
    fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<User>::new(&conn).get_one("id", id)
    }

    fn get_by_username(&self, name: &str) -> Result<User, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<User>::new(&conn).get_one("name", name.to_string())
    }

    fn put(&self, user: &mut User) -> Result<i64, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<User>::new(&conn)
            .save(user)
            .map_err(|e| match e {
                StoreError::AlreadyExists(_) => StoreError::UsernameTaken(user.name.clone()),
                other => other,
            })?;

        tracing::info!(user_id = user.id, name = %user.name, "User saved");
        Ok(user.id)
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<User>::new(&conn).all()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
