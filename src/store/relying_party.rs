// WebAuthn Vault — Relying Party Registry
//
// RPs are keyed by host name. The default RP id is injected when the registry
// is built instead of being read from a global.

use super::db::Database;
use super::engine::Bucket;
use super::models::{RelyingParty, User};
use super::StoreError;

/// Host identifier used when nothing else is configured.
pub const DEFAULT_RP_ID: &str = "localhost";

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait RelyingPartyRegistry {
    /// The RP configured as the primary host identity.
    fn get_default(&self) -> Result<RelyingParty, StoreError>;

    /// Exact-match lookup by host name (the RP id).
    fn get_by_host(&self, host: &str) -> Result<RelyingParty, StoreError>;

    /// Create or replace an RP.
    fn put(&self, rp: &RelyingParty) -> Result<(), StoreError>;

    /// Every RP in the store.
    fn list(&self) -> Result<Vec<RelyingParty>, StoreError>;

    /// Record `user_id` as associated with the RP. Idempotent.
    fn add_user(&self, rp_id: &str, user_id: i64) -> Result<RelyingParty, StoreError>;

    /// RPs whose user set references `user`.
    fn for_user(&self, user: &User) -> Result<Vec<RelyingParty>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteRelyingPartyRegistry<'a> {
    db: &'a Database,
    default_id: String,
}

impl<'a> SqliteRelyingPartyRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::with_default(db, DEFAULT_RP_ID)
    }

    pub fn with_default(db: &'a Database, default_id: impl Into<String>) -> Self {
        Self {
            db,
            default_id: default_id.into(),
        }
    }
}

impl<'a> RelyingPartyRegistry for SqliteRelyingPartyRegistry<'a> {
    fn get_default(&self) -> Result<RelyingParty, StoreError> {
        self.get_by_host(&self.default_id)
    }

    fn get_by_host(&self, host: &str) -> Result<RelyingParty, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<RelyingParty>::new(&conn).get_one("id", host.to_string())
    }

    fn put(&self, rp: &RelyingParty) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        Bucket::<RelyingParty>::new(&conn).save(&mut rp.clone())?;

        tracing::info!(rp_id = %rp.id, "Relying party saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<RelyingParty>, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<RelyingParty>::new(&conn).all()
    }

    fn add_user(&self, rp_id: &str, user_id: i64) -> Result<RelyingParty, StoreError> {
        self.db.immediate(|tx| {
            let rps = Bucket::<RelyingParty>::new(tx);
            let mut rp = rps.get_one("id", rp_id.to_string())?;
            if rp.users.insert(user_id) {
                rps.save(&mut rp)?;
                tracing::debug!(rp_id = %rp_id, user_id, "User associated with relying party");
            }
            Ok(rp)
        })
    }

    fn for_user(&self, user: &User) -> Result<Vec<RelyingParty>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|rp| rp.users.contains(&user.id))
            .collect())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
