// WebAuthn Vault — Session Store
//
// Issues ceremony challenges and keeps the matching session records. Sessions
// live until something removes them; `with_ttl`, `consume` and
// `purge_older_than` are opt-in hardening on top of that.

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::TryRngCore;

use super::db::Database;
use super::engine::{eq, Bucket, Order};
use super::models::{RelyingParty, SessionData, SessionType, User};
use super::StoreError;

/// Challenge length used by `create_session` unless overridden.
pub const DEFAULT_CHALLENGE_LEN: usize = 16;

/// Read `len` bytes from the operating system's CSPRNG. There is no fallback
/// source: if the OS read fails, so does this.
pub fn create_challenge(len: usize) -> Result<Vec<u8>, StoreError> {
    let mut challenge = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut challenge)
        .map_err(|e| StoreError::Entropy(e.to_string()))?;
    Ok(challenge)
}

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait SessionStore {
    /// Open a new ceremony session. `session_type` must be `reg` or `att`;
    /// anything else fails with `InvalidSessionType` before any write.
    fn create_session(
        &self,
        user: &User,
        rp: &RelyingParty,
        session_type: &str,
    ) -> Result<SessionData, StoreError>;

    /// Most recently created session for the pair.
    fn get_latest_for_user_and_rp(
        &self,
        user_id: i64,
        rp_id: &str,
    ) -> Result<SessionData, StoreError>;

    fn get_by_id(&self, id: i64) -> Result<SessionData, StoreError>;

    /// Fetch and delete a session in one step, so a challenge answers at most once.
    fn consume(&self, id: i64) -> Result<SessionData, StoreError>;

    /// Delete every session older than `ttl`. Returns how many were removed.
    fn purge_older_than(&self, ttl: Duration) -> Result<usize, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteSessionStore<'a> {
    db: &'a Database,
    challenge_len: usize,
    ttl: Option<Duration>,
}

impl<'a> SqliteSessionStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            challenge_len: DEFAULT_CHALLENGE_LEN,
            ttl: None,
        }
    }

    /// Override the challenge length. Zero would issue empty challenges, so
    /// it keeps the current length instead.
    pub fn with_challenge_len(mut self, len: usize) -> Self {
        if len > 0 {
            self.challenge_len = len;
        }
        self
    }

    /// Treat sessions older than `ttl` as expired on lookup.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn check_fresh(&self, session: SessionData) -> Result<SessionData, StoreError> {
        // A deadline past the representable range never arrives.
        let deadline = self.ttl.and_then(|ttl| session.created_at.checked_add_signed(ttl));
        match deadline {
            Some(deadline) if Utc::now() > deadline => Err(StoreError::SessionExpired(session.id)),
            _ => Ok(session),
        }
    }
}

impl<'a> SessionStore for SqliteSessionStore<'a> {
    fn create_session(
        &self,
        user: &User,
        rp: &RelyingParty,
        session_type: &str,
    ) -> Result<SessionData, StoreError> {
        let session_type: SessionType = session_type.parse()?;
        let challenge = create_challenge(self.challenge_len)?;

        let mut session = SessionData {
            id: 0,
            challenge,
            origin: rp.id.clone(),
            session_type,
            user_id: user.id,
            relying_party_id: rp.id.clone(),
            created_at: Utc::now(),
        };

        let conn = self.db.conn()?;
        Bucket::<SessionData>::new(&conn).save(&mut session)?;

        tracing::info!(
            session_id = session.id,
            user_id = user.id,
            rp_id = %rp.id,
            session_type = %session_type,
            "Session created"
        );

        Ok(session)
    }

    fn get_latest_for_user_and_rp(
        &self,
        user_id: i64,
        rp_id: &str,
    ) -> Result<SessionData, StoreError> {
        let session = {
            let conn = self.db.conn()?;
            Bucket::<SessionData>::new(&conn).first(
                &[eq("user_id", user_id), eq("relying_party_id", rp_id.to_string())],
                Order::Reverse,
            )?
        };
        self.check_fresh(session)
    }

    fn get_by_id(&self, id: i64) -> Result<SessionData, StoreError> {
        let session = {
            let conn = self.db.conn()?;
            Bucket::<SessionData>::new(&conn).get_one("id", id)?
        };
        self.check_fresh(session)
    }

    fn consume(&self, id: i64) -> Result<SessionData, StoreError> {
        let session = self.db.immediate(|tx| {
            let sessions = Bucket::<SessionData>::new(tx);
            let session = sessions.get_one("id", id)?;
            sessions.delete_by_key(&session)?;
            Ok(session)
        })?;

        tracing::debug!(session_id = id, "Session consumed");
        self.check_fresh(session)
    }

    fn purge_older_than(&self, ttl: Duration) -> Result<usize, StoreError> {
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return Ok(0);
        };

        let removed = self.db.immediate(|tx| {
            let sessions = Bucket::<SessionData>::new(tx);
            let mut removed = 0;
            for session in sessions.all()? {
                if session.created_at < cutoff && sessions.delete_by_key(&session)? {
                    removed += 1;
                }
            }
            Ok(removed)
        })?;

        if removed > 0 {
            tracing::info!(removed, "Stale sessions purged");
        }
        Ok(removed)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
