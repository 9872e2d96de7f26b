// WebAuthn Vault — Credential Store
//
// One credential per (user, relying party). `create` runs its existence check
// and its insert in the same IMMEDIATE transaction, so two concurrent
// registrations for the same pair cannot both pass the check.
// `delete_by_id` performs no ownership check; callers authorize first.

use rusqlite::Connection;

use super::db::Database;
use super::engine::{eq, Bucket, Order};
use super::models::{Credential, PublicKey, RelyingParty, ResolvedCredential, User};
use super::StoreError;
use crate::codec;

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait CredentialStore {
    /// Persist a new credential. Fails with `AlreadyExists` (and writes
    /// nothing) if the user already has one for this RP. Any id already on
    /// `cred` is ignored; a fresh row is always inserted. Returns the new id.
    fn create(&self, cred: &mut Credential) -> Result<i64, StoreError>;

    /// Unconditional upsert, used to advance the signature counter.
    fn update(&self, cred: &Credential) -> Result<(), StoreError>;

    /// First credential of `user` for `rp`, joined with both.
    fn get_for_user_and_relying_party(
        &self,
        user: &User,
        rp: &RelyingParty,
    ) -> Result<ResolvedCredential, StoreError>;

    fn get_all_for_user_and_relying_party(
        &self,
        user: &User,
        rp: &RelyingParty,
    ) -> Result<Vec<Credential>, StoreError>;

    fn get_all_for_user(&self, user: &User) -> Result<Vec<Credential>, StoreError>;

    /// Lookup by (user, authenticator credential id).
    fn get_for_user(&self, user: &User, credential_id: &str) -> Result<Credential, StoreError>;

    /// Delete the credential with this authenticator credential id.
    /// No ownership check is made here.
    fn delete_by_id(&self, credential_id: &str) -> Result<(), StoreError>;

    /// The raw stored key material.
    fn unformatted_public_key(&self, cred: &Credential) -> PublicKey {
        cred.public_key.clone()
    }

    /// The stored key decoded into a P-256 point for signature verification.
    fn public_key_for(&self, cred: &Credential) -> Result<p256::PublicKey, StoreError> {
        Ok(codec::format_public_key(&cred.public_key)?)
    }
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteCredentialStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteCredentialStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn first_for_pair(
        conn: &Connection,
        user_id: i64,
        rp_id: &str,
    ) -> Result<Credential, StoreError> {
        Bucket::<Credential>::new(conn).first(
            &[eq("user_id", user_id), eq("relying_party_id", rp_id.to_string())],
            Order::Ascending,
        )
    }
}

impl<'a> CredentialStore for SqliteCredentialStore<'a> {
    fn create(&self, cred: &mut Credential) -> Result<i64, StoreError> {
        self.db.immediate(|tx| {
            match Self::first_for_pair(tx, cred.user_id, &cred.relying_party_id) {
                Ok(existing) => {
                    tracing::warn!(
                        user_id = cred.user_id,
                        rp_id = %cred.relying_party_id,
                        existing = %existing.credential_id,
                        "Credential already registered for user and relying party"
                    );
                    return Err(StoreError::AlreadyExists(format!(
                        "credential for user {} at {}",
                        cred.user_id, cred.relying_party_id
                    )));
                }
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }

            cred.id = 0;
            cred.public_key.credential = 0;
            Bucket::<Credential>::new(tx).save(cred)
        })?;

        tracing::info!(
            credential_id = %cred.credential_id,
            user_id = cred.user_id,
            rp_id = %cred.relying_party_id,
            "Credential stored successfully"
        );

        Ok(cred.id)
    }

    fn update(&self, cred: &Credential) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        Bucket::<Credential>::new(&conn).save(&mut cred.clone())?;

        tracing::debug!(credential_id = %cred.credential_id, "Credential updated");
        Ok(())
    }

    fn get_for_user_and_relying_party(
        &self,
        user: &User,
        rp: &RelyingParty,
    ) -> Result<ResolvedCredential, StoreError> {
        let conn = self.db.conn()?;
        let credential = Self::first_for_pair(&conn, user.id, &rp.id)?;

        Ok(ResolvedCredential {
            credential,
            user: user.clone(),
            relying_party: rp.clone(),
        })
    }

    fn get_all_for_user_and_relying_party(
        &self,
        user: &User,
        rp: &RelyingParty,
    ) -> Result<Vec<Credential>, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<Credential>::new(&conn).select(
            &[eq("user_id", user.id), eq("relying_party_id", rp.id.clone())],
            Order::Ascending,
        )
    }

    fn get_all_for_user(&self, user: &User) -> Result<Vec<Credential>, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<Credential>::new(&conn).find("user_id", user.id)
    }

    fn get_for_user(&self, user: &User, credential_id: &str) -> Result<Credential, StoreError> {
        let conn = self.db.conn()?;
        Bucket::<Credential>::new(&conn).first(
            &[eq("user_id", user.id), eq("credential_id", credential_id.to_string())],
            Order::Ascending,
        )
    }

    fn delete_by_id(&self, credential_id: &str) -> Result<(), StoreError> {
        self.db.immediate(|tx| {
            let creds = Bucket::<Credential>::new(tx);
            let cred = creds.get_one("credential_id", credential_id.to_string())?;
            creds.delete_by_key(&cred)?;
            Ok(())
        })?;

        tracing::info!(credential_id = %credential_id, "Credential deleted");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
