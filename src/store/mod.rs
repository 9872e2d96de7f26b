// WebAuthn Vault — Store Module
//
// Persistence for relying parties, users, credentials and ceremony sessions on
// top of an embedded SQLite database. Every registry takes an explicit
// `&Database` handle; there is no global connection.

mod bootstrap;
mod credential;
mod db;
mod engine;
mod error;
mod models;
mod relying_party;
mod session;
mod user;

pub use bootstrap::{bootstrap, Seed, ADMIN_USER_ID};
pub use credential::{CredentialStore, SqliteCredentialStore};
pub use db::Database;
pub use engine::{eq, Bucket, Collection, Key, Order, Predicate, Record};
pub use error::StoreError;
pub use models::{
    Credential, PublicKey, RelyingParty, ResolvedCredential, SessionData, SessionType, User,
};
pub use relying_party::{RelyingPartyRegistry, SqliteRelyingPartyRegistry, DEFAULT_RP_ID};
pub use session::{create_challenge, SessionStore, SqliteSessionStore, DEFAULT_CHALLENGE_LEN};
pub use user::{SqliteUserRegistry, UserRegistry};
