// WebAuthn Vault — Record models
//
// Relationships are plain foreign keys (`user_id`, `relying_party_id`); the
// convenience joins are built at read time (see `ResolvedCredential`) and are
// never written back into a record.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{Collection, Key, Record};
use super::StoreError;

/// The service a user authenticates to, keyed by its host name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Ids of the users associated with this RP.
    #[serde(default)]
    pub users: BTreeSet<i64>,
}

impl RelyingParty {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            icon: None,
            users: BTreeSet::new(),
        }
    }
}

impl Record for RelyingParty {
    const COLLECTION: Collection = Collection::RelyingParties;

    fn key(&self) -> Key {
        Key::Text(self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned; 0 until the first `put`.
    pub id: i64,
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl User {
    /// A user that has not been persisted yet.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            display_name: display_name.into(),
            icon: None,
        }
    }
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;

    fn key(&self) -> Key {
        Key::Int(self.id)
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// COSE key material as parsed from the authenticator's credential public key.
/// The numeric identifiers are kept exactly as the authenticator sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// COSE `kty` (label 1).
    pub key_type: i8,
    /// COSE `alg` (label 3).
    pub algorithm: i8,
    /// COSE `x` (label -2).
    pub x: Vec<u8>,
    /// COSE `y` (label -3).
    pub y: Vec<u8>,
    /// COSE `crv` (label -1).
    pub curve: i8,
    /// Id of the owning credential.
    #[serde(default)]
    pub credential: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// Signature counter, opaque bytes.
    #[serde(rename = "sign_count")]
    pub counter: Vec<u8>,
    pub relying_party_id: String,
    pub user_id: i64,
    #[serde(rename = "type", default)]
    pub credential_type: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub flags: Vec<u8>,
    /// Authenticator-issued credential id.
    pub credential_id: String,
    pub public_key: PublicKey,
}

impl Record for Credential {
    const COLLECTION: Collection = Collection::Credentials;

    fn key(&self) -> Key {
        Key::Int(self.id)
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
        self.public_key.credential = id;
    }
}

/// A credential joined with the user and RP it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub credential: Credential,
    pub user: User,
    pub relying_party: RelyingParty,
}

/// Ceremony a session was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    /// Registration (creating a credential).
    #[serde(rename = "reg")]
    Registration,
    /// Authentication (asserting an existing credential).
    #[serde(rename = "att")]
    Attestation,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Registration => "reg",
            SessionType::Attestation => "att",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reg" => Ok(SessionType::Registration),
            "att" => Ok(SessionType::Attestation),
            other => Err(StoreError::InvalidSessionType(other.to_string())),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub id: i64,
    pub challenge: Vec<u8>,
    pub origin: String,
    pub session_type: SessionType,
    pub user_id: i64,
    pub relying_party_id: String,
    pub created_at: DateTime<Utc>,
}

impl Record for SessionData {
    const COLLECTION: Collection = Collection::Sessions;

    fn key(&self) -> Key {
        Key::Int(self.id)
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Challenges never show up in logs.
impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("id", &self.id)
            .field("challenge", &format_args!("[{} bytes]", self.challenge.len()))
            .field("origin", &self.origin)
            .field("session_type", &self.session_type)
            .field("user_id", &self.user_id)
            .field("relying_party_id", &self.relying_party_id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_type_parses_known_values() {
        assert_eq!("reg".parse::<SessionType>().unwrap(), SessionType::Registration);
        assert_eq!("att".parse::<SessionType>().unwrap(), SessionType::Attestation);
    }

    #[test]
    fn test_session_type_rejects_unknown_values() {
        for bad in ["", "REG", "auth", "registration"] {
            let err = bad.parse::<SessionType>().unwrap_err();
            assert!(matches!(err, StoreError::InvalidSessionType(ref s) if s == bad));
        }
    }

    #[test]
    fn test_session_type_serializes_as_short_code() {
        let json = serde_json::to_string(&SessionType::Attestation).unwrap();
        assert_eq!(json, "\"att\"");
    }

    #[test]
    fn test_session_debug_hides_challenge() {
        let session = SessionData {
            id: 1,
            challenge: vec![0xDE, 0xAD, 0xBE, 0xEF],
            origin: "localhost".to_string(),
            session_type: SessionType::Registration,
            user_id: 1,
            relying_party_id: "localhost".to_string(),
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
        };

        let debug_output = format!("{:?}", session);
        assert!(debug_output.contains("[4 bytes]"));
        assert!(!debug_output.contains("222, 173"), "challenge bytes must not be printed");
    }

    #[test]
    fn test_assign_id_sets_public_key_back_reference() {
        let mut cred = Credential {
            id: 0,
            created_at: Utc::now(),
            counter: vec![0, 0, 0, 0],
            relying_party_id: "localhost".to_string(),
            user_id: 1,
            credential_type: "public-key".to_string(),
            format: "none".to_string(),
            flags: vec![0x41],
            credential_id: "abc".to_string(),
            public_key: PublicKey {
                key_type: 2,
                algorithm: -7,
                x: vec![0; 32],
                y: vec![0; 32],
                curve: 1,
                credential: 0,
            },
        };

        cred.assign_id(9);
        assert_eq!(cred.id, 9);
        assert_eq!(cred.public_key.credential, 9);
    }
}
