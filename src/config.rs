// WebAuthn Vault — Configuration
//
// Defaults plus environment overrides. The database key is never printed.

use std::fmt;
use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::store::{RelyingParty, Seed, DEFAULT_CHALLENGE_LEN, DEFAULT_RP_ID};

pub const ENV_DB_PATH: &str = "WEBAUTHN_VAULT_DB";
pub const ENV_DB_KEY: &str = "WEBAUTHN_VAULT_DB_KEY";
pub const ENV_RP_ID: &str = "WEBAUTHN_VAULT_RP_ID";
pub const ENV_RP_NAME: &str = "WEBAUTHN_VAULT_RP_NAME";
pub const ENV_RP_ICON: &str = "WEBAUTHN_VAULT_RP_ICON";
pub const ENV_CHALLENGE_LEN: &str = "WEBAUTHN_VAULT_CHALLENGE_LEN";
pub const ENV_SESSION_TTL: &str = "WEBAUTHN_VAULT_SESSION_TTL";

/// Default directory for WebAuthn Vault data files.
pub fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("webauthn-vault")
}

#[derive(Clone)]
pub struct Config {
    pub db_path: PathBuf,
    /// Hex-encoded SQLCipher key; only honoured by `sqlcipher` builds.
    pub db_key: Option<Zeroizing<String>>,
    pub rp_id: String,
    pub rp_name: String,
    pub rp_icon: Option<String>,
    pub challenge_len: usize,
    /// Sessions older than this are rejected; `None` keeps them forever.
    pub session_ttl: Option<chrono::Duration>,
}

impl Default for Config {
    fn default() -> Self {
        let seed = Seed::default();
        Self {
            db_path: data_dir().join("webauthn.db"),
            db_key: None,
            rp_id: DEFAULT_RP_ID.to_string(),
            rp_name: seed.rp.display_name,
            rp_icon: seed.rp.icon,
            challenge_len: DEFAULT_CHALLENGE_LEN,
            session_ttl: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `WEBAUTHN_VAULT_*` environment variables.
    pub fn from_env() -> Result<Self, VaultError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        config.db_key = lookup(ENV_DB_KEY)
            .filter(|k| !k.is_empty())
            .map(Zeroizing::new);
        if let Some(id) = lookup(ENV_RP_ID) {
            config.rp_id = id;
        }
        if let Some(name) = lookup(ENV_RP_NAME) {
            config.rp_name = name;
        }
        if let Some(icon) = lookup(ENV_RP_ICON) {
            config.rp_icon = Some(icon).filter(|i| !i.is_empty());
        }
        if let Some(len) = lookup(ENV_CHALLENGE_LEN) {
            config.challenge_len = parse_number(ENV_CHALLENGE_LEN, &len)?;
            if config.challenge_len == 0 {
                return Err(VaultError::Config(format!("{} must be positive", ENV_CHALLENGE_LEN)));
            }
        }
        if let Some(ttl) = lookup(ENV_SESSION_TTL) {
            let secs: i64 = parse_number(ENV_SESSION_TTL, &ttl)?;
            if secs <= 0 {
                return Err(VaultError::Config(format!("{} must be positive", ENV_SESSION_TTL)));
            }
            let ttl = chrono::Duration::try_seconds(secs)
                .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
                .ok_or_else(|| {
                    VaultError::Config(format!("{} is out of range: {}", ENV_SESSION_TTL, secs))
                })?;
            config.session_ttl = Some(ttl);
        }

        Ok(config)
    }

    pub fn db_key(&self) -> Option<&str> {
        self.db_key.as_ref().map(|k| k.as_str())
    }

    /// Bootstrap records for this configuration.
    pub fn seed(&self) -> Seed {
        let mut seed = Seed::default();
        let users = std::mem::take(&mut seed.rp.users);
        seed.rp = RelyingParty {
            id: self.rp_id.clone(),
            display_name: self.rp_name.clone(),
            icon: self.rp_icon.clone(),
            users,
        };
        seed
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, VaultError> {
    raw.trim()
        .parse()
        .map_err(|_| VaultError::Config(format!("{} is not a valid number: '{}'", name, raw)))
}

/// Custom Debug that NEVER reveals the database key.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &self.db_path)
            .field("db_key", &self.db_key.as_ref().map(|_| "[REDACTED]"))
            .field("rp_id", &self.rp_id)
            .field("rp_name", &self.rp_name)
            .field("rp_icon", &self.rp_icon)
            .field("challenge_len", &self.challenge_len)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
