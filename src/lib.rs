// WebAuthn Vault — Library root
//
// Re-exports the codec, store, configuration and CLI modules.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod store;

pub use config::Config;
pub use error::{Result, VaultError};

/// Open the configured database and seed it. Any failure here is fatal:
/// a server must not begin serving requests against an unseeded store.
pub fn init(config: &Config) -> Result<store::Database> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = store::Database::open(&config.db_path, config.db_key())
        .map_err(|e| VaultError::FatalInit(format!("cannot open {}: {}", config.db_path.display(), e)))?;
    store::bootstrap(&db, &config.seed())
        .map_err(|e| VaultError::FatalInit(format!("cannot seed store: {}", e)))?;

    Ok(db)
}
