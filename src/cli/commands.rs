// WebAuthn Vault — CLI Command Handlers
//
// Each function handles one CLI subcommand. They open the configured store,
// call the registry for that collection and print the result.

use crate::config::Config;
use crate::error::VaultError;
use crate::store::{
    CredentialStore, Database, RelyingParty, RelyingPartyRegistry, SessionData, SessionStore,
    SqliteCredentialStore, SqliteRelyingPartyRegistry, SqliteSessionStore, SqliteUserRegistry,
    User, UserRegistry,
};

use super::{Cli, Commands, CredentialAction, RpAction, SessionAction, UserAction};

/// Render bytes as lowercase hex.
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Execute the parsed CLI command.
pub fn execute(cli: Cli) -> Result<(), VaultError> {
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Rp { action } => cmd_rp(&config, action),
        Commands::User { action } => cmd_user(&config, action),
        Commands::Credentials { action } => cmd_credentials(&config, action),
        Commands::Session { action } => cmd_session(&config, action),
    }
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn cmd_init(config: &Config) -> Result<(), VaultError> {
    let _db = crate::init(config)?;

    println!("✓ WebAuthn Vault initialized");
    println!("  Database:      {}", config.db_path.display());
    println!("  Relying party: {}", config.rp_id);
    println!("  Admin user:    admin");

    Ok(())
}

// ─── Relying Parties ─────────────────────────────────────────────────────────

fn cmd_rp(config: &Config, action: RpAction) -> Result<(), VaultError> {
    let db = open_db(config)?;
    let registry = SqliteRelyingPartyRegistry::with_default(&db, config.rp_id.clone());

    match action {
        RpAction::Show { host } => {
            let rp = match host {
                Some(host) => registry.get_by_host(&host)?,
                None => registry.get_default()?,
            };
            print_rp(&rp);
        }
        RpAction::Put { id, name, icon } => {
            let mut rp = match registry.get_by_host(&id) {
                Ok(existing) => existing,
                Err(e) if e.is_not_found() => RelyingParty::new(id.clone(), name.clone()),
                Err(e) => return Err(e.into()),
            };
            rp.display_name = name;
            rp.icon = icon;
            registry.put(&rp)?;
            println!("✓ Relying party {} saved", rp.id);
        }
    }

    Ok(())
}

fn print_rp(rp: &RelyingParty) {
    println!("Relying party:\n");
    println!("  ID:      {}", rp.id);
    println!("  Name:    {}", rp.display_name);
    if let Some(ref icon) = rp.icon {
        println!("  Icon:    {}", icon);
    }
    let users: Vec<String> = rp.users.iter().map(|id| id.to_string()).collect();
    println!("  Users:   {}", users.join(", "));
}

// ─── Users ───────────────────────────────────────────────────────────────────

fn cmd_user(config: &Config, action: UserAction) -> Result<(), VaultError> {
    let db = open_db(config)?;
    let users = SqliteUserRegistry::new(&db);

    match action {
        UserAction::Add { name, display_name } => {
            // Resolve the RP first so a missing one leaves no orphaned user.
            let rps = SqliteRelyingPartyRegistry::with_default(&db, config.rp_id.clone());
            let rp = rps.get_default()?;

            let mut user = User::new(name, display_name);
            let id = users.put(&mut user)?;
            rps.add_user(&rp.id, id)?;
            println!("✓ User stored");
            println!("  ID:   {}", id);
            println!("  Name: {}", user.name);
        }
        UserAction::Show { name } => {
            let user = users.get_by_username(&name)?;
            let rps = SqliteRelyingPartyRegistry::new(&db).for_user(&user)?;
            let rp_ids: Vec<&str> = rps.iter().map(|rp| rp.id.as_str()).collect();

            println!("User details:\n");
            println!("  ID:             {}", user.id);
            println!("  Name:           {}", user.name);
            println!("  Display name:   {}", user.display_name);
            println!("  Relying parties: {}", rp_ids.join(", "));
        }
    }

    Ok(())
}

// ─── Credentials ─────────────────────────────────────────────────────────────

fn cmd_credentials(config: &Config, action: CredentialAction) -> Result<(), VaultError> {
    let db = open_db(config)?;
    let store = SqliteCredentialStore::new(&db);

    match action {
        CredentialAction::List { user } => {
            let user = SqliteUserRegistry::new(&db).get_by_username(&user)?;
            let creds = store.get_all_for_user(&user)?;

            if creds.is_empty() {
                println!("No credentials registered for {}.", user.name);
                return Ok(());
            }

            println!("Credentials for {} ({}):\n", user.name, creds.len());
            for cred in &creds {
                let key = match store.public_key_for(cred) {
                    Ok(_) => "p256 ok".to_string(),
                    Err(e) => format!("unusable key: {}", e),
                };
                println!(
                    "  {} │ {:20} │ {:8} │ {} │ {}",
                    cred.credential_id,
                    cred.relying_party_id,
                    cred.format,
                    cred.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    key,
                );
            }
        }
        CredentialAction::Delete { credential_id } => {
            store.delete_by_id(&credential_id)?;
            println!("✓ Credential {} deleted", credential_id);
        }
    }

    Ok(())
}

// ─── Sessions ────────────────────────────────────────────────────────────────

fn cmd_session(config: &Config, action: SessionAction) -> Result<(), VaultError> {
    let db = open_db(config)?;
    let mut sessions = SqliteSessionStore::new(&db).with_challenge_len(config.challenge_len);
    if let Some(ttl) = config.session_ttl {
        sessions = sessions.with_ttl(ttl);
    }

    match action {
        SessionAction::New {
            user,
            session_type,
            host,
        } => {
            let user = SqliteUserRegistry::new(&db).get_by_username(&user)?;
            let registry = SqliteRelyingPartyRegistry::with_default(&db, config.rp_id.clone());
            let rp = match host {
                Some(host) => registry.get_by_host(&host)?,
                None => registry.get_default()?,
            };

            let session = sessions.create_session(&user, &rp, &session_type)?;
            println!("✓ Session created");
            print_session(&session);
        }
        SessionAction::Show { id } => {
            let session = sessions.get_by_id(id)?;
            print_session(&session);
        }
    }

    Ok(())
}

fn print_session(session: &SessionData) {
    println!("  ID:        {}", session.id);
    println!("  Type:      {}", session.session_type);
    println!("  User:      {}", session.user_id);
    println!("  Origin:    {}", session.origin);
    println!("  Challenge: {}", to_hex(&session.challenge));
    println!("  Created:   {}", session.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open an existing database.
fn open_db(config: &Config) -> Result<Database, VaultError> {
    if !config.db_path.exists() {
        return Err(VaultError::Other(format!(
            "Database not found at {}. Run `webauthn-vault init` first.",
            config.db_path.display()
        )));
    }

    Ok(Database::open(&config.db_path, config.db_key())?)
}
