// WebAuthn Vault — CLI Module
//
// Administrative command-line interface using clap derive macros.
// Subcommands: init, rp, user, credentials, session.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// WebAuthn Vault — credential and session store for a WebAuthn relying party.
#[derive(Parser, Debug)]
#[command(name = "webauthn-vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database file (overrides WEBAUTHN_VAULT_DB).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and seed the default relying party and admin user.
    Init,

    /// Inspect or register relying parties.
    Rp {
        #[command(subcommand)]
        action: RpAction,
    },

    /// Inspect or register users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Inspect or delete registered credentials.
    Credentials {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Issue or inspect ceremony sessions.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RpAction {
    /// Show a relying party (the default one when no host is given).
    Show {
        #[arg(long)]
        host: Option<String>,
    },

    /// Create or replace a relying party.
    Put {
        /// Host name, used as the RP id.
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        icon: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a new user and associate it with the default relying party.
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        display_name: String,
    },

    /// Show a user by name.
    Show {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CredentialAction {
    /// List a user's credentials.
    List {
        /// Username whose credentials to list.
        #[arg(long)]
        user: String,
    },

    /// Delete a credential by its authenticator credential id.
    /// No ownership check is made; the operator is trusted.
    Delete { credential_id: String },
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Open a new ceremony session and print its challenge.
    New {
        #[arg(long)]
        user: String,

        /// Ceremony type: "reg" or "att".
        #[arg(long = "type")]
        session_type: String,

        /// Relying party host (defaults to the configured RP).
        #[arg(long)]
        host: Option<String>,
    },

    /// Show a session by id.
    Show { id: i64 },
}
