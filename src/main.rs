// WebAuthn Vault — Application Entry Point
//
// Parses CLI arguments, initializes structured logging, and dispatches to the
// command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use webauthn_vault::cli::{execute, Cli};

fn main() {
    // RUST_LOG=webauthn_vault=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("webauthn_vault=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
