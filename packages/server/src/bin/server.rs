//! Pairline presence and direct-messaging server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pairline-server
//! cargo run --bin pairline-server -- --host 0.0.0.0 --port 3000 --seed-user alice:secret
//! ```

use std::sync::Arc;

use clap::Parser;
use pairline_server::ui::{AppState, Server};
use pairline_shared::{logger::setup_logger, time::SystemClock};

/// `name:password` pair given with `--seed-user`
#[derive(Debug, Clone)]
struct SeedUser {
    username: String,
    password: String,
}

fn parse_seed_user(value: &str) -> Result<SeedUser, String> {
    match value.split_once(':') {
        Some((username, password)) if !username.is_empty() && !password.is_empty() => {
            Ok(SeedUser {
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        _ => Err(format!("expected name:password, got '{}'", value)),
    }
}

#[derive(Parser, Debug)]
#[command(name = "pairline-server")]
#[command(about = "Presence and direct-messaging server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Pre-register an account (repeatable)
    #[arg(long = "seed-user", value_name = "NAME:PASSWORD", value_parser = parse_seed_user)]
    seed_users: Vec<SeedUser>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let state = AppState::in_memory(Arc::new(SystemClock));
    for seed in args.seed_users {
        match state
            .register_user_usecase
            .execute(seed.username.clone(), seed.password)
            .await
        {
            Ok(user) => tracing::info!("Seeded user {} with id {}", user.username, user.id),
            Err(e) => {
                tracing::error!("Failed to seed user '{}': {}", seed.username, e);
                std::process::exit(1);
            }
        }
    }

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
