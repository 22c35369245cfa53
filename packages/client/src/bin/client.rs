//! Pairline CLI client: online presence and one-to-one messaging.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pairline-client -- register --username alice --password secret
//! cargo run --bin pairline-client -- login --username alice --password secret
//! cargo run --bin pairline-client -- chat
//! cargo run --bin pairline-client -- logout
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pairline_client::{
    ClientError,
    api::ApiClient,
    reconnect::ReconnectPolicy,
    runner::{ChatConfig, run_chat},
    session_store::SessionStore,
};
use pairline_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "pairline-client")]
#[command(about = "Pairline chat client with presence and direct messages", long_about = None)]
struct Args {
    /// HTTP API base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Presence Channel (WebSocket) URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    ws_url: String,

    /// Where the session is stored (default: <config_dir>/pairline/session.json)
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: ClientCommand,
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Open the interactive chat
    Chat,
}

async fn run(args: Args) -> Result<(), ClientError> {
    let store = match args.session_file {
        Some(path) => SessionStore::new(path),
        None => SessionStore::new(SessionStore::default_path()?),
    };
    let api = ApiClient::new(args.api_url.clone());

    match args.command {
        ClientCommand::Register { username, password } => {
            let registered = api.register(&username, &password).await?;
            println!(
                "Registered '{}' with id {}. Log in with `login`.",
                registered.username, registered.user_id
            );
        }
        ClientCommand::Login { username, password } => {
            let session = api.login(&username, &password).await?;
            store.save(&session)?;
            println!("Logged in as '{}' (id {})", session.username, session.user_id);
        }
        ClientCommand::Logout => {
            match store.load() {
                Some(session) => {
                    if let Err(e) = api.logout(&session).await {
                        tracing::warn!("Server logout failed: {}", e);
                    }
                    println!("Logged out '{}'", session.username);
                }
                None => println!("Not logged in"),
            }
            store.clear()?;
        }
        ClientCommand::Whoami => match store.load() {
            Some(session) => println!("{} (id {})", session.username, session.user_id),
            None => println!("Not logged in"),
        },
        ClientCommand::Chat => {
            let session = store.load().ok_or_else(|| {
                ClientError::Auth("not logged in, run `login` first".to_string())
            })?;
            let config = ChatConfig {
                api_url: args.api_url,
                ws_url: args.ws_url,
                reconnect: ReconnectPolicy::default(),
            };
            run_chat(config, session).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        if matches!(e, ClientError::DuplicateSession(_)) {
            tracing::error!("This account is already online elsewhere. Exiting.");
        }
        tracing::error!("Client error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
