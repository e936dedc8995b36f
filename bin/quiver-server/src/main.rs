//! Quiver - Maven repository server
//!
//! Serves local repositories over HTTP and falls back to remote repositories
//! on a miss. The `tokens` subcommands manage the access token file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quiver_auth::{Token, TokenFile, TokenStore, generate_secret};
use quiver_common::Config;
use quiver_server::{AppState, router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "quiver-server")]
#[command(about = "Quiver Maven repository server")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "QUIVER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides hostname and port from the configuration
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the repository server (default)
    Serve,
    /// Access token management
    Tokens {
        #[command(subcommand)]
        action: TokenCommands,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommands {
    /// Create or replace a token and print its secret
    Add {
        /// Token alias, also the Basic auth username
        alias: String,
        /// Permitted path prefix, e.g. /releases/com/example or */com/example
        path: String,
    },
    /// Delete a token
    Remove { alias: String },
    /// List tokens
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, args.listen).await,
        Commands::Tokens { action } => tokens(&config, action),
    }
}

async fn serve(config: Config, listen: Option<String>) -> Result<()> {
    info!("Starting Quiver");

    let addr: SocketAddr = match listen {
        Some(listen) => listen
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}: {}", listen, e))?,
        None => config.listen_addr()?,
    };

    let tokens = Arc::new(TokenStore::new());
    let token_file = TokenFile::new(&config.tokens_file);
    info!("Token file: {}", token_file.path().display());
    let state = {
        let tokens = tokens.clone();
        tokio::task::spawn_blocking(move || -> Result<AppState> {
            token_file.load(&tokens)?;
            Ok(AppState::from_config(&config, tokens)?)
        })
        .await??
    };

    info!("Tokens: {}", tokens.count());
    info!(
        "Repositories: {}",
        state
            .lookup
            .repositories()
            .repositories()
            .iter()
            .map(|repository| repository.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let app = router(state);

    info!("Starting repository server on {}", addr);
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        })
        .await?;

    info!("Quiver shut down gracefully");

    Ok(())
}

fn tokens(config: &Config, action: TokenCommands) -> Result<()> {
    let store = TokenStore::new();
    let file = TokenFile::new(&config.tokens_file);
    file.load(&store)?;

    match action {
        TokenCommands::Add { alias, path } => {
            let secret = generate_secret();
            let token = Token::new(alias, path, &secret);
            println!("Token {} for {}", token.alias, token.path);
            println!("Secret: {secret}");
            println!("The secret is shown only once.");
            store.add(token);
            file.save(&store)?;
        }
        TokenCommands::Remove { alias } => {
            if store.remove(&alias).is_none() {
                anyhow::bail!("Token {} not found", alias);
            }
            file.save(&store)?;
            println!("Removed token {alias}");
        }
        TokenCommands::List => {
            let tokens = store.all();
            if tokens.is_empty() {
                println!("No tokens found");
            } else {
                println!("{:<24} PATH", "ALIAS");
                for token in tokens {
                    println!("{:<24} {}", token.alias, token.path);
                }
            }
        }
    }

    Ok(())
}
