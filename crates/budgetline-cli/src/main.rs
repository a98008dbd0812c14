//! budgetline - command-line front end for the budgeting API.
//!
//! Signs in once, then lists and edits forecasts, monthly budgets,
//! categories, subcategories and expenses. Expired access tokens are
//! refreshed transparently; when the refresh itself fails the session is
//! cleared and the user is told to sign in again.

mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use budgetline_core::{ApiClient, Config};
use commands::Commands;

#[derive(Parser)]
#[command(name = "budgetline")]
#[command(about = "Manage forecasts, budgets and expenses from the terminal")]
#[command(version)]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, global = true, env = "BUDGETLINE_API_BASE_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!(base_url = %config.api_base_url, "budgetline starting");

    let store = config.session_store()?;
    let client = ApiClient::new(&config, store)?;
    let mut events = client.subscribe();

    let result = cli.command.execute(&client, &mut config).await;

    // A failed refresh anywhere during the command ends the session
    while let Ok(event) = events.try_recv() {
        if let budgetline_core::SessionEvent::Expired { redirect_to } = event {
            eprintln!(
                "Session expired. Run `budgetline login` to sign in again (sign-in: {}).",
                redirect_to
            );
        }
    }

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
