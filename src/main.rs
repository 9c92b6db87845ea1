use clap::{Parser, Subcommand};
use configuration::TransportKind;
use core_types::keys::well_known;
use events::registry::Listener;
use realtime_client::RealtimeClient;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Pulse realtime tools.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variable overrides from a .env file, if present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Listen(args) => handle_listen(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A terminal monitor for the dashboard backend's realtime event feed.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the backend and log every delivered event.
    Listen(ListenArgs),
}

#[derive(Parser)]
struct ListenArgs {
    /// Backend origin, overriding config.toml (e.g. "http://127.0.0.1:8080").
    #[arg(long)]
    url: Option<String>,

    /// Wire transport, overriding config.toml.
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// Event key to subscribe to. Repeatable; defaults to the
    /// well-known dashboard keys.
    #[arg(long = "event")]
    events: Vec<String>,
}

// ==============================================================================
// Listen Command Logic
// ==============================================================================

/// Wires a client from configuration plus CLI overrides and tails the
/// feed until ctrl-c.
async fn handle_listen(args: ListenArgs) -> anyhow::Result<()> {
    let mut config = configuration::load_config()?.realtime;
    if let Some(url) = args.url {
        config.base_url = url;
    }
    if let Some(transport) = args.transport {
        config.transport = transport;
    }

    let events = if args.events.is_empty() {
        vec![
            well_known::PRICE_UPDATE.to_string(),
            well_known::ORDER_UPDATE.to_string(),
            well_known::PORTFOLIO_UPDATE.to_string(),
            well_known::LOBBY_UPDATE.to_string(),
        ]
    } else {
        args.events
    };

    let client = RealtimeClient::new(&config)?;

    let _up = client.on_connect(Arc::new(|| tracing::info!("realtime connection established")));
    let _down = client.on_disconnect(Arc::new(|| tracing::warn!("realtime connection lost")));

    // Subscriptions registered before connect are announced by the
    // reconnect replay as soon as the transport comes up.
    let mut subscriptions = Vec::with_capacity(events.len());
    for event in &events {
        let key = event.clone();
        let listener: Listener = Arc::new(move |payload| {
            tracing::info!(event = %key, %payload, "event received");
        });
        subscriptions.push(client.subscribe(event.clone(), listener));
    }

    client.connect();
    tracing::info!(
        url = %config.base_url,
        transport = ?config.transport,
        events = ?events,
        "listening; press ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
