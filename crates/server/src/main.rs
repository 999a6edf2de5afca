use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use itemstore_server::api::AppState;
use itemstore_server::auth::AuthPipeline;
use itemstore_server::config::ItemStoreConfig;
use itemstore_server::item_service::ItemService;
use itemstore_server::store_factory;

/// Item store HTTP server.
#[derive(Parser, Debug)]
#[command(name = "itemstore-server", about = "HTTP server for the item store")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "store.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision backend schema for the configured store and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ItemStoreConfig::load(&cli.config)?;

    if let Some(Commands::Migrate) = cli.command {
        store_factory::migrate(&config.store).await?;
        info!("migration complete");
        return Ok(());
    }

    let store = store_factory::create_store(&config.store).await?;
    let validation = config.user_input_validation.build()?;
    let item_service = Arc::new(ItemService::new(
        Arc::clone(&store),
        validation,
        config.store.item_max_ttl,
    ));

    let auth = if config.auth.enabled {
        let pipeline = AuthPipeline::new(&config.auth)?;
        info!("auth pipeline initialized");
        Some(Arc::new(pipeline))
    } else {
        None
    };

    let state = AppState {
        item_service,
        store: Arc::clone(&store),
        auth,
    };
    let app = itemstore_server::api::router(state, &config.api.base, config.api.max_body_bytes);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "itemstore-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        timeout_secs = config.server.shutdown_timeout_seconds,
        "closing store..."
    );
    match tokio::time::timeout(shutdown_timeout, store.close()).await {
        Ok(Ok(())) => info!("store closed cleanly"),
        Ok(Err(e)) => tracing::warn!(error = %e, "store reported an error while closing"),
        Err(_) => tracing::warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "store did not close within the shutdown timeout"
        ),
    }

    info!("itemstore-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
