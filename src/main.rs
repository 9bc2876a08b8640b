use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recipe_forge::api::{create_api, AppState};
use recipe_forge::config::Config;
use recipe_forge::generation::RecipeGenerator;
use recipe_forge::providers;
use recipe_forge::store::RecipeStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Serve locally synthesized recipes when the completion call fails.
    #[arg(long)]
    fallback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if args.fallback {
        config.fallback_on_failure = true;
    }

    let provider = providers::from_config(&config)?;
    info!(model = %config.model, "completion provider ready");

    let generator = RecipeGenerator::new(provider, config.recipe_count, config.bonus_enabled);
    let store = RecipeStore::new();
    let app = create_api(AppState::new(store, generator, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server running on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
