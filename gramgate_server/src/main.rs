use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gramgate_core::Config;
use gramgate_server::{cors_layer, router, AppState};

#[derive(Debug, Parser)]
#[command(name = "gramgate", about = "Instagram Business Graph proxy")]
struct Args {
    /// Address the proxy listens on.
    #[arg(long, env = "GRAMGATE_LISTEN", default_value = "127.0.0.1:8443")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gramgate_server=info,gramgate_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let state = AppState::new(&config)?;
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.frontend_url)?);

    let listener = TcpListener::bind(args.listen).await?;
    info!(listen = %args.listen, frontend = %config.frontend_url, "gramgate started");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
