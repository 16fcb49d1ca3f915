use std::{error::Error, net::SocketAddr};

use backend::{AppState, config::GatewayConfig, create_router};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gateway holding the mapping and weather provider keys for the route planner UI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        "upstreams: directions={} geocode={} weather={} (timeout {:?})",
        config.directions_base_url,
        config.geocode_base_url,
        config.weather_base_url,
        config.upstream_timeout
    );

    let state = AppState::from_config(&config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!("starting gateway on http://{}", cli.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
