//! Mock cold-atom server binary entry point.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mock_server::{AppState, MockConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = MockConfig::default();
    if let Ok(bind) = std::env::var("MOCK_SERVER_BIND") {
        config.bind_address = bind
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MOCK_SERVER_BIND address '{bind}': {e}"))?;
    }
    if let Ok(polls) = std::env::var("MOCK_SERVER_POLLS") {
        config.polls_until_finished = polls
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MOCK_SERVER_POLLS '{polls}': {e}"))?;
    }
    let bind_addr = config.bind_address;

    let state = Arc::new(AppState::new(config));
    for site in &state.sites {
        tracing::info!(
            "Serving {} at http://{}{}",
            site.capabilities.name(),
            bind_addr,
            site.prefix
        );
    }

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
