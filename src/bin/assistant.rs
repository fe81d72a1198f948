//! Campus Assistant - AI chatbot service
//!
//! Serves the one-shot chat endpoint. Answers are grounded in live campus
//! data fetched from the Campus Hub API, with canned fallbacks when the API
//! is unreachable.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_hub::assistant::{self, AssistantState};
use campus_hub::{config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::init();
    tracing::info!(
        "Starting Campus Assistant on {}:{}",
        config.server.host,
        config.server.assistant_port
    );

    let state = AssistantState::new().await?;
    tracing::info!(
        api_base_url = %config.assistant.api_base_url,
        "Assistant state initialized"
    );

    let app = Router::new()
        .merge(assistant::routes(config.storage.max_upload_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // LLM calls with retries can run long.
                .layer(TimeoutLayer::new(Duration::from_secs(180)))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.assistant_port)
        .parse()
        .map_err(|_| campus_hub::Error::Internal("Invalid listen address".to_string()))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
