//! Rowset Server binary.

use rowset_server::config::Config;
use rowset_server::dataset::{Dataset, Fixtures};
use rowset_server::{create_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rowset_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Rowset Server on {}:{}", config.host, config.port);

    // Seed the dataset
    let dataset = match &config.fixtures_path {
        Some(path) => {
            tracing::info!("Loading fixtures from {}", path.display());
            Dataset::from_fixtures(Fixtures::from_path(path)?)?
        }
        None => {
            tracing::warn!("FIXTURES_PATH not set, starting with an empty dataset");
            Dataset::new()
        }
    };
    tracing::info!(resources = ?dataset.resource_names(), "dataset ready");

    if config.auth_secret.is_none() {
        tracing::warn!("AUTH_SECRET not set, RPC endpoints accept anonymous requests");
    }

    // Build router
    let addr = format!("{}:{}", config.host, config.port);
    let app = create_router(AppState::new(dataset, config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
