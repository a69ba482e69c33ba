//! services/api/src/bin/journal-api.rs

use journal_api::{
    adapters::{db::PgStore, weather::OpenWeatherAdapter, weather::UnconfiguredWeather},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderName, HeaderValue, Method};
use axum::Router;
use mood_journal_core::memory::InMemoryStore;
use mood_journal_core::ports::{EntryRepository, PatternRepository, WeatherSource};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect Storage & Run Migrations ---
    let (entries, patterns): (Arc<dyn EntryRepository>, Arc<dyn PatternRepository>) =
        match &config.storage {
            StorageBackend::Postgres {
                database_url,
                max_connections,
            } => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(database_url)
                    .await?;
                let store = Arc::new(PgStore::new(db_pool));
                info!("Running database migrations...");
                store.run_migrations().await?;
                info!("Database migrations complete.");
                (
                    store.clone() as Arc<dyn EntryRepository>,
                    store as Arc<dyn PatternRepository>,
                )
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage; entries will not survive a restart.");
                let store = Arc::new(InMemoryStore::new());
                (
                    store.clone() as Arc<dyn EntryRepository>,
                    store as Arc<dyn PatternRepository>,
                )
            }
        };

    // --- 3. Initialize the Weather Adapter ---
    let weather: Arc<dyn WeatherSource> = match &config.weather.api_key {
        Some(api_key) => Arc::new(OpenWeatherAdapter::new(&config.weather, api_key.clone())?),
        None => {
            warn!("WEATHER_API_KEY is not set; entries will be saved without weather data.");
            Arc::new(UnconfiguredWeather)
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(entries, patterns, weather));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(web::middleware::USER_ID_HEADER),
        ]);

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
