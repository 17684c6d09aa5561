//! Bookstore Journal server
//!
//! REST API for bookstore visit memos and their analysis.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstore_journal::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{redis::RedisService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookstore_journal={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Bookstore Journal v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    // Redis only backs the weather cache; run without it if unavailable
    let redis_service = match RedisService::new(&config.redis.url).await {
        Ok(service) => {
            tracing::info!("Connected to Redis");
            Some(service)
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, weather readings will not be cached: {}", e);
            None
        }
    };

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, redis_service)
        .await
        .context("Failed to create services")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Memos
        .route("/memos", get(api::memos::list_memos).post(api::memos::create_memo))
        .route(
            "/memos/:id",
            get(api::memos::get_memo)
                .put(api::memos::update_memo)
                .delete(api::memos::delete_memo),
        )
        .route("/tags", get(api::memos::list_tags))
        .route("/books/search", get(api::memos::search_books))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        // AI analysis
        .route("/ai-analysis", post(api::analysis::analyze))
        .route("/ai-analysis/run", post(api::analysis::analyze_window))
        .route(
            "/analyses",
            get(api::analysis::list_analyses).post(api::analysis::save_analysis),
        )
        // Weather
        .route("/weather", get(api::weather::current_weather))
        .route("/weather/historical", get(api::weather::historical_weather))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
