//! Digital Addiction Assessment Server
//!
//! Students answer a fixed lifestyle questionnaire; each submission is stored,
//! mapped onto the model's feature layout and classified into a risk level.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DAS SERVER                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Auth     │  │  Risk Predictor         │ │
//! │  │  (Axum)   │  │  (JWT)    │  │  (mapper + pipeline)    │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐                             │
//! │                │ PostgreSQL  │                             │
//! │                └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod middleware;
mod error;
mod ml;
mod survey;
mod analytics;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ml::Predictor;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "das_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("DAS server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    if config.is_production() && config.jwt_secret.starts_with("das-dev-secret") {
        tracing::warn!("JWT_SECRET is not set, using the development secret in production");
    }

    // The service cannot answer without a model
    let predictor = Predictor::load(&config.model_path)
        .with_context(|| format!("Failed to load model from {}", config.model_path))?;

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .context("Failed to create database pool")?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .context("Failed to run migrations")?;

    if let (Some(email), Some(password)) = (&config.staff_email, &config.staff_password) {
        handlers::auth::ensure_staff_account(&pool, email, password).await
            .map_err(|e| anyhow::anyhow!("Failed to create staff account: {:?}", e))?;
    }

    let state = AppState {
        pool,
        config: config.clone(),
        predictor: Arc::new(predictor),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await
        .context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub predictor: Arc<Predictor>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/register", post(handlers::auth::register));

    // Student and staff routes (user JWT auth)
    let user_routes = Router::new()
        .route("/api/v1/assessments", get(handlers::assessments::list))
        .route("/api/v1/assessments/predict", post(handlers::assessments::predict))
        .route("/api/v1/assessments/:id", get(handlers::assessments::get))
        .route("/api/v1/dashboard/student", get(handlers::dashboard::student))
        .route("/api/v1/dashboard/insights", get(handlers::dashboard::insights))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
