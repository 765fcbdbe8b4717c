use anyhow::Result;
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use safety_scorer::{LlmSummarizer, SafetyScorer};
use threat_engine::ThreatCatalog;

mod geocode;
mod routes;
mod store;

use geocode::ReverseGeocoder;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ThreatCatalog>,
    pub store: Arc<Store>,
    pub scorer: Arc<SafetyScorer<LlmSummarizer>>,
    pub geocoder: Arc<ReverseGeocoder>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "toursafe_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = Arc::new(ThreatCatalog::seeded());
    tracing::info!("   Loaded {} threat records", catalog.len());

    let summarizer = LlmSummarizer::from_env()?;
    let scorer = Arc::new(SafetyScorer::new(catalog.clone(), summarizer));

    let state = AppState {
        catalog,
        store: Store::new(),
        scorer,
        geocoder: Arc::new(ReverseGeocoder::new()),
    };

    let api_routes = Router::new()
        .route("/tourists", post(routes::register_tourist))
        .route("/tourists/:id", get(routes::get_tourist))
        .route("/tourists/:id/locations", get(routes::location_history))
        .route("/tourists/:id/safety", get(routes::tourist_safety))
        .route("/locations", post(routes::update_location))
        .route("/alerts", post(routes::create_alert).get(routes::list_alerts))
        .route("/threats", get(routes::list_threats))
        .route("/threats/nearby", get(routes::threats_nearby))
        .route("/routes/score", post(routes::score_route))
        .route("/routes/safer", post(routes::plan_safer_route))
        .with_state(state);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes)
        .layer(CorsLayer::permissive());

    let port = std::env::var("TOURSAFE_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "8001".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("🧭 TourSafe Gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "toursafe-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
