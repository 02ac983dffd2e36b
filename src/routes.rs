use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{analytics, health, ingest, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/ingest", post(ingest::ingest))
        .route("/v1/ingest/meter/batch", post(ingest::ingest_meter_batch))
        .route(
            "/v1/ingest/vehicle/batch",
            post(ingest::ingest_vehicle_batch),
        )
        .route("/api/analytics/meter/summary", get(analytics::meter_summary))
        .route(
            "/api/analytics/vehicle/summary",
            get(analytics::vehicle_summary),
        )
        .route("/api/analytics/meter/:meter_id", get(analytics::meter_stats))
        .route(
            "/api/analytics/vehicle/:vehicle_id",
            get(analytics::vehicle_stats),
        )
        .route(
            "/api/analytics/performance/:vehicle_id",
            get(analytics::vehicle_performance),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
