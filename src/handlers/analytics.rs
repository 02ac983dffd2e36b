use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::AppState;
use crate::error::Result;
use crate::models::{
    MeterStatsResponse, MeterSummaryResponse, PerformanceResponse, SummaryQueryParams,
    VehicleStatsResponse, VehicleSummaryResponse,
};

/// GET /api/analytics/meter/summary
/// Last-24h aggregates, class-wide or scoped via ?meterId=
pub async fn meter_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryQueryParams>,
) -> Result<Json<MeterSummaryResponse>> {
    let summary = state
        .analytics
        .meter_summary(params.meter_id.as_deref())
        .await?;
    Ok(Json(summary))
}

/// GET /api/analytics/vehicle/summary
pub async fn vehicle_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryQueryParams>,
) -> Result<Json<VehicleSummaryResponse>> {
    let summary = state
        .analytics
        .vehicle_summary(params.vehicle_id.as_deref())
        .await?;
    Ok(Json(summary))
}

/// GET /api/analytics/meter/:meter_id
/// Current state plus lifetime history stats.
pub async fn meter_stats(
    State(state): State<AppState>,
    Path(meter_id): Path<String>,
) -> Result<Json<MeterStatsResponse>> {
    let stats = state.analytics.meter_stats(&meter_id).await?;
    Ok(Json(stats))
}

/// GET /api/analytics/vehicle/:vehicle_id
pub async fn vehicle_stats(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<VehicleStatsResponse>> {
    let stats = state.analytics.vehicle_stats(&vehicle_id).await?;
    Ok(Json(stats))
}

/// GET /api/analytics/performance/:vehicle_id
/// 404 when the vehicle has no meter mapping.
pub async fn vehicle_performance(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<PerformanceResponse>> {
    let performance = state.analytics.get_performance(&vehicle_id).await?;
    Ok(Json(performance))
}
