use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use super::AppState;
use crate::error::Result;
use crate::models::{
    BatchIngestResponse, BatchReadings, CreateMeterReading, CreateVehicleReading, IngestResponse,
};

/// POST /v1/ingest
/// Polymorphic ingestion; payload variant is detected by identity field.
pub async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let kind = state.ingest.ingest(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(IngestResponse { kind })))
}

/// POST /v1/ingest/meter/batch
/// Parsed by hand so shape errors come back through the validation
/// envelope rather than the extractor's plain-text rejection.
pub async fn ingest_meter_batch(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<BatchIngestResponse>)> {
    let batch = BatchReadings::from_value_with(payload, CreateMeterReading::from_value)?;
    let accepted = state.ingest.ingest_meter_batch(&batch.readings).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(BatchIngestResponse {
            kind: "meter",
            accepted,
        }),
    ))
}

/// POST /v1/ingest/vehicle/batch
pub async fn ingest_vehicle_batch(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<BatchIngestResponse>)> {
    let batch = BatchReadings::from_value_with(payload, CreateVehicleReading::from_value)?;
    let accepted = state.ingest.ingest_vehicle_batch(&batch.readings).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(BatchIngestResponse {
            kind: "vehicle",
            accepted,
        }),
    ))
}
