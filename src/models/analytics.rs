use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reading::{MeterCurrent, VehicleCurrent};

#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpread {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterSummaryResponse {
    pub total_readings: i64,
    pub kwh_consumed_ac: FieldSummary,
    pub voltage: FieldSpread,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummaryResponse {
    pub total_readings: i64,
    pub kwh_delivered_dc: FieldSummary,
    pub soc: FieldSpread,
    pub battery_temp: FieldSpread,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterHistoryStats {
    pub total_readings: i64,
    pub total_kwh_consumed: f64,
    pub avg_kwh_consumed: f64,
    pub avg_voltage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterStatsResponse {
    pub meter_id: String,
    pub current: Option<MeterCurrent>,
    pub history: MeterHistoryStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleHistoryStats {
    pub total_readings: i64,
    pub total_kwh_delivered: f64,
    pub avg_soc: f64,
    pub avg_kwh_delivered: f64,
    pub avg_battery_temp: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatsResponse {
    pub vehicle_id: String,
    pub current: Option<VehicleCurrent>,
    pub history: VehicleHistoryStats,
}

/// Derived, never persisted. `efficiency_ratio` is null when the meter
/// consumed nothing in the window; losses-inverted ratios above 1.0 are
/// reported as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub vehicle_id: String,
    pub meter_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub ac_consumed_total: f64,
    pub dc_delivered_total: f64,
    pub efficiency_ratio: Option<f64>,
    pub avg_battery_temp: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQueryParams {
    pub meter_id: Option<String>,
    pub vehicle_id: Option<String>,
}
