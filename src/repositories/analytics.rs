use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::DbPool;
use crate::error::Result;
use crate::models::{MeterCurrent, VehicleCurrent};

/// Read-only aggregates over the history tables. The current-state
/// tables are touched only for point lookups; every windowed number
/// comes from history.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: DbPool,
}

#[derive(Debug, Clone, FromRow)]
pub struct MeterAggregateRow {
    pub total_readings: i64,
    pub kwh_sum: f64,
    pub kwh_avg: f64,
    pub kwh_min: f64,
    pub kwh_max: f64,
    pub voltage_avg: f64,
    pub voltage_min: f64,
    pub voltage_max: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct VehicleAggregateRow {
    pub total_readings: i64,
    pub kwh_sum: f64,
    pub kwh_avg: f64,
    pub kwh_min: f64,
    pub kwh_max: f64,
    pub soc_avg: f64,
    pub soc_min: f64,
    pub soc_max: f64,
    pub temp_avg: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct PerformanceMeterRow {
    pub ac_total: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct PerformanceVehicleRow {
    pub dc_total: f64,
    pub avg_battery_temp: f64,
}

impl AnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Windowed meter aggregates, class-wide or scoped to one meter.
    /// Zero matching rows produce count=0 with zeroed aggregates.
    pub async fn meter_aggregates(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        meter_id: Option<&str>,
    ) -> Result<MeterAggregateRow> {
        let mut query = String::from(
            r#"
            SELECT
                COUNT(*)                           AS total_readings,
                COALESCE(SUM(kwh_consumed_ac), 0)  AS kwh_sum,
                COALESCE(AVG(kwh_consumed_ac), 0)  AS kwh_avg,
                COALESCE(MIN(kwh_consumed_ac), 0)  AS kwh_min,
                COALESCE(MAX(kwh_consumed_ac), 0)  AS kwh_max,
                COALESCE(AVG(voltage), 0)          AS voltage_avg,
                COALESCE(MIN(voltage), 0)          AS voltage_min,
                COALESCE(MAX(voltage), 0)          AS voltage_max
            FROM meter_readings
            WHERE 1=1
            "#,
        );

        let mut arg_index = 0;
        if from.is_some() {
            arg_index += 1;
            query.push_str(&format!(" AND ts >= ${}", arg_index));
        }
        if to.is_some() {
            arg_index += 1;
            query.push_str(&format!(" AND ts < ${}", arg_index));
        }
        if meter_id.is_some() {
            arg_index += 1;
            query.push_str(&format!(" AND meter_id = ${}", arg_index));
        }

        let mut q = sqlx::query_as::<_, MeterAggregateRow>(&query);
        if let Some(from) = from {
            q = q.bind(from);
        }
        if let Some(to) = to {
            q = q.bind(to);
        }
        if let Some(id) = meter_id {
            q = q.bind(id);
        }

        Ok(q.fetch_one(&self.pool).await?)
    }

    pub async fn vehicle_aggregates(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        vehicle_id: Option<&str>,
    ) -> Result<VehicleAggregateRow> {
        let mut query = String::from(
            r#"
            SELECT
                COUNT(*)                           AS total_readings,
                COALESCE(SUM(kwh_delivered_dc), 0) AS kwh_sum,
                COALESCE(AVG(kwh_delivered_dc), 0) AS kwh_avg,
                COALESCE(MIN(kwh_delivered_dc), 0) AS kwh_min,
                COALESCE(MAX(kwh_delivered_dc), 0) AS kwh_max,
                COALESCE(AVG(soc), 0)              AS soc_avg,
                COALESCE(MIN(soc), 0)              AS soc_min,
                COALESCE(MAX(soc), 0)              AS soc_max,
                COALESCE(AVG(battery_temp), 0)     AS temp_avg,
                COALESCE(MIN(battery_temp), 0)     AS temp_min,
                COALESCE(MAX(battery_temp), 0)     AS temp_max
            FROM vehicle_readings
            WHERE 1=1
            "#,
        );

        let mut arg_index = 0;
        if from.is_some() {
            arg_index += 1;
            query.push_str(&format!(" AND ts >= ${}", arg_index));
        }
        if to.is_some() {
            arg_index += 1;
            query.push_str(&format!(" AND ts < ${}", arg_index));
        }
        if vehicle_id.is_some() {
            arg_index += 1;
            query.push_str(&format!(" AND vehicle_id = ${}", arg_index));
        }

        let mut q = sqlx::query_as::<_, VehicleAggregateRow>(&query);
        if let Some(from) = from {
            q = q.bind(from);
        }
        if let Some(to) = to {
            q = q.bind(to);
        }
        if let Some(id) = vehicle_id {
            q = q.bind(id);
        }

        Ok(q.fetch_one(&self.pool).await?)
    }

    pub async fn meter_current(&self, meter_id: &str) -> Result<Option<MeterCurrent>> {
        let current = sqlx::query_as::<_, MeterCurrent>(
            "SELECT meter_id, kwh_consumed_ac, voltage, ts FROM meter_current WHERE meter_id = $1",
        )
        .bind(meter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(current)
    }

    pub async fn vehicle_current(&self, vehicle_id: &str) -> Result<Option<VehicleCurrent>> {
        let current = sqlx::query_as::<_, VehicleCurrent>(
            r#"
            SELECT vehicle_id, soc, kwh_delivered_dc, battery_temp, ts
            FROM vehicle_current
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(current)
    }

    /// AC energy consumed by one meter in a closed window (both ends
    /// inclusive, per the performance contract).
    pub async fn meter_ac_total(
        &self,
        meter_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PerformanceMeterRow> {
        let row = sqlx::query_as::<_, PerformanceMeterRow>(
            r#"
            SELECT COALESCE(SUM(kwh_consumed_ac), 0) AS ac_total
            FROM meter_readings
            WHERE meter_id = $1 AND ts >= $2 AND ts <= $3
            "#,
        )
        .bind(meter_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn vehicle_dc_total(
        &self,
        vehicle_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PerformanceVehicleRow> {
        let row = sqlx::query_as::<_, PerformanceVehicleRow>(
            r#"
            SELECT
                COALESCE(SUM(kwh_delivered_dc), 0) AS dc_total,
                COALESCE(AVG(battery_temp), 0)     AS avg_battery_temp
            FROM vehicle_readings
            WHERE vehicle_id = $1 AND ts >= $2 AND ts <= $3
            "#,
        )
        .bind(vehicle_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
