use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::error::Result;
use crate::models::{CreateMeterReading, CreateVehicleReading};

/// Sole writer path for the history and current-state tables.
///
/// Each ingestion is one transaction: an unconditional append to the
/// history table plus a conditional upsert of the current-state row.
/// The `WHERE current.ts < EXCLUDED.ts` guard runs server-side as part
/// of the upsert statement, so two writers racing on the same device
/// cannot leave the older reading in the current table. Ties keep the
/// stored row.
#[derive(Clone)]
pub struct IngestRepository {
    pool: DbPool,
}

impl IngestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert_meter_reading(
        &self,
        reading: &CreateMeterReading,
        ts: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // History: append every accepted reading, stale or not
        sqlx::query(
            r#"
            INSERT INTO meter_readings (meter_id, kwh_consumed_ac, voltage, ts)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&reading.meter_id)
        .bind(reading.kwh_consumed_ac)
        .bind(reading.voltage)
        .bind(ts)
        .execute(&mut *tx)
        .await?;

        // Current: update only when strictly newer
        sqlx::query(
            r#"
            INSERT INTO meter_current (meter_id, kwh_consumed_ac, voltage, ts)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (meter_id)
            DO UPDATE SET
                kwh_consumed_ac = EXCLUDED.kwh_consumed_ac,
                voltage         = EXCLUDED.voltage,
                ts              = EXCLUDED.ts
            WHERE meter_current.ts < EXCLUDED.ts
            "#,
        )
        .bind(&reading.meter_id)
        .bind(reading.kwh_consumed_ac)
        .bind(reading.voltage)
        .bind(ts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_vehicle_reading(
        &self,
        reading: &CreateVehicleReading,
        ts: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO vehicle_readings (vehicle_id, soc, kwh_delivered_dc, battery_temp, ts)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&reading.vehicle_id)
        .bind(reading.soc)
        .bind(reading.kwh_delivered_dc)
        .bind(reading.battery_temp)
        .bind(ts)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO vehicle_current (vehicle_id, soc, kwh_delivered_dc, battery_temp, ts)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (vehicle_id)
            DO UPDATE SET
                soc              = EXCLUDED.soc,
                kwh_delivered_dc = EXCLUDED.kwh_delivered_dc,
                battery_temp     = EXCLUDED.battery_temp,
                ts               = EXCLUDED.ts
            WHERE vehicle_current.ts < EXCLUDED.ts
            "#,
        )
        .bind(&reading.vehicle_id)
        .bind(reading.soc)
        .bind(reading.kwh_delivered_dc)
        .bind(reading.battery_temp)
        .bind(ts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
