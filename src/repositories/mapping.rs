use crate::db::DbPool;
use crate::error::Result;

/// Read-only lookup from vehicle identity to its associated meter.
/// A missing row is a first-class outcome, not an error.
#[derive(Clone)]
pub struct MappingRepository {
    pool: DbPool,
}

impl MappingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn resolve_meter(&self, vehicle_id: &str) -> Result<Option<String>> {
        let meter_id: Option<String> =
            sqlx::query_scalar("SELECT meter_id FROM vehicle_meter_map WHERE vehicle_id = $1")
                .bind(vehicle_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(meter_id)
    }
}
