use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    FieldSpread, FieldSummary, MeterHistoryStats, MeterStatsResponse, MeterSummaryResponse,
    PerformanceResponse, VehicleHistoryStats, VehicleStatsResponse, VehicleSummaryResponse,
};
use crate::repositories::{AnalyticsRepository, MappingRepository};

const WINDOW_HOURS: i64 = 24;

/// Windowed summaries over device history, plus the vehicle/meter
/// correlation that derives the charging-efficiency ratio.
#[derive(Clone)]
pub struct AnalyticsService {
    repository: AnalyticsRepository,
    mappings: MappingRepository,
}

impl AnalyticsService {
    pub fn new(repository: AnalyticsRepository, mappings: MappingRepository) -> Self {
        Self {
            repository,
            mappings,
        }
    }

    /// 24h meter summary, class-wide or scoped to one meter.
    pub async fn meter_summary(&self, meter_id: Option<&str>) -> Result<MeterSummaryResponse> {
        let (period_start, period_end) = window_24h(Utc::now());
        let agg = self
            .repository
            .meter_aggregates(Some(period_start), Some(period_end), meter_id)
            .await?;

        Ok(MeterSummaryResponse {
            total_readings: agg.total_readings,
            kwh_consumed_ac: FieldSummary {
                sum: agg.kwh_sum,
                avg: agg.kwh_avg,
                min: agg.kwh_min,
                max: agg.kwh_max,
            },
            voltage: FieldSpread {
                avg: agg.voltage_avg,
                min: agg.voltage_min,
                max: agg.voltage_max,
            },
            period_start,
            period_end,
        })
    }

    pub async fn vehicle_summary(
        &self,
        vehicle_id: Option<&str>,
    ) -> Result<VehicleSummaryResponse> {
        let (period_start, period_end) = window_24h(Utc::now());
        let agg = self
            .repository
            .vehicle_aggregates(Some(period_start), Some(period_end), vehicle_id)
            .await?;

        Ok(VehicleSummaryResponse {
            total_readings: agg.total_readings,
            kwh_delivered_dc: FieldSummary {
                sum: agg.kwh_sum,
                avg: agg.kwh_avg,
                min: agg.kwh_min,
                max: agg.kwh_max,
            },
            soc: FieldSpread {
                avg: agg.soc_avg,
                min: agg.soc_min,
                max: agg.soc_max,
            },
            battery_temp: FieldSpread {
                avg: agg.temp_avg,
                min: agg.temp_min,
                max: agg.temp_max,
            },
            period_start,
            period_end,
        })
    }

    /// Current state plus lifetime history stats for one meter.
    pub async fn meter_stats(&self, meter_id: &str) -> Result<MeterStatsResponse> {
        let current = self.repository.meter_current(meter_id).await?;
        let agg = self
            .repository
            .meter_aggregates(None, None, Some(meter_id))
            .await?;

        Ok(MeterStatsResponse {
            meter_id: meter_id.to_string(),
            current,
            history: MeterHistoryStats {
                total_readings: agg.total_readings,
                total_kwh_consumed: agg.kwh_sum,
                avg_kwh_consumed: agg.kwh_avg,
                avg_voltage: agg.voltage_avg,
            },
        })
    }

    pub async fn vehicle_stats(&self, vehicle_id: &str) -> Result<VehicleStatsResponse> {
        let current = self.repository.vehicle_current(vehicle_id).await?;
        let agg = self
            .repository
            .vehicle_aggregates(None, None, Some(vehicle_id))
            .await?;

        Ok(VehicleStatsResponse {
            vehicle_id: vehicle_id.to_string(),
            current,
            history: VehicleHistoryStats {
                total_readings: agg.total_readings,
                total_kwh_delivered: agg.kwh_sum,
                avg_soc: agg.soc_avg,
                avg_kwh_delivered: agg.kwh_avg,
                avg_battery_temp: agg.temp_avg,
            },
        })
    }

    /// Joins the vehicle's last 24h of DC delivery against its mapped
    /// meter's AC consumption over the same window.
    pub async fn get_performance(&self, vehicle_id: &str) -> Result<PerformanceResponse> {
        let meter_id = self
            .mappings
            .resolve_meter(vehicle_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No meter mapping for vehicle {}", vehicle_id))
            })?;

        // Both bounds from the same instant so the window is exactly 24h
        let (window_start, window_end) = window_24h(Utc::now());

        let ac = self
            .repository
            .meter_ac_total(&meter_id, window_start, window_end)
            .await?;
        let dc = self
            .repository
            .vehicle_dc_total(vehicle_id, window_start, window_end)
            .await?;

        Ok(PerformanceResponse {
            vehicle_id: vehicle_id.to_string(),
            meter_id,
            window_start,
            window_end,
            ac_consumed_total: ac.ac_total,
            dc_delivered_total: dc.dc_total,
            efficiency_ratio: efficiency_ratio(ac.ac_total, dc.dc_total),
            avg_battery_temp: dc.avg_battery_temp,
        })
    }
}

fn window_24h(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::hours(WINDOW_HOURS), now)
}

/// DC delivered over AC consumed, rounded to 4 decimal places. `None`
/// when the meter consumed nothing; not clamped above 1.0.
fn efficiency_ratio(ac_total: f64, dc_total: f64) -> Option<f64> {
    if ac_total == 0.0 {
        None
    } else {
        Some((dc_total / ac_total * 10_000.0).round() / 10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_efficiency_ratio_typical() {
        assert_eq!(efficiency_ratio(100.0, 85.0), Some(0.85));
    }

    #[test]
    fn test_efficiency_ratio_zero_ac_is_none() {
        assert_eq!(efficiency_ratio(0.0, 85.0), None);
        assert_eq!(efficiency_ratio(0.0, 0.0), None);
    }

    #[test]
    fn test_efficiency_ratio_above_one_not_clamped() {
        assert_eq!(efficiency_ratio(50.0, 60.0), Some(1.2));
    }

    #[test]
    fn test_efficiency_ratio_rounded_to_4_decimals() {
        assert_eq!(efficiency_ratio(3.0, 1.0), Some(0.3333));
        assert_eq!(efficiency_ratio(3.0, 2.0), Some(0.6667));
    }

    #[test]
    fn test_window_is_exactly_24h() {
        let now = Utc::now();
        let (start, end) = window_24h(now);
        assert_eq!(end, now);
        assert_eq!(end - start, Duration::hours(24));
    }
}
