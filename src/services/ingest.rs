use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{CreateMeterReading, CreateVehicleReading, ReadingPayload};
use crate::repositories::IngestRepository;

const MAX_ID_LENGTH: usize = 100;
const MAX_BATCH_SIZE: usize = 10_000;

/// Validates readings against the field-range contract and hands them
/// to the repository's atomic append + conditional-update unit.
#[derive(Clone)]
pub struct IngestService {
    repository: IngestRepository,
}

impl IngestService {
    pub fn new(repository: IngestRepository) -> Self {
        Self { repository }
    }

    /// Single polymorphic ingestion. Returns the detected payload kind.
    pub async fn ingest(&self, payload: Value) -> Result<&'static str> {
        match ReadingPayload::from_value(payload)? {
            ReadingPayload::Meter(dto) => {
                self.ingest_meter(&dto).await?;
                Ok("meter")
            }
            ReadingPayload::Vehicle(dto) => {
                self.ingest_vehicle(&dto).await?;
                Ok("vehicle")
            }
        }
    }

    pub async fn ingest_meter(&self, dto: &CreateMeterReading) -> Result<()> {
        let ts = validate_meter(dto).map_err(AppError::Validation)?;
        self.repository.insert_meter_reading(dto, ts).await?;
        tracing::info!(meter_id = %dto.meter_id, ts = %ts, "ingested meter reading");
        Ok(())
    }

    pub async fn ingest_vehicle(&self, dto: &CreateVehicleReading) -> Result<()> {
        let ts = validate_vehicle(dto).map_err(AppError::Validation)?;
        self.repository.insert_vehicle_reading(dto, ts).await?;
        tracing::info!(vehicle_id = %dto.vehicle_id, ts = %ts, "ingested vehicle reading");
        Ok(())
    }

    /// Validates the whole batch up front, reporting every failing
    /// element by index, then applies each reading through the same
    /// atomic unit as single ingestion.
    pub async fn ingest_meter_batch(&self, readings: &[CreateMeterReading]) -> Result<usize> {
        let stamped = validate_batch(readings, validate_meter)?;
        for (dto, ts) in &stamped {
            self.repository.insert_meter_reading(dto, *ts).await?;
        }
        tracing::info!(count = stamped.len(), "ingested meter reading batch");
        Ok(stamped.len())
    }

    pub async fn ingest_vehicle_batch(&self, readings: &[CreateVehicleReading]) -> Result<usize> {
        let stamped = validate_batch(readings, validate_vehicle)?;
        for (dto, ts) in &stamped {
            self.repository.insert_vehicle_reading(dto, *ts).await?;
        }
        tracing::info!(count = stamped.len(), "ingested vehicle reading batch");
        Ok(stamped.len())
    }
}

type FieldErrors = Vec<String>;

fn validate_batch<'a, T>(
    readings: &'a [T],
    validate: fn(&T) -> std::result::Result<DateTime<Utc>, FieldErrors>,
) -> Result<Vec<(&'a T, DateTime<Utc>)>> {
    if readings.is_empty() || readings.len() > MAX_BATCH_SIZE {
        return Err(AppError::validation(format!(
            "readings must contain between 1 and {} items",
            MAX_BATCH_SIZE
        )));
    }

    let mut errors = Vec::new();
    let mut stamped = Vec::with_capacity(readings.len());
    for (i, dto) in readings.iter().enumerate() {
        match validate(dto) {
            Ok(ts) => stamped.push((dto, ts)),
            Err(errs) => errors.extend(errs.into_iter().map(|e| format!("readings[{}]: {}", i, e))),
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok(stamped)
}

fn validate_meter(dto: &CreateMeterReading) -> std::result::Result<DateTime<Utc>, FieldErrors> {
    let mut errors = Vec::new();

    validate_device_id("meterId", &dto.meter_id, &mut errors);
    if dto.kwh_consumed_ac < 0.0 {
        errors.push("kwhConsumedAc must be >= 0".to_string());
    }
    if dto.voltage < 0.0 {
        errors.push("voltage must be >= 0".to_string());
    }
    let ts = validate_timestamp(&dto.timestamp, &mut errors);

    match ts {
        Some(ts) if errors.is_empty() => Ok(ts),
        _ => Err(errors),
    }
}

fn validate_vehicle(dto: &CreateVehicleReading) -> std::result::Result<DateTime<Utc>, FieldErrors> {
    let mut errors = Vec::new();

    validate_device_id("vehicleId", &dto.vehicle_id, &mut errors);
    if !(0.0..=100.0).contains(&dto.soc) {
        errors.push("soc must be between 0 and 100".to_string());
    }
    if dto.kwh_delivered_dc < 0.0 {
        errors.push("kwhDeliveredDc must be >= 0".to_string());
    }
    if !(-50.0..=200.0).contains(&dto.battery_temp) {
        errors.push("batteryTemp must be between -50 and 200".to_string());
    }
    let ts = validate_timestamp(&dto.timestamp, &mut errors);

    match ts {
        Some(ts) if errors.is_empty() => Ok(ts),
        _ => Err(errors),
    }
}

fn validate_device_id(field: &str, value: &str, errors: &mut Vec<String>) {
    if value.is_empty() {
        errors.push(format!("{} must not be empty", field));
    }
    if value.chars().count() > MAX_ID_LENGTH {
        errors.push(format!("{} must be at most {} characters", field, MAX_ID_LENGTH));
    }
}

fn validate_timestamp(value: &str, errors: &mut Vec<String>) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            errors.push(format!("timestamp must be a valid ISO-8601 date string: {}", value));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_meter() -> CreateMeterReading {
        CreateMeterReading {
            meter_id: "METER-001".to_string(),
            kwh_consumed_ac: 10.0,
            voltage: 230.0,
            timestamp: "2026-02-11T12:00:00Z".to_string(),
        }
    }

    fn base_vehicle() -> CreateVehicleReading {
        CreateVehicleReading {
            vehicle_id: "VEH-001".to_string(),
            soc: 78.5,
            kwh_delivered_dc: 6.2,
            battery_temp: 32.1,
            timestamp: "2026-02-11T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_validate_meter_ok() {
        let ts = validate_meter(&base_meter()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-11T12:00:00+00:00");
    }

    #[test]
    fn test_validate_meter_enumerates_all_errors() {
        let dto = CreateMeterReading {
            meter_id: "".to_string(),
            kwh_consumed_ac: -1.0,
            voltage: -5.0,
            timestamp: "not-a-date".to_string(),
        };

        let errors = validate_meter(&dto).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("meterId")));
        assert!(errors.iter().any(|e| e.contains("kwhConsumedAc")));
        assert!(errors.iter().any(|e| e.contains("voltage")));
        assert!(errors.iter().any(|e| e.contains("timestamp")));
    }

    #[test]
    fn test_validate_meter_id_too_long() {
        let dto = CreateMeterReading {
            meter_id: "M".repeat(101),
            ..base_meter()
        };

        let errors = validate_meter(&dto).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("100 characters"));
    }

    #[test]
    fn test_validate_vehicle_ok() {
        assert!(validate_vehicle(&base_vehicle()).is_ok());
    }

    #[test]
    fn test_validate_vehicle_range_bounds() {
        // Boundary values are valid
        let dto = CreateVehicleReading {
            soc: 100.0,
            battery_temp: -50.0,
            kwh_delivered_dc: 0.0,
            ..base_vehicle()
        };
        assert!(validate_vehicle(&dto).is_ok());

        let dto = CreateVehicleReading {
            soc: 100.1,
            battery_temp: 200.1,
            ..base_vehicle()
        };
        let errors = validate_vehicle(&dto).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_validate_timestamp_with_offset() {
        let dto = CreateMeterReading {
            timestamp: "2026-02-11T13:00:00+01:00".to_string(),
            ..base_meter()
        };

        // Normalized to UTC
        let ts = validate_meter(&dto).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-11T12:00:00+00:00");
    }

    #[test]
    fn test_validate_batch_reports_indices() {
        let readings = vec![
            base_meter(),
            CreateMeterReading {
                kwh_consumed_ac: -2.0,
                ..base_meter()
            },
            CreateMeterReading {
                voltage: -1.0,
                timestamp: "garbage".to_string(),
                ..base_meter()
            },
        ];

        let err = validate_batch(&readings, validate_meter).unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 3);
                assert!(messages[0].starts_with("readings[1]:"));
                assert!(messages[1].starts_with("readings[2]:"));
                assert!(messages[2].starts_with("readings[2]:"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_batch_empty_rejected() {
        let readings: Vec<CreateMeterReading> = Vec::new();
        assert!(validate_batch(&readings, validate_meter).is_err());
    }
}
