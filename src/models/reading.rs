use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::{AppError, Result};

/// Incoming meter reading, validated before it reaches storage.
/// Unknown fields are rejected at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMeterReading {
    pub meter_id: String,
    pub kwh_consumed_ac: f64,
    pub voltage: f64,
    /// ISO-8601 timestamp of the measurement (event time, not arrival time)
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateVehicleReading {
    pub vehicle_id: String,
    pub soc: f64,
    pub kwh_delivered_dc: f64,
    pub battery_temp: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct BatchReadings<T> {
    pub readings: Vec<T>,
}

const METER_FIELDS: &[(&str, &str)] = &[
    ("meterId", "string"),
    ("kwhConsumedAc", "number"),
    ("voltage", "number"),
    ("timestamp", "string"),
];

const VEHICLE_FIELDS: &[(&str, &str)] = &[
    ("vehicleId", "string"),
    ("soc", "number"),
    ("kwhDeliveredDc", "number"),
    ("batteryTemp", "number"),
    ("timestamp", "string"),
];

/// Checks every expected field for presence and JSON type, and flags
/// unrecognised keys, so a malformed payload reports all of its shape
/// problems at once instead of the first serde failure.
fn shape_errors(value: &Value, fields: &[(&str, &str)]) -> Vec<String> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => return vec!["payload must be a JSON object".to_string()],
    };

    let mut errors = Vec::new();
    for (name, kind) in fields {
        match obj.get(*name) {
            None => errors.push(format!("{} is required", name)),
            Some(v) => {
                let type_ok = match *kind {
                    "string" => v.is_string(),
                    _ => v.is_number(),
                };
                if !type_ok {
                    errors.push(format!("{} must be a {}", name, kind));
                }
            }
        }
    }
    for key in obj.keys() {
        if !fields.iter().any(|(name, _)| name == key) {
            errors.push(format!("unrecognised field \"{}\"", key));
        }
    }
    errors
}

impl CreateMeterReading {
    pub fn from_value(value: Value) -> std::result::Result<Self, Vec<String>> {
        let errors = shape_errors(&value, METER_FIELDS);
        if !errors.is_empty() {
            return Err(errors);
        }
        serde_json::from_value(value).map_err(|e| vec![format!("invalid meter reading: {}", e)])
    }
}

impl CreateVehicleReading {
    pub fn from_value(value: Value) -> std::result::Result<Self, Vec<String>> {
        let errors = shape_errors(&value, VEHICLE_FIELDS);
        if !errors.is_empty() {
            return Err(errors);
        }
        serde_json::from_value(value).map_err(|e| vec![format!("invalid vehicle reading: {}", e)])
    }
}

impl<T> BatchReadings<T> {
    /// Parses a batch envelope element by element, collecting shape
    /// errors across all elements with their indices.
    pub fn from_value_with(
        value: Value,
        parse: fn(Value) -> std::result::Result<T, Vec<String>>,
    ) -> Result<Self> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            _ => return Err(AppError::validation("payload must be a JSON object")),
        };
        let items = match obj.remove("readings") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(AppError::validation("readings must be an array")),
            None => return Err(AppError::validation("readings is required")),
        };

        let mut errors: Vec<String> = obj
            .keys()
            .map(|key| format!("unrecognised field \"{}\"", key))
            .collect();
        let mut readings = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match parse(item) {
                Ok(dto) => readings.push(dto),
                Err(errs) => {
                    errors.extend(errs.into_iter().map(|e| format!("readings[{}]: {}", i, e)))
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Self { readings })
    }
}

/// Payload variant selected by which identity field is present.
/// `meterId` wins when both are present; neither present is a rejection.
#[derive(Debug, Clone)]
pub enum ReadingPayload {
    Meter(CreateMeterReading),
    Vehicle(CreateVehicleReading),
}

impl ReadingPayload {
    pub fn from_value(value: Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| AppError::validation("payload must be a JSON object"))?;

        if obj.contains_key("meterId") {
            let dto = CreateMeterReading::from_value(value).map_err(AppError::Validation)?;
            Ok(ReadingPayload::Meter(dto))
        } else if obj.contains_key("vehicleId") {
            let dto = CreateVehicleReading::from_value(value).map_err(AppError::Validation)?;
            Ok(ReadingPayload::Vehicle(dto))
        } else {
            Err(AppError::validation(
                "payload must contain either \"meterId\" (meter) or \"vehicleId\" (vehicle)",
            ))
        }
    }
}

/// Latest-by-event-time reading for a meter, one row per meter id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MeterCurrent {
    pub meter_id: String,
    pub kwh_consumed_ac: f64,
    pub voltage: f64,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCurrent {
    pub vehicle_id: String,
    pub soc: f64,
    pub kwh_delivered_dc: f64,
    pub battery_temp: f64,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchIngestResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub accepted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_dispatch_meter() {
        let payload = json!({
            "meterId": "METER-001",
            "kwhConsumedAc": 12.5,
            "voltage": 230.4,
            "timestamp": "2026-02-11T10:30:00Z"
        });

        match ReadingPayload::from_value(payload).unwrap() {
            ReadingPayload::Meter(dto) => {
                assert_eq!(dto.meter_id, "METER-001");
                assert_eq!(dto.kwh_consumed_ac, 12.5);
            }
            other => panic!("expected meter payload, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_dispatch_vehicle() {
        let payload = json!({
            "vehicleId": "VEH-001",
            "soc": 78.5,
            "kwhDeliveredDc": 6.2,
            "batteryTemp": 32.1,
            "timestamp": "2026-02-11T10:30:00Z"
        });

        match ReadingPayload::from_value(payload).unwrap() {
            ReadingPayload::Vehicle(dto) => assert_eq!(dto.vehicle_id, "VEH-001"),
            other => panic!("expected vehicle payload, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_dispatch_neither_field_rejected() {
        let payload = json!({ "deviceId": "X-001", "timestamp": "2026-02-11T10:30:00Z" });

        let err = ReadingPayload::from_value(payload).unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 1);
                assert!(messages[0].contains("meterId"));
                assert!(messages[0].contains("vehicleId"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_missing_fields_all_reported() {
        let payload = json!({ "meterId": "METER-001" });

        let err = ReadingPayload::from_value(payload).unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 3);
                assert!(messages.iter().any(|m| m.contains("kwhConsumedAc")));
                assert!(messages.iter().any(|m| m.contains("voltage")));
                assert!(messages.iter().any(|m| m.contains("timestamp")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_mistyped_fields_all_reported() {
        let payload = json!({
            "vehicleId": "VEH-001",
            "soc": "high",
            "kwhDeliveredDc": 6.2,
            "batteryTemp": true,
            "timestamp": "2026-02-11T10:30:00Z"
        });

        let err = ReadingPayload::from_value(payload).unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 2);
                assert!(messages.iter().any(|m| m.contains("soc must be a number")));
                assert!(messages.iter().any(|m| m.contains("batteryTemp must be a number")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_unknown_field_rejected() {
        let payload = json!({
            "meterId": "METER-001",
            "kwhConsumedAc": 12.5,
            "voltage": 230.4,
            "timestamp": "2026-02-11T10:30:00Z",
            "extraField": true
        });

        let err = ReadingPayload::from_value(payload).unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 1);
                assert!(messages[0].contains("extraField"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_from_value_reports_element_shape_errors() {
        let payload = json!({
            "readings": [
                {
                    "meterId": "METER-001",
                    "kwhConsumedAc": 1.0,
                    "voltage": 230.0,
                    "timestamp": "2026-02-11T10:30:00Z"
                },
                { "meterId": "METER-001", "voltage": "high" }
            ]
        });

        let err = BatchReadings::from_value_with(payload, CreateMeterReading::from_value)
            .unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 3);
                assert!(messages.iter().all(|m| m.starts_with("readings[1]:")));
                assert!(messages.iter().any(|m| m.contains("kwhConsumedAc is required")));
                assert!(messages.iter().any(|m| m.contains("voltage must be a number")));
                assert!(messages.iter().any(|m| m.contains("timestamp is required")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_from_value_missing_readings_key() {
        let err = BatchReadings::from_value_with(json!({}), CreateMeterReading::from_value)
            .unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert!(messages[0].contains("readings is required"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_not_an_object_rejected() {
        assert!(ReadingPayload::from_value(json!([1, 2, 3])).is_err());
    }
}
