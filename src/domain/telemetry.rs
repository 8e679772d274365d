// Telemetry data domain models
use crate::domain::channel::Axis;
use crate::error::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device clocks below this value are reporting epoch seconds rather than milliseconds.
pub const SECONDS_THRESHOLD: f64 = 10_000_000_000.0;

/// Convert a device timestamp to epoch milliseconds.
pub fn normalize_timestamp(raw: f64) -> i64 {
    if raw < SECONDS_THRESHOLD {
        (raw * 1000.0).round() as i64
    } else {
        raw.round() as i64
    }
}

/// One persisted record of a session log.
///
/// Everything besides the timestamp is kept verbatim so a replay returns exactly
/// what the device sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DataPoint {
    pub fn new(timestamp: i64, sensors: Map<String, Value>) -> Self {
        let mut fields = Map::new();
        fields.insert("sensors".to_string(), Value::Object(sensors));
        Self { timestamp, fields }
    }

    /// Sensor readings keyed by channel name, if the device sent any.
    pub fn sensors(&self) -> Option<&Map<String, Value>> {
        self.fields.get("sensors").and_then(Value::as_object)
    }

    /// Validate and normalize an ingestion batch.
    ///
    /// The whole batch is rejected on the first point without a usable timestamp,
    /// so callers never persist part of a batch.
    pub fn from_raw_batch(raw: Vec<Value>) -> Result<Vec<DataPoint>> {
        let mut points = Vec::with_capacity(raw.len());

        for (index, value) in raw.into_iter().enumerate() {
            let mut fields = match value {
                Value::Object(fields) => fields,
                _ => return Err(TelemetryError::missing_timestamp(index)),
            };

            let raw_timestamp = fields
                .remove("timestamp")
                .ok_or_else(|| TelemetryError::missing_timestamp(index))?;
            let timestamp = parse_timestamp(&raw_timestamp, index)?;

            points.push(DataPoint {
                timestamp: normalize_timestamp(timestamp),
                fields,
            });
        }

        Ok(points)
    }
}

/// Devices send numbers or numeric strings; zero and empty values count as absent.
fn parse_timestamp(value: &Value, index: usize) -> Result<f64> {
    let parsed = match value {
        Value::Null | Value::Bool(false) => return Err(TelemetryError::missing_timestamp(index)),
        Value::String(s) if s.trim().is_empty() => {
            return Err(TelemetryError::missing_timestamp(index));
        }
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(t) if t == 0.0 => Err(TelemetryError::missing_timestamp(index)),
        Some(t) if t.is_finite() => Ok(t),
        _ => Err(TelemetryError::invalid_timestamp(index)),
    }
}

/// Response body of the point-set query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataBatch {
    pub data: Vec<DataPoint>,
    /// Session the points were read from; lets viewers drop answers for a session they left.
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GyroReading {
    pub angular_velocity: Vector3,
    pub acceleration: Vector3,
    pub resultant_acceleration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MotorReading {
    pub value: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// One rendered sample: x is epoch milliseconds, y the reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}
