// Sensor event domain model - one timestamped reading from one sensor
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload carried by a sensor reading.
///
/// Upstream payloads are untyped JSON, so every shape a broker may deliver maps
/// onto one of these variants. Composition members keep their wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum SensorValue {
    Number(f64),
    Text(String),
    Composition(Vec<(String, SensorValue)>),
    Other(Value),
}

impl SensorValue {
    /// Project the payload onto a chartable scalar.
    ///
    /// - numbers pass through
    /// - numeric strings are parsed, anything unparseable becomes 0
    /// - compositions yield their first numeric member, or 0 when there is none
    /// - every other shape becomes 0
    ///
    /// Non-finite results are reported as 0 so the output is always plottable.
    pub fn coerce(&self) -> f64 {
        let raw = match self {
            SensorValue::Number(v) => *v,
            SensorValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            SensorValue::Composition(members) => members
                .iter()
                .find_map(|(_, member)| match member {
                    SensorValue::Number(v) => Some(*v),
                    _ => None,
                })
                .unwrap_or(0.0),
            SensorValue::Other(_) => 0.0,
        };

        if raw.is_finite() { raw } else { 0.0 }
    }
}

impl Default for SensorValue {
    fn default() -> Self {
        SensorValue::Other(Value::Null)
    }
}

impl From<Value> for SensorValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(v) => SensorValue::Number(v),
                None => SensorValue::Other(Value::Number(n)),
            },
            Value::String(s) => SensorValue::Text(s),
            Value::Object(map) => SensorValue::Composition(
                map.into_iter()
                    .map(|(key, member)| (key, SensorValue::from(member)))
                    .collect(),
            ),
            other => SensorValue::Other(other),
        }
    }
}

impl From<SensorValue> for Value {
    fn from(value: SensorValue) -> Self {
        match value {
            SensorValue::Number(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SensorValue::Text(s) => Value::String(s),
            SensorValue::Composition(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(key, member)| (key, Value::from(member)))
                    .collect(),
            ),
            SensorValue::Other(v) => v,
        }
    }
}

impl From<f64> for SensorValue {
    fn from(value: f64) -> Self {
        SensorValue::Number(value)
    }
}

impl From<&str> for SensorValue {
    fn from(value: &str) -> Self {
        SensorValue::Text(value.to_string())
    }
}

/// Timestamp exactly as it arrived on the wire.
///
/// Kept raw so events with unusable timestamps stay in the buffer history;
/// [`RawTimestamp::epoch_ms`] decides whether the event can be placed on a time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RawTimestamp {
    EpochMillis(f64),
    Text(String),
    Invalid(Value),
}

impl RawTimestamp {
    pub fn epoch_ms(&self) -> Option<i64> {
        match self {
            RawTimestamp::EpochMillis(ms) if ms.is_finite() => Some(ms.trunc() as i64),
            RawTimestamp::EpochMillis(_) => None,
            RawTimestamp::Text(s) => parse_timestamp_text(s),
            RawTimestamp::Invalid(_) => None,
        }
    }
}

// Python producers emit naive ISO strings from datetime.now().isoformat(); those are read as UTC.
fn parse_timestamp_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

impl From<Value> for RawTimestamp {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(ms) => RawTimestamp::EpochMillis(ms),
                None => RawTimestamp::Invalid(Value::Number(n)),
            },
            Value::String(s) => RawTimestamp::Text(s),
            other => RawTimestamp::Invalid(other),
        }
    }
}

impl From<RawTimestamp> for Value {
    fn from(value: RawTimestamp) -> Self {
        match value {
            RawTimestamp::EpochMillis(ms) => serde_json::Number::from_f64(ms)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawTimestamp::Text(s) => Value::String(s),
            RawTimestamp::Invalid(v) => v,
        }
    }
}

/// One observation from one sensor on one equipment unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub equipment_id: String,
    pub sensor_type: String,
    #[serde(default)]
    pub value: SensorValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SensorEvent {
    pub fn new(
        equipment_id: impl Into<String>,
        sensor_type: impl Into<String>,
        value: impl Into<SensorValue>,
    ) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            sensor_type: sensor_type.into(),
            value: value.into(),
            unit: None,
            timestamp: None,
            status: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_epoch_ms(mut self, ms: i64) -> Self {
        self.timestamp = Some(RawTimestamp::EpochMillis(ms as f64));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(RawTimestamp::Text(timestamp.to_rfc3339()));
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Epoch milliseconds of the reading, or `None` when it cannot be placed in time.
    pub fn epoch_ms(&self) -> Option<i64> {
        self.timestamp.as_ref().and_then(RawTimestamp::epoch_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(SensorValue::from(42.5).coerce(), 42.5);
        assert_eq!(SensorValue::from("12.5").coerce(), 12.5);
        assert_eq!(SensorValue::from(" 7 ").coerce(), 7.0);
        assert_eq!(SensorValue::from("abc").coerce(), 0.0);
        assert_eq!(SensorValue::from("").coerce(), 0.0);
        assert_eq!(SensorValue::from("NaN").coerce(), 0.0);
    }

    #[test]
    fn test_coerce_composition_takes_first_numeric_member() {
        let value = SensorValue::from(json!({"iron": 80, "carbon": 3}));
        assert_eq!(value.coerce(), 80.0);

        let value = SensorValue::from(json!({"label": "steel", "grade": "7", "Fe": 21.5, "Cr": 19}));
        assert_eq!(value.coerce(), 21.5);

        let value = SensorValue::from(json!({"label": "steel"}));
        assert_eq!(value.coerce(), 0.0);
    }

    #[test]
    fn test_coerce_other_shapes() {
        assert_eq!(SensorValue::from(json!(true)).coerce(), 0.0);
        assert_eq!(SensorValue::from(json!(null)).coerce(), 0.0);
        assert_eq!(SensorValue::from(json!([1, 2])).coerce(), 0.0);
    }

    #[test]
    fn test_timestamp_forms() {
        let rfc = RawTimestamp::from(json!("1970-01-01T00:00:01.500Z"));
        assert_eq!(rfc.epoch_ms(), Some(1500));

        let naive = RawTimestamp::from(json!("1970-01-01T00:00:02.250000"));
        assert_eq!(naive.epoch_ms(), Some(2250));

        let millis = RawTimestamp::from(json!(1700000000123u64));
        assert_eq!(millis.epoch_ms(), Some(1_700_000_000_123));

        assert_eq!(RawTimestamp::from(json!("yesterday")).epoch_ms(), None);
        assert_eq!(RawTimestamp::from(json!(false)).epoch_ms(), None);
    }

    #[test]
    fn test_deserialize_event_with_missing_fields() {
        let event: SensorEvent = serde_json::from_value(json!({
            "equipment_id": "cell_1",
            "sensor_type": "pH",
        }))
        .unwrap();

        assert_eq!(event.value, SensorValue::Other(Value::Null));
        assert_eq!(event.epoch_ms(), None);
        assert_eq!(event.unit, None);
    }

    #[test]
    fn test_composition_keeps_wire_order() {
        let event: SensorEvent = serde_json::from_str(
            r#"{"equipment_id":"furnace_01","sensor_type":"composition",
                "value":{"Ni":25.0,"Al":12.0},"timestamp":1000}"#,
        )
        .unwrap();

        assert_eq!(event.value.coerce(), 25.0);
        assert_eq!(event.epoch_ms(), Some(1000));
    }
}
