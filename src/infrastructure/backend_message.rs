// Decoder for messages pushed by the monitoring backend
use crate::domain::sensor_event::{RawTimestamp, SensorEvent, SensorValue};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GraphData {
    #[serde(default)]
    nodes: Vec<GraphNode>,
}

#[derive(Debug, Deserialize)]
struct GraphNode {
    data: NodeData,
}

#[derive(Debug, Deserialize)]
struct NodeData {
    equipment_id: String,
    #[serde(default)]
    sensors: Vec<NodeSensor>,
}

#[derive(Debug, Deserialize)]
struct NodeSensor {
    sensor_type: String,
    #[serde(default)]
    value: SensorValue,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    timestamp: Option<RawTimestamp>,
    #[serde(default)]
    status: Option<String>,
}

impl NodeSensor {
    fn into_event(self, equipment_id: &str) -> SensorEvent {
        SensorEvent {
            equipment_id: equipment_id.to_string(),
            sensor_type: self.sensor_type,
            value: self.value,
            unit: self.unit.filter(|u| !u.is_empty()),
            timestamp: self.timestamp,
            status: self.status,
        }
    }
}

/// Decode one JSON document into sensor events.
///
/// Accepts either a flat reading (`equipment_id`, `sensor_type`, `value`, ...) or a
/// typed envelope. A `graph_update` expands into one event per node sensor; other
/// envelope types (alerts, status) carry no readings and decode to nothing.
pub fn decode_message(text: &str) -> Result<Vec<SensorEvent>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;

    // Raw device payloads may carry their own "type" field; only {type, data} is an envelope.
    let kind = match (value.get("type"), value.get("data")) {
        (Some(Value::String(kind)), Some(_)) => Some(kind.clone()),
        _ => None,
    };
    match kind.as_deref() {
        Some("graph_update") => {
            let data = value.get("data").cloned().unwrap_or(Value::Null);
            let graph: GraphData = serde_json::from_value(data)?;
            Ok(graph
                .nodes
                .into_iter()
                .flat_map(|node| {
                    let NodeData {
                        equipment_id,
                        sensors,
                    } = node.data;
                    sensors
                        .into_iter()
                        .map(move |sensor| sensor.into_event(&equipment_id))
                })
                .collect())
        }
        Some(other) => {
            tracing::trace!(message_type = %other, "ignoring non-reading message");
            Ok(Vec::new())
        }
        None => {
            let mut event: SensorEvent = serde_json::from_value(value)?;
            event.unit = event.unit.filter(|u| !u.is_empty());
            Ok(vec![event])
        }
    }
}
