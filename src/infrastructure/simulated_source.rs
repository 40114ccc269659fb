// Simulated cell-on-a-chip sensor feed for demos and local development
use crate::application::event_source::{EventSource, IngressError};
use crate::domain::sensor_event::{SensorEvent, SensorValue};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::f64::consts::TAU;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

/// Shortest tick period the generator runs at; tokio timers resolve to the millisecond.
pub const MIN_TICK: Duration = Duration::from_millis(1);

// Ticks per dropout cycle; the flow sensor is silent for the last third of each cycle.
const DROPOUT_CYCLE: u64 = 60;

#[derive(Debug, Clone)]
struct SimSensor {
    name: &'static str,
    unit: &'static str,
    base: f64,
    amplitude: f64,
    period_ticks: f64,
    min: f64,
    max: f64,
    decimals: i32,
}

impl SimSensor {
    fn reading(&self, tick: u64, phase: f64) -> f64 {
        let angle = TAU * (tick as f64 / self.period_ticks) + phase;
        let value = (self.base + self.amplitude * angle.sin()).clamp(self.min, self.max);
        let scale = 10f64.powi(self.decimals);
        (value * scale).round() / scale
    }
}

fn default_sensors() -> Vec<SimSensor> {
    vec![
        SimSensor { name: "o2_percent", unit: "percent", base: 75.0, amplitude: 8.0, period_ticks: 90.0, min: 40.0, max: 100.0, decimals: 1 },
        SimSensor { name: "pH", unit: "pH", base: 7.40, amplitude: 0.05, period_ticks: 120.0, min: 6.80, max: 7.60, decimals: 3 },
        SimSensor { name: "glucose_mM", unit: "mM", base: 10.0, amplitude: 1.5, period_ticks: 200.0, min: 0.0, max: 25.0, decimals: 3 },
        SimSensor { name: "flow_uL_min", unit: "uL/min", base: 5.0, amplitude: 2.0, period_ticks: 45.0, min: 0.0, max: 20.0, decimals: 2 },
        SimSensor { name: "pressure_mbar", unit: "mbar", base: 58.0, amplitude: 6.0, period_ticks: 45.0, min: 30.0, max: 200.0, decimals: 1 },
    ]
}

/// Deterministic generator of readings for `cell_1..cell_N`.
///
/// Each cycle publishes every sensor of every cell with one shared timestamp,
/// in a rotating order, plus a structured `media_composition` payload. The flow
/// sensor periodically drops out so charts see columns come and go.
pub struct SimulatedSource {
    equipment: Vec<String>,
    sensors: Vec<SimSensor>,
    ticker: Interval,
    tick: u64,
}

impl SimulatedSource {
    pub fn new(equipment_count: usize, period: Duration) -> Self {
        let mut ticker = tokio::time::interval(period.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            equipment: (1..=equipment_count).map(|i| format!("cell_{}", i)).collect(),
            sensors: default_sensors(),
            ticker,
            tick: 0,
        }
    }

    fn cycle(&self, now: DateTime<Utc>) -> Vec<SensorEvent> {
        let tick = self.tick;
        let flow_silent = tick % DROPOUT_CYCLE >= DROPOUT_CYCLE * 2 / 3;
        let rotation = (tick as usize) % self.sensors.len();

        let mut events = Vec::with_capacity(self.equipment.len() * (self.sensors.len() + 1));
        for (cell_idx, equipment_id) in self.equipment.iter().enumerate() {
            let phase = cell_idx as f64 * 0.7;

            for offset in 0..self.sensors.len() {
                let sensor = &self.sensors[(rotation + offset) % self.sensors.len()];
                if flow_silent && sensor.name == "flow_uL_min" {
                    continue;
                }
                events.push(
                    SensorEvent::new(equipment_id.as_str(), sensor.name, sensor.reading(tick, phase))
                        .with_unit(sensor.unit)
                        .with_timestamp(now)
                        .with_status("active"),
                );
            }

            let fe = 70.0 + 2.0 * (TAU * tick as f64 / 150.0 + phase).sin();
            let composition = json!({
                "Fe": (fe * 100.0).round() / 100.0,
                "Cr": 18.0,
                "Ni": (100.0 - fe - 18.0).max(0.0),
            });
            events.push(
                SensorEvent::new(equipment_id.as_str(), "media_composition", SensorValue::from(composition))
                    .with_unit("atomic_percent")
                    .with_timestamp(now)
                    .with_status("active"),
            );
        }
        events
    }
}

#[async_trait]
impl EventSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<SensorEvent>>, IngressError> {
        self.ticker.tick().await;
        // Millisecond precision keeps instants shared across sensors of one cycle.
        let now = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now);
        let batch = self.cycle(now);
        self.tick += 1;
        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cycle_covers_every_cell_and_sensor() {
        let source = SimulatedSource::new(2, Duration::from_millis(100));
        let now = DateTime::from_timestamp_millis(1_000).unwrap();
        let events = source.cycle(now);

        // 5 scalar sensors + composition, for 2 cells
        assert_eq!(events.len(), 12);
        assert!(events.iter().all(|e| e.epoch_ms() == Some(1_000)));
        assert_eq!(events.iter().filter(|e| e.equipment_id == "cell_2").count(), 6);
    }

    #[tokio::test]
    async fn test_flow_sensor_drops_out() {
        let mut source = SimulatedSource::new(1, Duration::from_millis(100));
        source.tick = DROPOUT_CYCLE - 1;
        let now = DateTime::from_timestamp_millis(1_000).unwrap();
        let events = source.cycle(now);

        assert!(events.iter().all(|e| e.sensor_type != "flow_uL_min"));
        assert_eq!(events.len(), 5);
    }

    #[tokio::test]
    async fn test_values_stay_in_range() {
        let mut source = SimulatedSource::new(1, Duration::from_millis(100));
        let now = DateTime::from_timestamp_millis(1_000).unwrap();
        for tick in 0..300 {
            source.tick = tick;
            for event in source.cycle(now) {
                let value = event.value.coerce();
                if event.sensor_type == "pH" {
                    assert!((6.8..=7.6).contains(&value));
                }
                if event.sensor_type == "media_composition" {
                    assert!(value >= 68.0 && value <= 72.0);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_zero_period_runs_at_minimum_tick() {
        let mut source = SimulatedSource::new(1, Duration::ZERO);
        assert_eq!(source.ticker.period(), MIN_TICK);
        assert!(!source.next_batch().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_next_batch_advances() {
        let mut source = SimulatedSource::new(1, Duration::from_millis(10));
        let first = source.next_batch().await.unwrap().unwrap();
        assert!(!first.is_empty());
        assert_eq!(source.tick, 1);
    }
}
