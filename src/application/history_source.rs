// History source trait - one-shot seed of prior readings when a view opens
use crate::domain::sensor_event::SensorEvent;
use async_trait::async_trait;

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Prior readings for one equipment unit, oldest first
    async fn load(&self, equipment_id: &str) -> anyhow::Result<Vec<SensorEvent>>;
}

/// Used when no history backend is configured.
#[derive(Debug, Clone, Default)]
pub struct NoHistory;

#[async_trait]
impl HistorySource for NoHistory {
    async fn load(&self, _equipment_id: &str) -> anyhow::Result<Vec<SensorEvent>> {
        Ok(Vec::new())
    }
}
