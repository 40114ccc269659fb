// Event source trait - transport-agnostic ingress of sensor readings
use crate::domain::sensor_event::SensorEvent;
use async_trait::async_trait;
use futures::stream::Stream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("failed to read from event source: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait EventSource: Send {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Next batch of readings, or `None` once the source is exhausted.
    ///
    /// A single upstream message may carry readings for several sensors, hence a batch.
    async fn next_batch(&mut self) -> Result<Option<Vec<SensorEvent>>, IngressError>;
}

/// Flatten a source into a stream of single events.
///
/// The stream ends when the source is exhausted or fails.
pub fn into_event_stream<S>(mut source: S) -> impl Stream<Item = SensorEvent> + Send
where
    S: EventSource + 'static,
{
    async_stream::stream! {
        loop {
            match source.next_batch().await {
                Ok(Some(batch)) => {
                    for event in batch {
                        yield event;
                    }
                }
                Ok(None) => {
                    tracing::info!(source = %source.name(), "event source exhausted");
                    break;
                }
                Err(e) => {
                    tracing::error!(source = %source.name(), error = %e, "event source failed");
                    break;
                }
            }
        }
    }
}
