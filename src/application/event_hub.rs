// Event hub - fans one ingress connection out to every open view
use crate::application::event_source::{EventSource, into_event_stream};
use crate::domain::sensor_event::SensorEvent;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<SensorEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SensorEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of views that received the event.
    pub fn publish(&self, event: SensorEvent) -> usize {
        // No open view is not an error; the reading is simply not charted.
        self.tx.send(event).unwrap_or(0)
    }

    /// Pump a source into the hub until the source is exhausted.
    pub fn spawn_ingress<S>(&self, source: S) -> JoinHandle<()>
    where
        S: EventSource + 'static,
    {
        let hub = self.clone();
        let name = source.name().to_string();

        tokio::spawn(async move {
            tracing::info!(source = %name, "starting ingress");
            let mut stream = Box::pin(into_event_stream(source));
            let mut forwarded: u64 = 0;

            while let Some(event) = stream.next().await {
                let receivers = hub.publish(event);
                forwarded += 1;
                tracing::trace!(receivers, "event forwarded");
            }

            tracing::info!(source = %name, forwarded, "ingress stopped");
        })
    }
}
