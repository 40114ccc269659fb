// View service - runs an equipment view as a task fed by the event hub
use crate::application::equipment_view::{EquipmentView, ViewSettings, ViewSnapshot};
use crate::application::event_hub::EventHub;
use crate::application::history_source::HistorySource;
use crate::domain::sensor_event::SensorEvent;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

const COMMAND_QUEUE: usize = 16;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("view task is no longer running")]
    Closed,
}

enum ViewAction {
    Switch(String),
    Select(Vec<String>),
    Toggle(String),
    ClearSelection,
}

struct ViewCommand {
    action: ViewAction,
    reply: oneshot::Sender<Arc<ViewSnapshot>>,
}

#[derive(Clone)]
pub struct ViewService {
    hub: EventHub,
    history: Arc<dyn HistorySource>,
    settings: ViewSettings,
}

impl ViewService {
    pub fn new(hub: EventHub, history: Arc<dyn HistorySource>, settings: ViewSettings) -> Self {
        Self {
            hub,
            history,
            settings,
        }
    }

    /// Open a view on one equipment unit, seeded from history.
    pub async fn open(&self, equipment_id: &str) -> ViewHandle {
        // Subscribe before loading history so nothing published meanwhile is lost.
        let events = self.hub.subscribe();

        let mut view = EquipmentView::open(equipment_id, self.settings.clone());
        seed_view(&mut view, self.history.as_ref()).await;

        let (publisher, snapshots) = watch::channel(Arc::new(view.snapshot()));
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE);

        let task = tokio::spawn(run_view(
            view,
            self.history.clone(),
            events,
            command_rx,
            publisher,
        ));

        tracing::info!(equipment_id = %equipment_id, "view opened");

        ViewHandle {
            snapshots,
            commands,
            task,
        }
    }
}

async fn seed_view(view: &mut EquipmentView, history: &dyn HistorySource) {
    let equipment_id = view.equipment_id().to_string();
    match history.load(&equipment_id).await {
        Ok(events) => {
            let offered = events.len();
            let accepted = view.seed(events);
            tracing::info!(equipment_id = %equipment_id, offered, accepted, "history seed loaded");
        }
        Err(e) => {
            tracing::warn!(equipment_id = %equipment_id, error = %e, "history seed failed, starting empty");
        }
    }
}

async fn run_view(
    mut view: EquipmentView,
    history: Arc<dyn HistorySource>,
    events: broadcast::Receiver<SensorEvent>,
    mut commands: mpsc::Receiver<ViewCommand>,
    publisher: watch::Sender<Arc<ViewSnapshot>>,
) {
    let mut events = BroadcastStream::new(events);
    let mut hub_open = true;

    loop {
        tokio::select! {
            item = events.next(), if hub_open => match item {
                Some(Ok(event)) => {
                    if event.equipment_id != view.equipment_id() {
                        continue;
                    }
                    match view.append(event) {
                        Ok(()) => {
                            publisher.send_replace(Arc::new(view.snapshot()));
                        }
                        Err(e) => tracing::debug!(error = %e, "event refused"),
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::warn!(equipment_id = %view.equipment_id(), skipped, "view lagged behind ingress");
                }
                None => {
                    tracing::info!(equipment_id = %view.equipment_id(), "event hub closed");
                    hub_open = false;
                }
            },
            command = commands.recv() => {
                let Some(ViewCommand { action, reply }) = command else {
                    break;
                };
                match action {
                    ViewAction::Switch(equipment_id) if equipment_id == view.equipment_id() => {
                        tracing::debug!(equipment_id = %equipment_id, "view already shows this equipment");
                    }
                    ViewAction::Switch(equipment_id) => {
                        tracing::info!(from = %view.equipment_id(), to = %equipment_id, "switching view");
                        view.switch_to(equipment_id);
                        seed_view(&mut view, history.as_ref()).await;
                    }
                    ViewAction::Select(features) => view.select(features),
                    ViewAction::Toggle(feature) => {
                        view.toggle(&feature);
                    }
                    ViewAction::ClearSelection => view.clear_selection(),
                }
                let snapshot = Arc::new(view.snapshot());
                publisher.send_replace(snapshot.clone());
                let _ = reply.send(snapshot);
            }
        }
    }

    tracing::debug!(equipment_id = %view.equipment_id(), "view task finished");
}

/// Owner of a running view. Dropping the handle tears the view down and
/// discards its buffer.
pub struct ViewHandle {
    snapshots: watch::Receiver<Arc<ViewSnapshot>>,
    commands: mpsc::Sender<ViewCommand>,
    task: JoinHandle<()>,
}

impl ViewHandle {
    pub fn snapshot(&self) -> Arc<ViewSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewSnapshot>> {
        self.snapshots.clone()
    }

    pub fn equipment_id(&self) -> String {
        self.snapshots.borrow().equipment_id.clone()
    }

    pub async fn switch_to(&self, equipment_id: &str) -> Result<Arc<ViewSnapshot>, ViewError> {
        self.send(ViewAction::Switch(equipment_id.to_string())).await
    }

    pub async fn select(&self, features: Vec<String>) -> Result<Arc<ViewSnapshot>, ViewError> {
        self.send(ViewAction::Select(features)).await
    }

    pub async fn toggle(&self, feature: &str) -> Result<Arc<ViewSnapshot>, ViewError> {
        self.send(ViewAction::Toggle(feature.to_string())).await
    }

    pub async fn clear_selection(&self) -> Result<Arc<ViewSnapshot>, ViewError> {
        self.send(ViewAction::ClearSelection).await
    }

    async fn send(&self, action: ViewAction) -> Result<Arc<ViewSnapshot>, ViewError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(ViewCommand { action, reply })
            .await
            .map_err(|_| ViewError::Closed)?;
        response.await.map_err(|_| ViewError::Closed)
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
