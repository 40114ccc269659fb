// Application state for HTTP handlers
use crate::application::view_service::{ViewHandle, ViewService};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub view_service: ViewService,
    /// The equipment detail view currently on screen, if any. Handlers clone
    /// the handle out and release the lock before awaiting the view.
    pub active_view: Mutex<Option<Arc<ViewHandle>>>,
}

impl AppState {
    pub fn new(view_service: ViewService) -> Self {
        Self {
            view_service,
            active_view: Mutex::new(None),
        }
    }

    pub async fn active(&self) -> Option<Arc<ViewHandle>> {
        self.active_view.lock().await.clone()
    }
}
