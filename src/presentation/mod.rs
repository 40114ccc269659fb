// Presentation layer - HTTP surface consumed by the chart UI
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_selection, close_view, get_chart, get_features, health_check, open_view, put_selection,
    toggle_feature,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/equipment/:equipment_id/view", put(open_view))
        .route("/view", delete(close_view))
        .route("/view/chart", get(get_chart))
        .route("/view/features", get(get_features))
        .route("/view/selection", put(put_selection).delete(clear_selection))
        .route("/view/selection/:feature", post(toggle_feature))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::equipment_view::ViewSettings;
    use crate::application::event_hub::EventHub;
    use crate::application::history_source::HistorySource;
    use crate::application::view_service::ViewService;
    use crate::domain::sensor_event::SensorEvent;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    struct SeededHistory;

    #[async_trait]
    impl HistorySource for SeededHistory {
        async fn load(&self, equipment_id: &str) -> anyhow::Result<Vec<SensorEvent>> {
            Ok(vec![
                SensorEvent::new(equipment_id, "temp", 20.0).with_epoch_ms(1000),
                SensorEvent::new(equipment_id, "pressure", 5.0).with_epoch_ms(1000),
                SensorEvent::new(equipment_id, "temp", 21.0).with_epoch_ms(2000),
            ])
        }
    }

    /// Holds the seed of `slow_cell` until released.
    struct GatedHistory {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl HistorySource for GatedHistory {
        async fn load(&self, equipment_id: &str) -> anyhow::Result<Vec<SensorEvent>> {
            if equipment_id == "slow_cell" {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(vec![SensorEvent::new(equipment_id, "temp", 20.0).with_epoch_ms(1000)])
        }
    }

    fn app() -> Router {
        let service = ViewService::new(EventHub::new(16), Arc::new(SeededHistory), ViewSettings::default());
        router(Arc::new(AppState::new(service)))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_string()));
    }

    #[tokio::test]
    async fn test_no_view_is_not_found() {
        let app = app();
        let (status, body) = call(&app, "GET", "/view/chart", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no equipment view is open");

        let (status, _) = call(&app, "DELETE", "/view", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_open_view_returns_seeded_chart() {
        let app = app();
        let (status, body) = call(&app, "PUT", "/equipment/cell_1/view", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["equipment_id"], "cell_1");
        assert_eq!(body["columns"], json!(["pressure", "temp"]));
        assert_eq!(
            body["rows"][1],
            json!({"t": 2000, "index": 1, "displayTime": "00:00:02", "pressure": null, "temp": 21.0})
        );

        let (status, body) = call(&app, "GET", "/view/chart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_selection_shapes_the_chart() {
        let app = app();
        call(&app, "PUT", "/equipment/cell_1/view", None).await;

        let (status, body) = call(&app, "PUT", "/view/selection", Some(json!({"features": ["temp"]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["visible"], json!(["temp"]));
        assert_eq!(body["features"], json!(["pressure", "temp"]));

        let (_, body) = call(&app, "GET", "/view/chart", None).await;
        assert_eq!(body["columns"], json!(["temp"]));
        assert!(body["rows"][0].get("pressure").is_none());

        let (_, body) = call(&app, "GET", "/view/chart?all=true", None).await;
        assert_eq!(body["columns"], json!(["pressure", "temp"]));

        let (_, body) = call(&app, "POST", "/view/selection/temp", None).await;
        assert_eq!(body["selected"], json!([]));
        assert_eq!(body["visible"], json!(["pressure", "temp"]));

        call(&app, "POST", "/view/selection/pressure", None).await;
        let (status, body) = call(&app, "DELETE", "/view/selection", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"], json!([]));
        assert_eq!(body["visible"], json!(["pressure", "temp"]));
    }

    #[tokio::test]
    async fn test_reopening_same_equipment_keeps_view() {
        let app = app();
        call(&app, "PUT", "/equipment/cell_1/view", None).await;
        call(&app, "PUT", "/view/selection", Some(json!({"features": ["temp"]}))).await;

        let (status, body) = call(&app, "PUT", "/equipment/cell_1/view", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_count"], 3);
        assert_eq!(body["columns"], json!(["temp"]));

        let (_, body) = call(&app, "GET", "/view/features", None).await;
        assert_eq!(body["selected"], json!(["temp"]));
    }

    #[tokio::test]
    async fn test_chart_reads_do_not_wait_for_seeding() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let history = GatedHistory {
            entered: entered.clone(),
            release: release.clone(),
        };
        let service = ViewService::new(EventHub::new(16), Arc::new(history), ViewSettings::default());
        let app = router(Arc::new(AppState::new(service)));

        call(&app, "PUT", "/equipment/cell_1/view", None).await;

        let switching = {
            let app = app.clone();
            tokio::spawn(async move { call(&app, "PUT", "/equipment/slow_cell/view", None).await })
        };
        entered.notified().await;

        let (status, body) = tokio::time::timeout(Duration::from_secs(1), call(&app, "GET", "/view/chart", None))
            .await
            .expect("chart read blocked behind history seed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["equipment_id"], "cell_1");

        release.notify_one();
        let (status, body) = switching.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["equipment_id"], "slow_cell");
    }

    #[tokio::test]
    async fn test_switch_and_close() {
        let app = app();
        call(&app, "PUT", "/equipment/cell_1/view", None).await;
        call(&app, "PUT", "/view/selection", Some(json!({"features": ["temp"]}))).await;

        let (status, body) = call(&app, "PUT", "/equipment/cell_2/view", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["equipment_id"], "cell_2");

        let (_, body) = call(&app, "GET", "/view/features", None).await;
        assert_eq!(body["selected"], json!([]));

        let (status, _) = call(&app, "DELETE", "/view", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, "GET", "/view/features", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
