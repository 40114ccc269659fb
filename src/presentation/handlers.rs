// HTTP request handlers
use crate::application::equipment_view::ViewSnapshot;
use crate::application::view_service::ViewError;
use crate::domain::chart::ChartRow;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no equipment view is open")]
    NoActiveView,
    #[error(transparent)]
    View(#[from] ViewError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NoActiveView => StatusCode::NOT_FOUND,
            ApiError::View(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub all: Option<bool>,
}

#[derive(Deserialize)]
pub struct SelectionBody {
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Serialize)]
pub struct ChartResponse {
    pub equipment_id: String,
    pub event_count: usize,
    pub columns: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl ChartResponse {
    fn from_snapshot(snapshot: &ViewSnapshot, all: bool) -> Self {
        let table = if all {
            snapshot.table.clone()
        } else {
            snapshot.visible_table()
        };
        Self {
            equipment_id: snapshot.equipment_id.clone(),
            event_count: snapshot.event_count,
            columns: table.columns,
            rows: table.rows,
        }
    }
}

#[derive(Serialize)]
pub struct FeaturesResponse {
    pub equipment_id: String,
    pub features: Vec<String>,
    pub selected: Vec<String>,
    pub visible: Vec<String>,
}

impl From<&ViewSnapshot> for FeaturesResponse {
    fn from(snapshot: &ViewSnapshot) -> Self {
        Self {
            equipment_id: snapshot.equipment_id.clone(),
            features: snapshot.features.iter().map(str::to_string).collect(),
            selected: snapshot.selected.iter().map(str::to_string).collect(),
            visible: snapshot.visible_features(),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Open the detail view for one equipment unit, replacing any open view
pub async fn open_view(
    Path(equipment_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartResponse>, ApiError> {
    if let Some(handle) = state.active().await {
        match handle.switch_to(&equipment_id).await {
            Ok(snapshot) => return Ok(Json(ChartResponse::from_snapshot(&snapshot, false))),
            Err(e) => tracing::warn!(error = %e, "active view is gone, reopening"),
        }
    }

    let handle = Arc::new(state.view_service.open(&equipment_id).await);
    let snapshot = handle.snapshot();
    *state.active_view.lock().await = Some(handle);
    Ok(Json(ChartResponse::from_snapshot(&snapshot, false)))
}

/// Close the active view and discard its buffer
pub async fn close_view(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let handle = state.active_view.lock().await.take().ok_or(ApiError::NoActiveView)?;
    tracing::info!(equipment_id = %handle.equipment_id(), "view closed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_chart(
    Query(query): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartResponse>, ApiError> {
    let handle = state.active().await.ok_or(ApiError::NoActiveView)?;
    Ok(Json(ChartResponse::from_snapshot(
        &handle.snapshot(),
        query.all.unwrap_or(false),
    )))
}

pub async fn get_features(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let handle = state.active().await.ok_or(ApiError::NoActiveView)?;
    Ok(Json(FeaturesResponse::from(handle.snapshot().as_ref())))
}

pub async fn put_selection(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionBody>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let handle = state.active().await.ok_or(ApiError::NoActiveView)?;
    let snapshot = handle.select(body.features).await?;
    Ok(Json(FeaturesResponse::from(snapshot.as_ref())))
}

pub async fn clear_selection(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let handle = state.active().await.ok_or(ApiError::NoActiveView)?;
    let snapshot = handle.clear_selection().await?;
    Ok(Json(FeaturesResponse::from(snapshot.as_ref())))
}

pub async fn toggle_feature(
    Path(feature): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let handle = state.active().await.ok_or(ApiError::NoActiveView)?;
    let snapshot = handle.toggle(&feature).await?;
    Ok(Json(FeaturesResponse::from(snapshot.as_ref())))
}
