// HTTP history source - seeds views from the backend's stored message log
use crate::application::history_source::HistorySource;
use crate::domain::sensor_event::SensorEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpHistorySource {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

impl HttpHistorySource {
    pub fn new(base_url: String, project_id: String, limit: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            limit,
        }
    }

    fn messages_url(&self, equipment_id: &str) -> String {
        format!(
            "{}/api/database/messages/{}/{}?limit={}",
            self.base_url,
            urlencoding::encode(&self.project_id),
            urlencoding::encode(equipment_id),
            self.limit
        )
    }
}

/// Stored records carry extra fields (topic, raw payload, ids); keep what parses as a reading.
fn parse_messages(response: MessagesResponse) -> Vec<SensorEvent> {
    let total = response.messages.len();
    let events: Vec<SensorEvent> = response
        .messages
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<SensorEvent>(record) {
            Ok(mut event) => {
                event.unit = event.unit.filter(|u| !u.is_empty());
                Some(event)
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable history record");
                None
            }
        })
        .collect();

    if events.len() < total {
        tracing::warn!(kept = events.len(), total, "some history records could not be read");
    }
    events
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn load(&self, equipment_id: &str) -> Result<Vec<SensorEvent>> {
        let url = self.messages_url(equipment_id);
        tracing::debug!("Fetching history seed: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to history backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("History query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<MessagesResponse>()
            .await
            .context("Failed to parse history response")?;

        Ok(parse_messages(data))
    }
}
