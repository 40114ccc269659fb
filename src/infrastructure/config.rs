use crate::application::equipment_view::ViewSettings;
use crate::domain::chart::{InvalidTimeFormat, TimeFormatter};
use crate::infrastructure::simulated_source::MIN_TICK;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const MAX_SAMPLE_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid bind address {0:?}")]
    BindAddress(String),
    #[error(transparent)]
    TimeFormat(#[from] InvalidTimeFormat),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("source.rate_hz {0} must give a sampling period between 1ms and 24h")]
    SampleRate(f64),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub hub: HubSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_display_time_format")]
    pub display_time_format: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            display_time_format: default_display_time_format(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Simulated,
    Stdin,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "default_equipment_count")]
    pub equipment_count: usize,
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            equipment_count: default_equipment_count(),
            rate_hz: default_rate_hz(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistorySettings {
    pub base_url: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: String::new(),
            limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HubSettings {
    #[serde(default = "default_hub_capacity")]
    pub capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            capacity: default_hub_capacity(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_window_seconds() -> u64 {
    30
}

fn default_display_time_format() -> String {
    "%H:%M:%S".to_string()
}

fn default_equipment_count() -> usize {
    2
}

fn default_rate_hz() -> f64 {
    1.0
}

fn default_history_limit() -> usize {
    500
}

fn default_hub_capacity() -> usize {
    1024
}

impl AppConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::BindAddress(self.server.bind.clone()))
    }

    pub fn view_settings(&self) -> Result<ViewSettings, ConfigError> {
        Ok(ViewSettings {
            window: Duration::from_secs(self.view.window_seconds),
            formatter: TimeFormatter::new(self.view.display_time_format.clone())?,
        })
    }

    /// Tick period of the simulated source.
    pub fn sample_period(&self) -> Result<Duration, ConfigError> {
        let rate = self.source.rate_hz;
        if rate.is_nan() || rate <= 0.0 {
            return Err(ConfigError::NotPositive("source.rate_hz"));
        }
        Duration::try_from_secs_f64(rate.recip())
            .ok()
            .filter(|period| (MIN_TICK..=MAX_SAMPLE_PERIOD).contains(period))
            .ok_or(ConfigError::SampleRate(rate))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view.window_seconds == 0 {
            return Err(ConfigError::NotPositive("view.window_seconds"));
        }
        self.sample_period()?;
        if self.source.equipment_count == 0 {
            return Err(ConfigError::NotPositive("source.equipment_count"));
        }
        if self.hub.capacity == 0 {
            return Err(ConfigError::NotPositive("hub.capacity"));
        }
        self.bind_addr()?;
        self.view_settings()?;
        Ok(())
    }
}

/// Load `config/live.*` (optional) overlaid with `LIVE__SECTION__KEY` environment variables.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    load_from(
        config::File::with_name("config/live").required(false),
        config::Environment::with_prefix("LIVE")
            .separator("__")
            .try_parsing(true),
    )
}

fn load_from<F, E>(file: F, env: E) -> Result<AppConfig, ConfigError>
where
    F: config::Source + Send + Sync + 'static,
    E: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?;

    let app: AppConfig = settings.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
