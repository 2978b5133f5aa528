//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::ControllerSettings;

/// Quest service address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BATCH_STEP_DELAY_MS: u64 = 600;
const DEFAULT_CELEBRATION_SECS: u64 = 5;

/// Settings for reaching the quest service and pacing the controller.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TIDEQUEST")]
pub struct QuestClientSettings {
    /// Quest service base URL; endpoints live under `{api_url}/api`.
    pub api_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Pause between batch completions in milliseconds.
    pub batch_step_delay_ms: Option<u64>,
    /// Seconds a level-up celebration stays visible.
    pub celebration_secs: Option<u64>,
    /// Use the in-process service instead of HTTP.
    #[ortho_config(default = false)]
    pub offline: bool,
}

impl QuestClientSettings {
    /// Parse the configured base URL, falling back to [`DEFAULT_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns the parse error for a malformed URL.
    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                .max(1),
        )
    }

    pub fn batch_step_delay(&self) -> Duration {
        Duration::from_millis(
            self.batch_step_delay_ms
                .unwrap_or(DEFAULT_BATCH_STEP_DELAY_MS),
        )
    }

    pub fn celebration_window(&self) -> Duration {
        Duration::from_secs(self.celebration_secs.unwrap_or(DEFAULT_CELEBRATION_SECS))
    }

    /// Controller timing derived from these settings.
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            batch_step_delay: self.batch_step_delay(),
            celebration_window: self.celebration_window(),
        }
    }
}
