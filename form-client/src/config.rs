//! Client configuration

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the record server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Project the records belong to, sent as `X-Project-Id`
    pub project_id: Option<String>,

    /// API key, sent as `X-Api-Key`
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `RECORD_SERVER_URL`, `RECORD_PROJECT_ID`, `RECORD_API_KEY` and
    /// `RECORD_TIMEOUT_SECS`
    ///
    /// Returns `None` when no server URL is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("RECORD_SERVER_URL")
            .ok()
            .filter(|url| !url.is_empty())?;

        let mut config = Self::new(base_url);
        config.project_id = std::env::var("RECORD_PROJECT_ID").ok().filter(|v| !v.is_empty());
        config.api_key = std::env::var("RECORD_API_KEY").ok().filter(|v| !v.is_empty());
        config.timeout = std::env::var("RECORD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(config)
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}
