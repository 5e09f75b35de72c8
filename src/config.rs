use std::time::Duration;

/// Host of the Notes API backend.
pub const API_BASE_URL: &str = "http://alb-back-docker-env-370693046.us-east-2.elb.amazonaws.com";

/// Path of the notes collection, relative to the base URL.
pub const NOTES_PATH: &str = "/api/notes";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme + host, no trailing slash needed.
    pub base_url: String,
    /// Per-request timeout. `None` waits for the transport to give up.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn notes_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), NOTES_PATH)
    }
}
