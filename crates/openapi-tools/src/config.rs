use std::time::Duration;

/// Connection settings for an `OpenAPI` tool source.
#[derive(Debug, Clone)]
pub struct ToolSourceConfig {
    /// Base URL every operation path is appended to (e.g. `http://127.0.0.1:25503/v3`).
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl ToolSourceConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}
