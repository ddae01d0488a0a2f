//! Server settings resolution and transform configuration.

use crate::error::{Result, ServerError};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:25503/v3";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

pub const ENV_BASE_URL: &str = "THETADATA_BASE_URL";
pub const ENV_TIMEOUT: &str = "THETADATA_TIMEOUT";

/// Upstream connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl ServerSettings {
    /// Resolve settings: explicit value, then environment, then defaults.
    ///
    /// # Errors
    ///
    /// Fails when a timeout (explicit or from `THETADATA_TIMEOUT`) is not a positive number of
    /// seconds.
    pub fn resolve(base_url: Option<String>, timeout: Option<f64>) -> Result<Self> {
        Self::resolve_with(base_url, timeout, |key| std::env::var(key).ok())
    }

    /// Like [`Self::resolve`], reading the environment through `env`.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub fn resolve_with(
        base_url: Option<String>,
        timeout: Option<f64>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env(ENV_BASE_URL).filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let secs = match timeout {
            Some(secs) => secs,
            None => match env(ENV_TIMEOUT) {
                Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                    ServerError::Config(format!("{ENV_TIMEOUT} must be a number, got '{raw}'"))
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ServerError::Config(format!(
                "timeout must be a positive number of seconds, got {secs}"
            )));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs_f64(secs),
        })
    }
}

/// How the `format` query parameter is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatPolicy {
    /// Fill in the row format when absent and upgrade the legacy token; keep anything else.
    #[default]
    Default,
    /// Hide `format` from tool schemas; requests behave like `default`.
    Strip,
    /// Always request the row format.
    Force,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    pub format_policy: FormatPolicy,
    /// Row-oriented JSON token sent upstream.
    pub row_format: String,
    /// Legacy JSON token upgraded to `row_format`.
    pub legacy_format: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            format_policy: FormatPolicy::Default,
            row_format: "ndjson".to_string(),
            legacy_format: "json".to_string(),
        }
    }
}
