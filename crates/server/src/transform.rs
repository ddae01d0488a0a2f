//! Request/response rewriting for calls to the ThetaData terminal.
//!
//! Outgoing requests get a complete date range and a row-oriented response format; inbound JSON
//! bodies wrapped as `{"response": ...}` are unwrapped.

use crate::config::{FormatPolicy, TransformConfig};
use chrono::{Local, NaiveDate};
use reqwest::header::CONTENT_LENGTH;
use serde_json::Value;
use thetadata_http_tools::interceptor::{HttpInterceptor, InterceptedResponse};
use thetadata_http_tools::query::QueryParams;
use thetadata_http_tools::{HttpToolsError, Result};

pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const FORMAT: &str = "format";
pub const ENVELOPE_KEY: &str = "response";

pub struct ThetaTransform {
    config: TransformConfig,
    today: fn() -> NaiveDate,
}

impl ThetaTransform {
    #[must_use]
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            today: || Local::now().date_naive(),
        }
    }

    /// Use `today` instead of the local system date.
    #[must_use]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Yesterday, formatted `YYYY-MM-DD`.
    #[must_use]
    pub fn reference_date(&self) -> String {
        let today = (self.today)();
        today
            .pred_opt()
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Apply date and format defaults to `params`. Returns whether anything changed.
    pub fn rewrite_query(&self, params: &mut QueryParams) -> bool {
        let mut changed = false;

        let start = params.get(START_DATE).cloned();
        let end = params.get(END_DATE).cloned();
        match (start, end) {
            (None, None) => {
                let reference = self.reference_date();
                params.set(START_DATE, reference.as_str());
                params.set(END_DATE, reference);
                changed = true;
            }
            (Some(start), None) => {
                params.set(END_DATE, start);
                changed = true;
            }
            (None, Some(end)) => {
                params.set(START_DATE, end);
                changed = true;
            }
            (Some(_), Some(_)) => {}
        }

        let row = self.config.row_format.as_str();
        let current = params.get(FORMAT).map(|v| v.first().unwrap_or_default());
        let wanted = match (self.config.format_policy, current) {
            (FormatPolicy::Force, Some(v)) if v == row => None,
            (FormatPolicy::Force, _) => Some(row),
            (_, None) => Some(row),
            (_, Some(v)) if v == self.config.legacy_format => Some(row),
            (_, Some(_)) => None,
        };
        if let Some(format) = wanted {
            params.set(FORMAT, format);
            changed = true;
        }

        changed
    }

    /// Replace a `{"response": inner}` JSON body with `inner`.
    ///
    /// Returns `None` when the body is not an envelope.
    #[must_use]
    pub fn unwrap_envelope(body: &[u8]) -> Option<Vec<u8>> {
        let Value::Object(mut map) = serde_json::from_slice::<Value>(body).ok()? else {
            return None;
        };
        if map.len() != 1 {
            return None;
        }
        let inner = map.remove(ENVELOPE_KEY)?;
        serde_json::to_vec(&inner).ok()
    }
}

impl Default for ThetaTransform {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

impl HttpInterceptor for ThetaTransform {
    fn on_request(&self, request: &mut reqwest::Request) -> Result<()> {
        let url = request.url_mut();
        if url.cannot_be_a_base() {
            return Err(HttpToolsError::Interceptor(format!(
                "cannot set query parameters on '{}'",
                url.scheme()
            )));
        }

        let mut params = QueryParams::from_url(url);
        if self.rewrite_query(&mut params) {
            params.apply_to(url);
            tracing::debug!(
                path = %url.path(),
                start_date = params.get(START_DATE).and_then(|v| v.first()).unwrap_or_default(),
                end_date = params.get(END_DATE).and_then(|v| v.first()).unwrap_or_default(),
                format = params.get(FORMAT).and_then(|v| v.first()).unwrap_or_default(),
                "rewrote request query"
            );
        }
        Ok(())
    }

    fn on_response(&self, mut response: InterceptedResponse) -> InterceptedResponse {
        if !response.is_json() {
            return response;
        }
        if let Some(body) = Self::unwrap_envelope(&response.body) {
            tracing::debug!(
                status = response.status.as_u16(),
                "unwrapped response envelope"
            );
            response.body = body;
            response.headers.remove(CONTENT_LENGTH);
        }
        response
    }
}
