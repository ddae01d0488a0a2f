//! Request/response interception for outbound tool calls.
//!
//! An interceptor is installed on a tool source when it is built. Every outgoing request passes
//! through [`HttpInterceptor::on_request`] right before dispatch, and every response passes
//! through [`HttpInterceptor::on_response`] after its body has been read, before the tool source
//! inspects the status or decodes the body.

use crate::error::Result;
use mime::Mime;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct InterceptedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl InterceptedResponse {
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Whether the content type names a JSON payload (`application/json`, `+json` suffixes,
    /// `application/x-ndjson`, ...).
    #[must_use]
    pub fn is_json(&self) -> bool {
        let Some(ct) = self.content_type() else {
            return false;
        };
        match ct.parse::<Mime>() {
            Ok(m) => {
                m.subtype() == mime::JSON
                    || m.suffix() == Some(mime::JSON)
                    || m.subtype().as_str().contains("json")
            }
            Err(_) => ct.to_ascii_lowercase().contains("json"),
        }
    }
}

/// Hook pair wrapped around the HTTP transport of a tool source.
///
/// Implementations must be stateless with respect to individual calls: the same interceptor is
/// shared by all concurrent tool calls.
pub trait HttpInterceptor: Send + Sync {
    /// Rewrite an outgoing request in place.
    ///
    /// # Errors
    ///
    /// An error aborts the tool call before anything is sent.
    fn on_request(&self, _request: &mut reqwest::Request) -> Result<()> {
        Ok(())
    }

    /// Rewrite an inbound response. This hook cannot fail; return the input to pass through.
    fn on_response(&self, response: InterceptedResponse) -> InterceptedResponse {
        response
    }
}

/// Interceptor that forwards requests and responses untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl HttpInterceptor for Passthrough {}
