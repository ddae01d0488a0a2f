//! Error types for `thetadata-http-tools`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpToolsError {
    /// An interceptor refused or failed to rewrite an outgoing request.
    #[error("request interceptor error: {0}")]
    Interceptor(String),
}

pub type Result<T> = std::result::Result<T, HttpToolsError>;
