//! Error types for `thetadata-openapi-tools`.

use thetadata_http_tools::HttpToolsError;
use thiserror::Error;

/// Main error type for `OpenAPI` tooling.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// Configuration errors (invalid base URL, unusable settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime errors (unknown tool, invalid arguments).
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// The upstream API answered with a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// `OpenAPI` errors (unresolvable refs, unsupported constructs).
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    #[error("OpenAPI error: failed to read spec file '{path}': {source}")]
    OpenApiSpecReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI error: failed to parse OpenAPI spec from '{location}': {source}")]
    OpenApiSpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("OpenAPI error: '{location}' is not a valid OpenAPI 3 document: {source}")]
    OpenApiSpecInvalid {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Parameter collision errors.
    #[error("Parameter collision: {0}")]
    ParamCollision(String),

    /// The request interceptor rejected an outbound request.
    #[error(transparent)]
    Interceptor(#[from] HttpToolsError),

    /// HTTP client errors (transport failures, timeouts).
    #[error("Request error: {0}")]
    Request(String),
}

/// Result type alias for `OpenAPI` tooling operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
