//! HTTP plumbing shared by the `OpenAPI` tool runtime and the ThetaData request transform.
//!
//! This crate contains **no** ThetaData-specific policy: it only defines the interceptor seam,
//! the query-string mapping interceptors work on, and HTTP method semantics.

pub mod error;
pub mod interceptor;
pub mod query;
pub mod redact;
pub mod semantics;

pub use error::{HttpToolsError, Result};
