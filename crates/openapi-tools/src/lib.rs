//! `OpenAPI` -> MCP tool runtime.
//!
//! Turns the operations of an `OpenAPI` document into MCP tools and executes `tools/call` as
//! outbound HTTP requests. Two seams let the embedding server shape behavior without touching
//! this crate:
//! - an [`HttpInterceptor`](thetadata_http_tools::interceptor::HttpInterceptor) wrapped around
//!   every outbound request/response,
//! - a [`ComponentCustomizer`](component::ComponentCustomizer) invoked once per generated tool.

pub mod component;
pub mod config;
pub mod document;
pub mod error;
pub mod resolver;
pub mod runtime;
