//! ThetaData MCP server.
//!
//! Exposes every operation of the ThetaData v3 OpenAPI spec as an MCP tool. Tools are tagged and
//! prefixed with the minimum subscription tier they need, and every outbound call goes through
//! [`transform::ThetaTransform`], which fills in date ranges and the response format and unwraps
//! the terminal's `{"response": ...}` envelope.

pub mod config;
pub mod descriptions;
pub mod error;
pub mod server;
pub mod transform;

pub use config::{FormatPolicy, ServerSettings, TransformConfig};
pub use error::{Result, ServerError};
pub use server::{ServerOptions, ThetaDataServer, create_mcp_server};
