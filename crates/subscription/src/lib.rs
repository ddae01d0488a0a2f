//! Subscription tiers of the ThetaData API.
//!
//! Every endpoint of the ThetaData OpenAPI spec may declare the minimum subscription it needs
//! through the `x-min-subscription` extension, either on the path item (default for all of its
//! methods) or on an individual operation. This crate reads those annotations from the raw spec
//! document; it never mutates the document.

pub mod extract;
pub mod scan;
pub mod tier;

pub use extract::{extract_operation_tier, extract_tier, tag_for};
pub use scan::{EndpointRecord, scan_endpoints};
pub use tier::{Tier, UnknownTier};

/// Extension field carrying the minimum subscription tier.
pub const TIER_FIELD: &str = "x-min-subscription";

/// HTTP methods considered operations, in lookup order.
pub const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];
