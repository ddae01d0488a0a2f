//! Tier lookup for a single path or operation.

use crate::{METHODS, TIER_FIELD};
use serde_json::Value;

/// The tier annotation carried by a path item or operation. Empty strings and non-string values
/// count as "no annotation".
pub(crate) fn annotation(item: &Value) -> Option<&str> {
    item.get(TIER_FIELD)?.as_str().filter(|s| !s.is_empty())
}

pub(crate) fn path_item<'a>(spec: &'a Value, path: &str) -> Option<&'a Value> {
    spec.get("paths")?.get(path).filter(|item| item.is_object())
}

/// Minimum subscription tier for `path` (exact match, no templating).
///
/// The path-level annotation is the default for every method under the path and wins when
/// present. Otherwise the first of `get`, `post`, `put`, `delete`, `patch` whose operation is
/// annotated decides. Unknown paths and malformed path items have no tier.
#[must_use]
pub fn extract_tier<'a>(spec: &'a Value, path: &str) -> Option<&'a str> {
    let item = path_item(spec, path)?;
    annotation(item).or_else(|| {
        METHODS
            .iter()
            .filter_map(|m| item.get(*m))
            .find_map(annotation)
    })
}

/// Minimum subscription tier for one operation: its own annotation, else the path default.
#[must_use]
pub fn extract_operation_tier<'a>(spec: &'a Value, path: &str, method: &str) -> Option<&'a str> {
    let item = path_item(spec, path)?;
    item.get(method.to_ascii_lowercase())
        .and_then(annotation)
        .or_else(|| annotation(item))
}

/// Tag attached to tools: `tier:<name>`, or `tier:unknown` without a tier.
#[must_use]
pub fn tag_for(tier: Option<&str>) -> String {
    match tier {
        Some(t) => format!("tier:{t}"),
        None => "tier:unknown".to_string(),
    }
}
