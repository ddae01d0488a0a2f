//! Full scan of the spec into per-operation endpoint records.

use crate::METHODS;
use crate::extract::annotation;
use serde_json::Value;

const DISPLAY_NAME_MAX_CHARS: usize = 80;

/// One documented endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord {
    pub path: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Operation summary, else the start of its description; may be empty.
    pub display_name: String,
    /// Effective tier: the operation annotation, else the path default.
    pub tier: String,
    /// Set when the record was inferred from a path-level tier on a path without operations.
    /// Such records always assume `GET`.
    pub synthetic: bool,
}

/// Human-readable name of an operation: its summary, else the first line of its description cut
/// to 80 characters, else empty.
#[must_use]
pub fn display_name(operation: &Value) -> String {
    if let Some(summary) = operation
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return summary.to_string();
    }

    operation
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .and_then(|d| d.lines().next())
        .map(|line| line.chars().take(DISPLAY_NAME_MAX_CHARS).collect())
        .unwrap_or_default()
}

/// Scan every path of the spec.
///
/// Operations without an effective tier are left out. Malformed path items (non-mappings) and
/// non-mapping operations are skipped.
#[must_use]
pub fn scan_endpoints(spec: &Value) -> Vec<EndpointRecord> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for (path, item) in paths {
        if !item.is_object() {
            continue;
        }
        let path_tier = annotation(item);

        let operations: Vec<(&str, &Value)> = METHODS
            .iter()
            .filter_map(|m| item.get(*m).filter(|op| op.is_object()).map(|op| (*m, op)))
            .collect();

        if operations.is_empty() {
            if let Some(tier) = path_tier {
                records.push(EndpointRecord {
                    path: path.clone(),
                    method: "GET".to_string(),
                    display_name: String::new(),
                    tier: tier.to_string(),
                    synthetic: true,
                });
            }
            continue;
        }

        for (method, op) in operations {
            let Some(tier) = annotation(op).or(path_tier) else {
                continue;
            };
            records.push(EndpointRecord {
                path: path.clone(),
                method: method.to_ascii_uppercase(),
                display_name: display_name(op),
                tier: tier.to_string(),
                synthetic: false,
            });
        }
    }

    records
}
