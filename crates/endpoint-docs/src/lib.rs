//! Per-tier endpoint documentation.
//!
//! Every tier gets one markdown file listing all endpoints available with that subscription,
//! i.e. the endpoints of the tier itself and of every tier below it in the hierarchy.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thetadata_subscription::{EndpointRecord, Tier, scan_endpoints};

/// Categories (first path segment) that are documented, in output order.
pub const CATEGORY_ORDER: [&str; 4] = ["Stock", "Option", "Index", "Calendar"];

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("malformed spec: {0}")]
    MalformedSpec(String),

    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DocsError>;

/// The default tier hierarchy, ascending.
#[must_use]
pub fn default_tiers() -> Vec<String> {
    Tier::ALL.iter().map(|t| t.as_str().to_string()).collect()
}

/// A rendered document for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDocument {
    pub tier: String,
    pub file_name: String,
    pub content: String,
    /// Cumulative number of endpoints up to and including this tier, before category filtering.
    pub endpoint_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    Generated(TierDocument),
    /// The tier has no endpoints of its own; nothing is written for it.
    Missing(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcomes: Vec<TierOutcome>,
    /// Endpoints across every tier bucket in the spec, including tiers outside the hierarchy.
    pub total_endpoints: usize,
}

impl GenerationReport {
    pub fn documents(&self) -> impl Iterator<Item = &TierDocument> {
        self.outcomes.iter().filter_map(|o| match o {
            TierOutcome::Generated(doc) => Some(doc),
            TierOutcome::Missing(_) => None,
        })
    }
}

/// Group scanned endpoints by their raw tier value.
#[must_use]
pub fn group_by_tier(records: Vec<EndpointRecord>) -> BTreeMap<String, Vec<EndpointRecord>> {
    let mut buckets: BTreeMap<String, Vec<EndpointRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.tier.clone()).or_default().push(record);
    }
    buckets
}

/// Order requested tier names by the tier hierarchy. Names that are not known tiers follow in
/// the order given. Duplicates are dropped.
#[must_use]
pub fn order_tiers(tiers: &[String]) -> Vec<String> {
    let mut known: Vec<(Tier, &String)> = Vec::new();
    let mut other: Vec<&String> = Vec::new();
    for name in tiers {
        match name.parse::<Tier>() {
            Ok(tier) if !known.iter().any(|(t, _)| *t == tier) => known.push((tier, name)),
            Ok(_) => {}
            Err(_) if !other.contains(&name) => other.push(name),
            Err(_) => {}
        }
    }
    known.sort_by_key(|(tier, _)| *tier);
    known
        .into_iter()
        .map(|(_, name)| name)
        .chain(other)
        .cloned()
        .collect()
}

/// The root must be a mapping and `paths`, when present, a mapping. Individual malformed path
/// items are tolerated and skipped by the scan.
fn check_shape(spec: &Value) -> Result<()> {
    let Some(root) = spec.as_object() else {
        return Err(DocsError::MalformedSpec(
            "document root is not a mapping".to_string(),
        ));
    };
    match root.get("paths") {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(DocsError::MalformedSpec(
            "`paths` is not a mapping".to_string(),
        )),
    }
}

/// Render every requested tier from the raw spec document, lowest tier first.
///
/// # Errors
///
/// Fails without rendering anything if the document is not a mapping or its `paths` is not a
/// mapping.
pub fn generate(spec: &Value, tiers: &[String]) -> Result<GenerationReport> {
    check_shape(spec)?;

    let buckets = group_by_tier(scan_endpoints(spec));
    let total_endpoints = buckets.values().map(Vec::len).sum();

    let tiers = order_tiers(tiers);
    let mut cumulative: Vec<EndpointRecord> = Vec::new();
    let mut outcomes = Vec::with_capacity(tiers.len());
    for tier in tiers {
        let Some(bucket) = buckets.get(&tier) else {
            outcomes.push(TierOutcome::Missing(tier));
            continue;
        };
        cumulative.extend(bucket.iter().cloned());
        outcomes.push(TierOutcome::Generated(TierDocument {
            file_name: format!("endpoints_{tier}.md"),
            content: render_markdown(&tier, &cumulative),
            endpoint_count: cumulative.len(),
            tier,
        }));
    }

    Ok(GenerationReport {
        outcomes,
        total_endpoints,
    })
}

/// Markdown for one tier: a heading, then one section per known category.
#[must_use]
pub fn render_markdown(tier: &str, endpoints: &[EndpointRecord]) -> String {
    let mut lines = vec![format!("# API Endpoints {} Tier", capitalize(tier)), String::new()];

    let mut categories: BTreeMap<String, Vec<&EndpointRecord>> = BTreeMap::new();
    for endpoint in endpoints {
        categories
            .entry(category_of(&endpoint.path))
            .or_default()
            .push(endpoint);
    }

    for category in CATEGORY_ORDER {
        let Some(entries) = categories.get_mut(category) else {
            continue;
        };
        lines.push(format!("#### {category} Endpoints"));
        lines.push(String::new());

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        for endpoint in entries.iter() {
            if endpoint.display_name.is_empty() {
                lines.push(format!("- `{}`", endpoint.path));
            } else {
                lines.push(format!("- `{}` - {}", endpoint.path, endpoint.display_name));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Write every generated document into `output_dir`, creating it if needed.
///
/// # Errors
///
/// Fails on the first directory or file that cannot be written.
pub fn write_documents(report: &GenerationReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|source| DocsError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for doc in report.documents() {
        let path = output_dir.join(&doc.file_name);
        std::fs::write(&path, &doc.content).map_err(|source| DocsError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), endpoints = doc.endpoint_count, "wrote tier document");
        written.push(path);
    }
    Ok(written)
}

fn category_of(path: &str) -> String {
    capitalize(path.trim_matches('/').split('/').next().unwrap_or_default())
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, display: &str, tier: &str) -> EndpointRecord {
        EndpointRecord {
            path: path.to_string(),
            method: "GET".to_string(),
            display_name: display.to_string(),
            tier: tier.to_string(),
            synthetic: false,
        }
    }

    #[test]
    fn capitalizes_like_titles() {
        assert_eq!(capitalize("free"), "Free");
        assert_eq!(capitalize("PROFESSIONAL"), "Professional");
        assert_eq!(capitalize(""), "");
        assert_eq!(category_of("/option/list/roots"), "Option");
        assert_eq!(category_of("/"), "");
    }

    #[test]
    fn renders_sorted_categories_in_fixed_order() {
        let endpoints = vec![
            record("/option/list/roots", "Roots", "value"),
            record("/stock/list/symbols", "Symbols", "free"),
            record("/bulk/snapshot", "Bulk", "free"),
            record("/stock/history/eod", "", "free"),
        ];
        let md = render_markdown("value", &endpoints);
        assert_eq!(
            md,
            "# API Endpoints Value Tier\n\
             \n\
             #### Stock Endpoints\n\
             \n\
             - `/stock/history/eod`\n\
             - `/stock/list/symbols` - Symbols\n\
             \n\
             #### Option Endpoints\n\
             \n\
             - `/option/list/roots` - Roots\n"
        );
    }

    #[test]
    fn empty_document_is_just_the_heading() {
        assert_eq!(render_markdown("free", &[]), "# API Endpoints Free Tier\n");
    }

    #[test]
    fn tiers_follow_the_hierarchy_whatever_the_input_order() {
        let given: Vec<String> = ["beta", "professional", "Free", "value", "beta", "free"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        assert_eq!(order_tiers(&given), vec!["Free", "value", "professional", "beta"]);
    }

    #[test]
    fn malformed_roots_and_paths_are_rejected() {
        for spec in [
            Value::Null,
            serde_json::json!("just a string"),
            serde_json::json!(["a", "b"]),
            serde_json::json!({"paths": 42}),
        ] {
            assert!(matches!(
                generate(&spec, &default_tiers()),
                Err(DocsError::MalformedSpec(_))
            ));
        }
    }

    #[test]
    fn default_tiers_ascend() {
        assert_eq!(
            default_tiers(),
            vec!["free", "value", "standard", "professional"]
        );
    }
}
