//! HTTP method semantics as MCP tool annotations.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// MCP tool annotations for an HTTP-backed tool.
///
/// Every HTTP tool talks to an external system, so `openWorldHint` is always set. The other hints
/// follow RFC 9110 method semantics; extension methods leave them unset. `title` is usually the
/// operation summary.
#[must_use]
pub fn annotations_for_method(method: &Method, title: Option<String>) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => (Some(true), Some(false), Some(true)),
        Method::POST => (Some(false), Some(false), Some(false)),
        Method::PUT | Method::DELETE => (Some(false), Some(true), Some(true)),
        // PATCH may or may not be idempotent.
        Method::PATCH => (Some(false), Some(true), None),
        _ => (None, None, None),
    };

    ToolAnnotations {
        title,
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::annotations_for_method;
    use reqwest::Method;

    #[test]
    fn market_data_reads_are_readonly_and_idempotent() {
        let a = annotations_for_method(&Method::GET, Some("List stock symbols".into()));
        assert_eq!(a.title.as_deref(), Some("List stock symbols"));
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
        assert_eq!(a.open_world_hint, Some(true));
    }

    #[test]
    fn patch_leaves_idempotence_unknown() {
        let a = annotations_for_method(&Method::PATCH, None);
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.idempotent_hint, None);
    }

    #[test]
    fn extension_method_only_sets_open_world() {
        let custom: Method = "PROPFIND".parse().expect("valid method token");
        let a = annotations_for_method(&custom, None);
        assert_eq!(a.read_only_hint, None);
        assert_eq!(a.destructive_hint, None);
        assert_eq!(a.idempotent_hint, None);
        assert_eq!(a.open_world_hint, Some(true));
    }
}
