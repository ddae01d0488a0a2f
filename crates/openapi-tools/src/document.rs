//! Specification document loading.
//!
//! The document is loaded once and kept as a raw JSON tree. Tier extraction and documentation
//! work directly on the raw tree (so malformed entries can be skipped instead of failing the
//! whole load); tool generation converts it into the typed `openapiv3` model on demand.

use crate::error::{OpenApiToolsError, Result};
use openapiv3::OpenAPI;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SpecDocument {
    location: String,
    raw: Value,
}

impl SpecDocument {
    /// Read and parse a YAML or JSON spec file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML/JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let location = path.display().to_string();
        tracing::info!("Loading OpenAPI spec from {location}");
        let text = std::fs::read_to_string(path).map_err(|source| {
            OpenApiToolsError::OpenApiSpecReadFile {
                path: location.clone(),
                source,
            }
        })?;
        Self::parse(location, &text)
    }

    /// Parse spec text. JSON is a subset of YAML, so `serde_yaml` handles both.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML/JSON.
    pub fn parse(location: impl Into<String>, text: &str) -> Result<Self> {
        let location = location.into();
        let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|source| {
            OpenApiToolsError::OpenApiSpecParse {
                location: location.clone(),
                source,
            }
        })?;
        // Goes through serde_json's serializer so unquoted keys such as `200:` become strings.
        let raw = serde_json::to_value(yaml).map_err(|source| {
            OpenApiToolsError::OpenApiSpecInvalid {
                location: location.clone(),
                source,
            }
        })?;
        Ok(Self { location, raw })
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The typed `OpenAPI` 3 view of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not follow the `OpenAPI` 3 schema.
    pub fn openapi(&self) -> Result<OpenAPI> {
        serde_json::from_value(self.raw.clone()).map_err(|source| {
            OpenApiToolsError::OpenApiSpecInvalid {
                location: self.location.clone(),
                source,
            }
        })
    }

    /// `info.title`, if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.raw.pointer("/info/title").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::SpecDocument;
    use crate::error::OpenApiToolsError;
    use std::fs;
    use tempfile::tempdir;

    const SPEC: &str = r#"
openapi: "3.0.3"
info:
  title: Theta Data REST API
  version: "3"
paths:
  /stock/list/symbols:
    x-min-subscription: free
    get:
      operationId: stock_list_symbols
      responses:
        "200":
          description: ok
"#;

    #[test]
    fn loads_yaml_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("openapiv3.yaml");
        fs::write(&path, SPEC).unwrap();

        let doc = SpecDocument::load(&path).unwrap();
        assert_eq!(doc.title(), Some("Theta Data REST API"));
        assert_eq!(
            doc.raw()
                .pointer("/paths/~1stock~1list~1symbols/x-min-subscription")
                .and_then(|v| v.as_str()),
            Some("free")
        );
        let typed = doc.openapi().unwrap();
        assert_eq!(typed.paths.paths.len(), 1);
    }

    #[test]
    fn json_documents_parse_too() {
        let doc = SpecDocument::parse(
            "inline.json",
            r#"{"openapi": "3.0.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#,
        )
        .unwrap();
        assert_eq!(doc.title(), Some("t"));
    }

    #[test]
    fn unquoted_status_codes_become_string_keys() {
        let doc = SpecDocument::parse(
            "inline.yaml",
            "openapi: 3.0.3\ninfo: {title: t, version: '1'}\npaths:\n  /a:\n    get:\n      responses:\n        200:\n          description: ok\n",
        )
        .unwrap();
        assert!(doc.raw().pointer("/paths/~1a/get/responses/200").is_some());
        assert!(doc.openapi().is_ok());
    }

    #[test]
    fn missing_file_fails_fast() {
        let dir = tempdir().unwrap();
        let err = SpecDocument::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, OpenApiToolsError::OpenApiSpecReadFile { .. }));
    }

    #[test]
    fn malformed_document_fails_fast() {
        let err = SpecDocument::parse("bad.yaml", "paths: [unclosed").unwrap_err();
        assert!(matches!(err, OpenApiToolsError::OpenApiSpecParse { .. }));
    }

    #[test]
    fn non_openapi_document_fails_typed_view_only() {
        let doc = SpecDocument::parse("x.yaml", "paths: {}").unwrap();
        assert!(doc.raw().get("paths").is_some());
        assert!(matches!(
            doc.openapi(),
            Err(OpenApiToolsError::OpenApiSpecInvalid { .. })
        ));
    }
}
