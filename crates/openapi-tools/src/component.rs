//! Tool components and the per-operation customization hook.

use rmcp::model::JsonObject;
use serde_json::Value;
use std::collections::BTreeSet;

/// The `OpenAPI` operation a tool was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRoute {
    /// Lower-case HTTP method (`get`, `post`, ...).
    pub method: String,
    /// Path template as written in the spec (e.g. `/stock/history/eod`).
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
}

/// A tool as it will be exposed over MCP. Customizers may rewrite any field.
#[derive(Debug, Clone)]
pub struct ToolComponent {
    pub name: String,
    pub description: String,
    /// Free-form labels (e.g. `tier:free`). Not part of the MCP wire format; used by the server
    /// for filtering.
    pub tags: BTreeSet<String>,
    pub input_schema: JsonObject,
    /// Schema of the structured result (`{"body": ...}`), when one could be derived.
    pub output_schema: Option<JsonObject>,
}

impl ToolComponent {
    /// Remove an argument from the input schema (`properties` and `required`).
    ///
    /// Returns `true` if the argument was present.
    pub fn remove_parameter(&mut self, name: &str) -> bool {
        let removed = self
            .input_schema
            .get_mut("properties")
            .and_then(Value::as_object_mut)
            .and_then(|props| props.remove(name))
            .is_some();

        if let Some(required) = self
            .input_schema
            .get_mut("required")
            .and_then(Value::as_array_mut)
        {
            required.retain(|r| r.as_str() != Some(name));
            if required.is_empty() {
                self.input_schema.remove("required");
            }
        }

        removed
    }

    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|props| props.contains_key(name))
    }
}

/// Hook invoked once per generated tool, before it is registered.
pub trait ComponentCustomizer: Send + Sync {
    fn customize(&self, route: &HttpRoute, component: &mut ToolComponent);
}

impl<F> ComponentCustomizer for F
where
    F: Fn(&HttpRoute, &mut ToolComponent) + Send + Sync,
{
    fn customize(&self, route: &HttpRoute, component: &mut ToolComponent) {
        self(route, component);
    }
}

/// Customizer that leaves every component as generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomization;

impl ComponentCustomizer for NoCustomization {
    fn customize(&self, _route: &HttpRoute, _component: &mut ToolComponent) {}
}
