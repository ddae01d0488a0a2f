//! `OpenAPI` tool source runtime.
//!
//! This module implements an `OpenAPI` → MCP tool source by converting `OpenAPI` operations into
//! MCP tools and executing outbound HTTP requests for `tools/call`.

use crate::component::{ComponentCustomizer, HttpRoute, ToolComponent};
use crate::config::ToolSourceConfig;
use crate::document::SpecDocument;
use crate::error::{OpenApiToolsError, Result};
use crate::resolver::RefResolver;
use openapiv3::{
    OpenAPI, Operation, Parameter, ParameterSchemaOrContent, PathItem, QueryStyle, ReferenceOr,
    Schema, SchemaKind, StatusCode, Type,
};
use reqwest::{Client, Method};
use rmcp::model::{CallToolResult, Content, JsonObject, Meta, Tool};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use thetadata_http_tools::interceptor::{HttpInterceptor, InterceptedResponse};
use thetadata_http_tools::redact::{redact_url, sanitize_reqwest_error};
use thetadata_http_tools::semantics::annotations_for_method;
use url::Url;

/// Nesting limit when inlining schemas into tool input/output schemas.
const MAX_SCHEMA_DEPTH: usize = 8;

/// `OpenAPI` tool source that exposes HTTP API endpoints as MCP tools.
///
/// Immutable once built and cheap to clone; safe to share across tasks.
#[derive(Clone)]
pub struct OpenApiToolSource {
    inner: Arc<Inner>,
}

struct Inner {
    /// Source name (used for logs and error context).
    name: String,
    base_url: String,
    client: Client,
    interceptor: Arc<dyn HttpInterceptor>,
    tools: Vec<GeneratedTool>,
}

/// A tool generated from an `OpenAPI` operation.
#[derive(Debug, Clone)]
struct GeneratedTool {
    route: HttpRoute,
    method: Method,
    component: ToolComponent,
    parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone)]
struct ToolParameter {
    name: String,
    location: ParamLocation,
    required: bool,
    schema: Value,
    /// Arrays in the query expand into repeated keys (`form` + `explode`).
    explode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Body => "body",
        }
    }
}

impl OpenApiToolSource {
    /// Generate tools from `document` and wire them to the HTTP client.
    ///
    /// `customizer` runs once per generated tool, in spec order. `interceptor` wraps every
    /// request/response exchanged by [`Self::call_tool`].
    ///
    /// Operations that cannot be turned into tools (unresolvable refs, cookie parameters,
    /// colliding argument names) are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, the HTTP client cannot be built, or the
    /// document is not a valid `OpenAPI` 3 document.
    pub fn build(
        name: impl Into<String>,
        document: &SpecDocument,
        config: &ToolSourceConfig,
        interceptor: Arc<dyn HttpInterceptor>,
        customizer: &dyn ComponentCustomizer,
    ) -> Result<Self> {
        let name = name.into();
        let base_url = validate_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                OpenApiToolsError::Config(format!(
                    "Failed to build HTTP client: {}",
                    sanitize_reqwest_error(&e)
                ))
            })?;

        let spec = document.openapi()?;
        let tools = discover_tools(&name, &spec, customizer);

        tracing::info!(
            "Discovered {} tools from OpenAPI spec '{}'",
            tools.len(),
            document.location()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                base_url,
                client,
                interceptor,
                tools,
            }),
        })
    }

    /// List every MCP `Tool` exposed by this source.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.list_tools_where(|_| true)
    }

    /// List the MCP `Tool`s whose component passes `keep`.
    #[must_use]
    pub fn list_tools_where(&self, keep: impl Fn(&ToolComponent) -> bool) -> Vec<Tool> {
        self.inner
            .tools
            .iter()
            .filter(|t| keep(&t.component))
            .map(GeneratedTool::to_tool)
            .collect()
    }

    /// The customized component for a tool name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ToolComponent> {
        self.find(name).map(|t| &t.component)
    }

    fn find(&self, name: &str) -> Option<&GeneratedTool> {
        self.inner.tools.iter().find(|t| t.component.name == name)
    }

    /// Execute a tool call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the tool name is unknown
    /// - a required argument is missing
    /// - the interceptor rejects the request
    /// - the outbound HTTP request fails (transport or non-2xx response)
    pub async fn call_tool(&self, name: &str, arguments: &JsonObject) -> Result<CallToolResult> {
        let tool = self
            .find(name)
            .ok_or_else(|| OpenApiToolsError::Runtime(format!("Tool not found: {name}")))?;

        let mut request = self.build_request(tool, arguments)?;
        self.inner.interceptor.on_request(&mut request)?;

        tracing::debug!(
            source = %self.inner.name,
            tool = %tool.component.name,
            url = %redact_url(request.url()),
            "calling upstream"
        );

        let response = self
            .inner
            .client
            .execute(request)
            .await
            .map_err(|e| OpenApiToolsError::Request(sanitize_reqwest_error(&e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| OpenApiToolsError::Request(sanitize_reqwest_error(&e)))?
            .to_vec();

        let response = self.inner.interceptor.on_response(InterceptedResponse {
            status,
            headers,
            body,
        });

        if !response.status.is_success() {
            let status_code = response.status.as_u16();
            let reason = response.status.canonical_reason().unwrap_or("Unknown");
            let text = String::from_utf8_lossy(&response.body);
            return Err(OpenApiToolsError::Http(format!(
                "API returned {status_code} {reason}: {}",
                text.trim()
            )));
        }

        Ok(tool_result(tool, &response))
    }

    fn build_request(
        &self,
        tool: &GeneratedTool,
        arguments: &JsonObject,
    ) -> Result<reqwest::Request> {
        let mut path = tool.route.path.clone();
        let mut query: Vec<(String, String)> = Vec::new();
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut body: Option<&Value> = None;

        for param in &tool.parameters {
            let value = arguments.get(&param.name).filter(|v| !v.is_null());
            let Some(value) = value else {
                if param.required {
                    return Err(OpenApiToolsError::Runtime(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                continue;
            };

            match param.location {
                ParamLocation::Path => {
                    path = path.replace(&format!("{{{}}}", param.name), &value_to_string(value));
                }
                ParamLocation::Query => push_query(&mut query, &param.name, value, param.explode),
                ParamLocation::Header => headers.push((param.name.clone(), value_to_string(value))),
                ParamLocation::Body => body = Some(value),
            }
        }

        if !path.starts_with('/') {
            path = format!("/{path}");
        }

        let mut url = Url::parse(&format!(
            "{}{}",
            self.inner.base_url.trim_end_matches('/'),
            path
        ))
        .map_err(|e| OpenApiToolsError::Runtime(format!("Invalid URL: {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &query {
                pairs.append_pair(k, v);
            }
        }

        let mut request = self.inner.client.request(tool.method.clone(), url);
        for (k, v) in headers {
            request = request.header(k, v);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.build().map_err(|e| {
            OpenApiToolsError::Runtime(format!("Invalid request: {}", sanitize_reqwest_error(&e)))
        })
    }
}

impl GeneratedTool {
    fn to_tool(&self) -> Tool {
        let mut tool = Tool::new(
            self.component.name.clone(),
            self.component.description.clone(),
            Arc::new(self.component.input_schema.clone()),
        );
        tool.output_schema = self.component.output_schema.clone().map(Arc::new);
        tool.annotations = Some(annotations_for_method(
            &self.method,
            self.route.summary.clone(),
        ));
        // Tags travel to clients as `_meta.tags`.
        if !self.component.tags.is_empty() {
            let mut meta = JsonObject::new();
            meta.insert("tags".to_string(), json!(self.component.tags));
            tool.meta = Some(Meta(meta));
        }
        tool
    }
}

fn tool_result(tool: &GeneratedTool, response: &InterceptedResponse) -> CallToolResult {
    let body = if response.is_json() {
        serde_json::from_slice::<Value>(&response.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&response.body).into_owned()))
    } else {
        Value::String(String::from_utf8_lossy(&response.body).into_owned())
    };

    // Emit `structured_content` only when the tool advertises an output schema.
    if tool.component.output_schema.is_some() {
        let structured = json!({ "body": body });
        let text = serde_json::to_string(&structured).unwrap_or_else(|_| structured.to_string());
        return CallToolResult {
            content: vec![Content::text(text)],
            structured_content: Some(structured),
            is_error: Some(false),
            meta: None,
        };
    }

    let text = match body {
        Value::String(s) => s,
        other => serde_json::to_string(&other).unwrap_or_else(|_| other.to_string()),
    };
    CallToolResult::success(vec![Content::text(text)])
}

fn validate_base_url(base_url: &str) -> Result<String> {
    let url = Url::parse(base_url)
        .map_err(|e| OpenApiToolsError::Config(format!("Invalid base URL '{base_url}': {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(OpenApiToolsError::Config(format!(
            "Invalid base URL '{base_url}': must be an absolute http(s) URL"
        )));
    }
    Ok(base_url.to_string())
}

// ============================================================================
// Tool discovery
// ============================================================================

fn operations(item: &PathItem) -> impl Iterator<Item = (&'static str, &Operation)> {
    [
        ("get", &item.get),
        ("post", &item.post),
        ("put", &item.put),
        ("delete", &item.delete),
        ("patch", &item.patch),
    ]
    .into_iter()
    .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
}

fn discover_tools(
    source_name: &str,
    spec: &OpenAPI,
    customizer: &dyn ComponentCustomizer,
) -> Vec<GeneratedTool> {
    let resolver = RefResolver::new(spec);
    let mut tool_names: HashSet<String> = HashSet::new();
    let mut tools = Vec::new();

    for (path, item) in &spec.paths.paths {
        let ReferenceOr::Item(item) = item else {
            tracing::warn!(
                "Skipping path '{}' in '{}': path item $refs are not supported",
                path,
                source_name
            );
            continue;
        };

        for (method, op) in operations(item) {
            match generate_tool(&resolver, item, path, method, op, &mut tool_names) {
                Ok(mut tool) => {
                    customizer.customize(&tool.route, &mut tool.component);
                    tools.push(tool);
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping {} {} in '{}': {}",
                        method.to_uppercase(),
                        path,
                        source_name,
                        e
                    );
                }
            }
        }
    }

    tools
}

fn generate_tool<'a>(
    resolver: &RefResolver<'a>,
    item: &'a PathItem,
    path: &str,
    method: &str,
    operation: &'a Operation,
    tool_names: &mut HashSet<String>,
) -> Result<GeneratedTool> {
    let base_name = operation
        .operation_id
        .clone()
        .unwrap_or_else(|| generate_canonical_name(method, path));
    let name = reserve_unique_tool_name(tool_names, &base_name);

    let description = non_empty(operation.description.as_deref())
        .or_else(|| non_empty(operation.summary.as_deref()))
        .map_or_else(
            || format!("Calls {} {}", method.to_uppercase(), path),
            str::to_string,
        );

    let parameters = collect_parameters(resolver, &item.parameters, operation, method, path)?;
    let input_schema = build_input_schema(&parameters);
    let output_schema = derive_output_schema(resolver, operation);

    let http_method: Method = method.to_uppercase().parse().map_err(|_| {
        OpenApiToolsError::OpenApi(format!("Invalid HTTP method '{method}'"))
    })?;

    Ok(GeneratedTool {
        route: HttpRoute {
            method: method.to_string(),
            path: path.to_string(),
            operation_id: operation.operation_id.clone(),
            summary: non_empty(operation.summary.as_deref()).map(str::to_string),
        },
        method: http_method,
        component: ToolComponent {
            name,
            description,
            tags: BTreeSet::new(),
            input_schema,
            output_schema,
        },
        parameters,
    })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Merge path-item and operation parameters (operation wins on the same location + name), then
/// append the JSON request body as a single `body` argument.
fn collect_parameters<'a>(
    resolver: &RefResolver<'a>,
    path_item_params: &'a [ReferenceOr<Parameter>],
    operation: &'a Operation,
    method: &str,
    path: &str,
) -> Result<Vec<ToolParameter>> {
    let mut merged: Vec<ToolParameter> = Vec::new();
    let mut index: HashMap<(ParamLocation, String), usize> = HashMap::new();

    for p in path_item_params.iter().chain(&operation.parameters) {
        let param = tool_parameter(resolver, resolver.parameter(p)?)?;
        let key = (param.location, param.name.clone());
        if let Some(i) = index.get(&key).copied() {
            merged[i] = param;
        } else {
            index.insert(key, merged.len());
            merged.push(param);
        }
    }

    if let Some(body_ref) = &operation.request_body {
        let body = resolver.request_body(body_ref)?;
        if let Some(schema_ref) = body
            .content
            .get("application/json")
            .and_then(|c| c.schema.as_ref())
        {
            let schema = schema_to_json(resolver, resolver.schema(schema_ref)?, 0);
            merged.push(ToolParameter {
                name: "body".to_string(),
                location: ParamLocation::Body,
                required: body.required,
                schema,
                explode: false,
            });
        }
    }

    let mut seen: HashMap<&str, ParamLocation> = HashMap::new();
    for p in &merged {
        if let Some(other) = seen.insert(p.name.as_str(), p.location) {
            return Err(OpenApiToolsError::ParamCollision(format!(
                "Parameter '{}' appears in both {} and {} of {} {}",
                p.name,
                other.as_str(),
                p.location.as_str(),
                method.to_uppercase(),
                path
            )));
        }
    }

    Ok(merged)
}

fn tool_parameter<'a>(resolver: &RefResolver<'a>, param: &'a Parameter) -> Result<ToolParameter> {
    let (data, location, explode_default) = match param {
        Parameter::Query {
            parameter_data,
            style,
            ..
        } => (
            parameter_data,
            ParamLocation::Query,
            matches!(style, QueryStyle::Form),
        ),
        Parameter::Path { parameter_data, .. } => (parameter_data, ParamLocation::Path, false),
        Parameter::Header { parameter_data, .. } => {
            (parameter_data, ParamLocation::Header, false)
        }
        Parameter::Cookie { .. } => {
            return Err(OpenApiToolsError::OpenApi(
                "Cookie parameters not supported".to_string(),
            ));
        }
    };

    let mut schema = match &data.format {
        ParameterSchemaOrContent::Schema(s) => schema_to_json(resolver, resolver.schema(s)?, 0),
        ParameterSchemaOrContent::Content(_) => json!({"type": "string"}),
    };
    if let (Some(obj), Some(desc)) = (schema.as_object_mut(), non_empty(data.description.as_deref()))
    {
        obj.entry("description")
            .or_insert_with(|| Value::String(desc.to_string()));
    }

    Ok(ToolParameter {
        name: data.name.clone(),
        location,
        // Path params are always required.
        required: data.required || location == ParamLocation::Path,
        schema,
        explode: data.explode.unwrap_or(explode_default),
    })
}

/// Best-effort JSON Schema for the lowest 2xx JSON response, wrapped as `{"body": ...}`.
fn derive_output_schema<'a>(
    resolver: &RefResolver<'a>,
    operation: &'a Operation,
) -> Option<JsonObject> {
    let mut explicit_2xx: Vec<(u16, &'a ReferenceOr<openapiv3::Response>)> = Vec::new();
    let mut range_2xx = None;
    for (code, resp) in &operation.responses.responses {
        match code {
            StatusCode::Code(n) if (200..300).contains(n) => explicit_2xx.push((*n, resp)),
            StatusCode::Range(2) => range_2xx = Some(resp),
            _ => {}
        }
    }
    explicit_2xx.sort_by_key(|(n, _)| *n);

    let resp_ref = explicit_2xx.first().map(|(_, r)| *r).or(range_2xx)?;
    let resp = resolver.response(resp_ref).ok()?;

    let media = resp.content.get("application/json").or_else(|| {
        resp.content
            .iter()
            .find_map(|(k, v)| k.to_ascii_lowercase().contains("json").then_some(v))
    })?;
    let schema = resolver.schema(media.schema.as_ref()?).ok()?;
    let body_schema = schema_to_json(resolver, schema, 0);

    json!({
        "type": "object",
        "required": ["body"],
        "properties": { "body": body_schema }
    })
    .as_object()
    .cloned()
}

/// Convert an `OpenAPI` schema into a JSON Schema value, inlining local refs.
fn schema_to_json<'a>(resolver: &RefResolver<'a>, schema: &'a Schema, depth: usize) -> Value {
    let mut out = JsonObject::new();

    if let Some(desc) = &schema.schema_data.description {
        out.insert("description".to_string(), json!(desc));
    }
    if let Some(default) = &schema.schema_data.default {
        out.insert("default".to_string(), default.clone());
    }
    if depth >= MAX_SCHEMA_DEPTH {
        return Value::Object(out);
    }

    let nested = |r: &'a ReferenceOr<Box<Schema>>| {
        resolver
            .boxed_schema(r)
            .map_or_else(|_| json!({}), |s| schema_to_json(resolver, s, depth + 1))
    };
    let variants = |items: &'a [ReferenceOr<Schema>]| {
        items
            .iter()
            .map(|r| {
                resolver
                    .schema(r)
                    .map_or_else(|_| json!({}), |s| schema_to_json(resolver, s, depth + 1))
            })
            .collect::<Vec<_>>()
    };

    match &schema.schema_kind {
        SchemaKind::Type(Type::String(s)) => {
            out.insert("type".to_string(), json!("string"));
            let values: Vec<&String> = s.enumeration.iter().flatten().collect();
            if !values.is_empty() {
                out.insert("enum".to_string(), json!(values));
            }
        }
        SchemaKind::Type(Type::Number(_)) => {
            out.insert("type".to_string(), json!("number"));
        }
        SchemaKind::Type(Type::Integer(_)) => {
            out.insert("type".to_string(), json!("integer"));
        }
        SchemaKind::Type(Type::Boolean(_)) => {
            out.insert("type".to_string(), json!("boolean"));
        }
        SchemaKind::Type(Type::Array(a)) => {
            out.insert("type".to_string(), json!("array"));
            if let Some(items) = &a.items {
                out.insert("items".to_string(), nested(items));
            }
        }
        SchemaKind::Type(Type::Object(o)) => {
            out.insert("type".to_string(), json!("object"));
            if !o.properties.is_empty() {
                let props: JsonObject = o
                    .properties
                    .iter()
                    .map(|(name, prop)| (name.clone(), nested(prop)))
                    .collect();
                out.insert("properties".to_string(), Value::Object(props));
            }
            if !o.required.is_empty() {
                out.insert("required".to_string(), json!(o.required));
            }
        }
        SchemaKind::OneOf { one_of: items } | SchemaKind::AnyOf { any_of: items } => {
            out.insert("anyOf".to_string(), Value::Array(variants(items.as_slice())));
        }
        SchemaKind::AllOf { all_of } => {
            out.insert("allOf".to_string(), Value::Array(variants(all_of.as_slice())));
        }
        _ => {}
    }

    Value::Object(out)
}

/// Build the tool input schema from its parameters.
fn build_input_schema(parameters: &[ToolParameter]) -> JsonObject {
    let properties: JsonObject = parameters
        .iter()
        .map(|p| (p.name.clone(), p.schema.clone()))
        .collect();
    let required: Vec<&str> = parameters
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    schema
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Generate a canonical tool name from method and path.
fn generate_canonical_name(method: &str, path: &str) -> String {
    let mut name = format!("{}_{}", method.to_lowercase(), path.trim_start_matches('/'));
    name = name.replace(['{', '}'], "");
    name = name.replace(['/', '-', '.'], "_");
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    name.trim_end_matches('_').to_string()
}

fn reserve_unique_tool_name(tool_names: &mut HashSet<String>, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut n = 2;
    while tool_names.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    tool_names.insert(candidate.clone());
    candidate
}

fn push_query(query: &mut Vec<(String, String)>, name: &str, value: &Value, explode: bool) {
    match value {
        Value::Array(items) if explode => {
            query.extend(items.iter().map(|v| (name.to_string(), value_to_string(v))));
        }
        Value::Array(items) => {
            let joined = items.iter().map(value_to_string).collect::<Vec<_>>().join(",");
            query.push((name.to_string(), joined));
        }
        other => query.push((name.to_string(), value_to_string(other))),
    }
}

/// Convert a JSON value to a string for URL/header parameters.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::NoCustomization;
    use axum::Router;
    use axum::http::Uri;
    use axum::routing::any;
    use std::sync::Mutex;
    use std::time::Duration;
    use thetadata_http_tools::interceptor::Passthrough;
    use tokio::net::TcpListener;

    const SPEC: &str = r#"
openapi: "3.0.3"
info:
  title: Theta Data REST API
  version: "3"
components:
  parameters:
    Symbol:
      name: symbol
      in: query
      required: true
      description: The stock or index symbol.
      schema:
        type: string
paths:
  /stock/list/symbols:
    x-min-subscription: free
    get:
      operationId: stock_list_symbols
      summary: List stock symbols
      description: Lists all stock symbols.
      parameters:
        - name: format
          in: query
          schema:
            type: string
            enum: [csv, json, ndjson, html]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: { type: string }
  /stock/history/eod:
    parameters:
      - $ref: '#/components/parameters/Symbol'
    get:
      operationId: stock_history_eod
      summary: End-of-day report
      parameters:
        - name: start_date
          in: query
          schema: { type: string }
        - name: end_date
          in: query
          schema: { type: string }
      responses:
        "200":
          description: ok
  /option/list/contracts/{request_type}:
    get:
      parameters:
        - name: request_type
          in: path
          schema: { type: string }
        - name: cookie_thing
          in: cookie
          schema: { type: string }
      responses:
        "200":
          description: ok
  /index/list/symbols:
    get:
      parameters:
        - name: expiration
          in: query
          explode: true
          schema:
            type: array
            items: { type: string }
      responses:
        "200":
          description: ok
"#;

    fn document() -> SpecDocument {
        SpecDocument::parse("inline", SPEC).unwrap()
    }

    fn config(base_url: &str) -> ToolSourceConfig {
        ToolSourceConfig::new(base_url, Duration::from_secs(5))
    }

    fn source_with(
        base_url: &str,
        interceptor: Arc<dyn HttpInterceptor>,
        customizer: &dyn ComponentCustomizer,
    ) -> OpenApiToolSource {
        OpenApiToolSource::build("thetadata", &document(), &config(base_url), interceptor, customizer)
            .unwrap()
    }

    fn source() -> OpenApiToolSource {
        source_with(
            "http://127.0.0.1:25503/v3",
            Arc::new(Passthrough),
            &NoCustomization,
        )
    }

    #[test]
    fn test_generate_canonical_name() {
        assert_eq!(
            generate_canonical_name("get", "/option/list/contracts/{request_type}"),
            "get_option_list_contracts_request_type"
        );
        assert_eq!(
            generate_canonical_name("post", "/stock/snapshot/ohlc"),
            "post_stock_snapshot_ohlc"
        );
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("AAPL")), "AAPL");
        assert_eq!(value_to_string(&json!(150)), "150");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
    }

    #[test]
    fn discovers_one_tool_per_supported_operation() {
        let src = source();
        let names: Vec<String> = src.list_tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "stock_list_symbols",
                "stock_history_eod",
                "get_index_list_symbols"
            ]
        );
    }

    #[test]
    fn merges_path_item_parameters_and_resolves_refs() {
        let src = source();
        let c = src.component("stock_history_eod").unwrap();
        assert!(c.has_parameter("symbol"));
        assert!(c.has_parameter("start_date"));
        assert_eq!(c.input_schema.get("required"), Some(&json!(["symbol"])));
        assert_eq!(
            c.input_schema
                .get("properties")
                .and_then(|p| p.pointer("/symbol/description"))
                .and_then(Value::as_str),
            Some("The stock or index symbol.")
        );
    }

    #[test]
    fn description_prefers_spec_description_and_title_uses_summary() {
        let src = source();
        let tools = src.list_tools();
        let t = tools
            .iter()
            .find(|t| t.name == "stock_list_symbols")
            .unwrap();
        assert_eq!(t.description.as_deref(), Some("Lists all stock symbols."));
        let annotations = t.annotations.as_ref().unwrap();
        assert_eq!(annotations.title.as_deref(), Some("List stock symbols"));
        assert_eq!(annotations.read_only_hint, Some(true));

        let eod = src.component("stock_history_eod").unwrap();
        assert_eq!(eod.description, "End-of-day report");
    }

    #[test]
    fn generates_output_schema_for_json_2xx_response() {
        let src = source();
        let out = src
            .component("stock_list_symbols")
            .unwrap()
            .output_schema
            .clone()
            .expect("output schema");
        assert_eq!(out.get("type"), Some(&json!("object")));
        assert_eq!(
            out.get("properties")
                .and_then(|p| p.get("body"))
                .and_then(|b| b.get("type")),
            Some(&json!("array"))
        );
        assert!(src.component("stock_history_eod").unwrap().output_schema.is_none());
    }

    #[test]
    fn customizer_sees_route_and_can_rewrite_component() {
        let seen: Mutex<Vec<HttpRoute>> = Mutex::new(Vec::new());
        let customizer = |route: &HttpRoute, component: &mut ToolComponent| {
            seen.lock().unwrap().push(route.clone());
            component.tags.insert(format!("path:{}", route.path));
            component.description = format!("[X] {}", component.description);
            component.remove_parameter("format");
        };
        let src = source_with(
            "http://127.0.0.1:25503/v3",
            Arc::new(Passthrough),
            &customizer,
        );

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].method, "get");
        assert_eq!(seen[0].operation_id.as_deref(), Some("stock_list_symbols"));

        let c = src.component("stock_list_symbols").unwrap();
        assert!(c.tags.contains("path:/stock/list/symbols"));
        assert!(c.description.starts_with("[X] "));
        assert!(!c.has_parameter("format"));

        let visible = src.list_tools_where(|c| c.name.starts_with("stock_"));
        assert_eq!(visible.len(), 2);

        let listed = serde_json::to_value(&visible[0]).unwrap();
        assert_eq!(
            listed["_meta"]["tags"],
            json!(["path:/stock/list/symbols"])
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = OpenApiToolSource::build(
            "thetadata",
            &document(),
            &config("ftp://127.0.0.1"),
            Arc::new(Passthrough),
            &NoCustomization,
        )
        .err()
        .unwrap();
        assert!(matches!(err, OpenApiToolsError::Config(_)));
    }

    #[test]
    fn builds_query_with_exploded_arrays() {
        let src = source();
        let tool = src.find("get_index_list_symbols").unwrap();
        let args = json!({"expiration": ["20240119", "20240216"]});
        let req = src
            .build_request(tool, args.as_object().unwrap())
            .unwrap();
        assert_eq!(
            req.url().as_str(),
            "http://127.0.0.1:25503/v3/index/list/symbols?expiration=20240119&expiration=20240216"
        );
    }

    #[tokio::test]
    async fn missing_required_parameter_fails_before_sending() {
        let src = source();
        let err = src
            .call_tool("stock_history_eod", &JsonObject::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing required parameter: symbol"));

        let err = src.call_tool("nope", &JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Runtime(_)));
    }

    struct TagQuery;

    impl HttpInterceptor for TagQuery {
        fn on_request(&self, request: &mut reqwest::Request) -> thetadata_http_tools::Result<()> {
            request.url_mut().query_pairs_mut().append_pair("via", "interceptor");
            Ok(())
        }

        fn on_response(&self, mut response: InterceptedResponse) -> InterceptedResponse {
            response.body = br#"{"rewritten":true}"#.to_vec();
            response
        }
    }

    async fn spawn_upstream() -> (String, tokio::sync::oneshot::Sender<()>) {
        async fn echo(uri: Uri) -> axum::Json<Value> {
            axum::Json(json!({
                "path": uri.path(),
                "query": uri.query().unwrap_or(""),
            }))
        }

        let app = Router::new().route("/{*path}", any(echo));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move { server.await });
        (format!("http://{addr}/v3"), shutdown_tx)
    }

    #[tokio::test]
    async fn call_tool_routes_through_interceptor() {
        let (base_url, shutdown) = spawn_upstream().await;

        let plain = source_with(&base_url, Arc::new(Passthrough), &NoCustomization);
        let args = json!({"symbol": "AAPL", "start_date": "20240102"});
        let result = plain
            .call_tool("stock_history_eod", args.as_object().unwrap())
            .await
            .unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["path"], json!("/v3/stock/history/eod"));
        assert_eq!(body["query"], json!("symbol=AAPL&start_date=20240102"));

        let intercepted = source_with(&base_url, Arc::new(TagQuery), &NoCustomization);
        let result = intercepted
            .call_tool("stock_list_symbols", &JsonObject::new())
            .await
            .unwrap();
        assert_eq!(
            result.structured_content,
            Some(json!({"body": {"rewritten": true}}))
        );

        let _ = shutdown.send(());
    }
}
