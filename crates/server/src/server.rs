//! Server assembly: OpenAPI tools + ThetaData transform + tier customization.

use crate::config::{FormatPolicy, ServerSettings, TransformConfig};
use crate::descriptions::Descriptions;
use crate::error::Result;
use crate::transform::{FORMAT, ThetaTransform};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::Value;
use std::sync::Arc;
use thetadata_openapi_tools::component::{HttpRoute, ToolComponent};
use thetadata_openapi_tools::config::ToolSourceConfig;
use thetadata_openapi_tools::document::SpecDocument;
use thetadata_openapi_tools::runtime::OpenApiToolSource;
use thetadata_subscription::{Tier, extract_operation_tier, tag_for};

pub const SERVER_NAME: &str = "Theta Data MCP Server";

const TIER_TAG_PREFIX: &str = "tier:";

/// Knobs for [`create_mcp_server`] beyond the upstream connection.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub transform: TransformConfig,
    /// Drop output schemas from every tool.
    pub strip_output_schema: bool,
    /// Hide tools whose tier is above this one.
    pub max_tier: Option<Tier>,
    pub descriptions: Descriptions,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            transform: TransformConfig::default(),
            strip_output_schema: false,
            max_tier: None,
            descriptions: Descriptions::builtin(),
        }
    }
}

/// Build the MCP server for `document`.
///
/// # Errors
///
/// Fails if the HTTP client cannot be built from `settings` or the document is not a valid
/// `OpenAPI` 3 document.
pub fn create_mcp_server(
    document: Arc<SpecDocument>,
    settings: &ServerSettings,
    options: ServerOptions,
) -> Result<ThetaDataServer> {
    let transform = ThetaTransform::new(options.transform.clone());
    let source_config = ToolSourceConfig::new(settings.base_url.clone(), settings.timeout);

    let spec = document.raw();
    let customizer = |route: &HttpRoute, component: &mut ToolComponent| {
        customize_component(spec, &options, route, component);
    };

    let source = OpenApiToolSource::build(
        "thetadata",
        &document,
        &source_config,
        Arc::new(transform),
        &customizer,
    )?;

    tracing::info!(
        base_url = %settings.base_url,
        timeout_secs = settings.timeout.as_secs_f64(),
        tools = source.list_tools().len(),
        "ThetaData MCP server assembled"
    );

    Ok(ThetaDataServer {
        source,
        document,
        max_tier: options.max_tier,
    })
}

/// Per-operation customization: tier tag, curated description, tier marker, schema stripping.
fn customize_component(
    spec: &Value,
    options: &ServerOptions,
    route: &HttpRoute,
    component: &mut ToolComponent,
) {
    let tier = extract_operation_tier(spec, &route.path, &route.method);
    component.tags.insert(tag_for(tier));

    if let Some(curated) = route
        .operation_id
        .as_deref()
        .and_then(|id| options.descriptions.get(id))
    {
        component.description = curated.to_string();
    }
    if let Some(tier) = tier {
        component.description = format!("[{}] {}", tier.to_uppercase(), component.description);
    }

    if options.strip_output_schema {
        component.output_schema = None;
    }
    if options.transform.format_policy == FormatPolicy::Strip {
        component.remove_parameter(FORMAT);
    }
}

/// The tier recorded in a component's tags, if it names a known tier.
fn component_tier(component: &ToolComponent) -> Option<Tier> {
    component
        .tags
        .iter()
        .find_map(|t| t.strip_prefix(TIER_TAG_PREFIX))
        .and_then(|t| t.parse().ok())
}

#[derive(Clone)]
pub struct ThetaDataServer {
    source: OpenApiToolSource,
    document: Arc<SpecDocument>,
    max_tier: Option<Tier>,
}

impl ThetaDataServer {
    #[must_use]
    pub fn source(&self) -> &OpenApiToolSource {
        &self.source
    }

    fn is_visible(&self, component: &ToolComponent) -> bool {
        match (self.max_tier, component_tier(component)) {
            (Some(max), Some(tier)) => tier <= max,
            _ => true,
        }
    }

    /// Tools exposed to clients.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.source.list_tools_where(|c| self.is_visible(c))
    }

    /// Execute a tool. Upstream failures become error results; unknown or hidden tools are
    /// protocol errors.
    pub async fn call(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        if !self.source.component(name).is_some_and(|c| self.is_visible(c)) {
            return Err(ErrorData::invalid_params(
                format!("Unknown tool: {name}"),
                None,
            ));
        }

        match self.source.call_tool(name, &arguments).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

impl ServerHandler for ThetaDataServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = "Access Theta Data real-time and historical stock, option and index \
             market data. Tool descriptions are prefixed with the minimum subscription tier they \
             require. Date ranges default to the previous day when omitted.";

        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: self.document.title().map(str::to_string),
                ..Default::default()
            },
            instructions: Some(instructions.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        self.call(&request.name, request.arguments.unwrap_or_default())
            .await
    }
}
