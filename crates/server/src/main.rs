//! Theta Data MCP Server
//!
//! # Usage
//!
//! ## stdio transport (for desktop MCP clients)
//! ```bash
//! thetadata-mcp --spec openapiv3.yaml
//! ```
//!
//! ## sse transport (streamable HTTP at `/mcp`)
//! ```bash
//! thetadata-mcp --transport sse --port 8000
//! ```

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use thetadata_mcp::descriptions::Descriptions;
use thetadata_mcp::{
    FormatPolicy, ServerOptions, ServerSettings, ThetaDataServer, TransformConfig,
    create_mcp_server,
};
use thetadata_openapi_tools::document::SpecDocument;
use thetadata_subscription::Tier;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Sse,
}

/// Theta Data MCP Server
#[derive(Parser, Debug)]
#[command(name = "thetadata-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// OpenAPI spec of the Theta Data API (YAML or JSON)
    #[arg(long, default_value = "openapiv3.yaml")]
    spec: PathBuf,

    /// Base URL for the Theta Data API (default: $THETADATA_BASE_URL or http://127.0.0.1:25503/v3)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (default: $THETADATA_TIMEOUT or 30.0)
    #[arg(long)]
    timeout: Option<f64>,

    /// Transport method
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// HTTP host to bind to (sse only)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// HTTP port (sse only)
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// How the `format` query parameter is handled
    #[arg(long, value_enum, default_value_t = FormatPolicy::Default)]
    format_policy: FormatPolicy,

    /// Drop output schemas from tool definitions
    #[arg(long)]
    strip_output_schema: bool,

    /// Only expose tools available at this subscription tier
    #[arg(long)]
    max_tier: Option<Tier>,

    /// YAML/JSON file mapping operationId to a short tool description
    #[arg(long)]
    descriptions: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the MCP framing on stdio; logs always go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "thetadata_mcp={lvl},thetadata_openapi_tools={lvl},rmcp=warn",
            lvl = args.log_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = ServerSettings::resolve(args.base_url.clone(), args.timeout)
        .context("resolve server settings")?;

    let mut descriptions = Descriptions::builtin();
    if let Some(path) = &args.descriptions {
        descriptions
            .merge_file(path)
            .context("load curated descriptions")?;
    }

    let document = SpecDocument::load(&args.spec)
        .with_context(|| format!("load OpenAPI spec {}", args.spec.display()))?;

    let options = ServerOptions {
        transform: TransformConfig {
            format_policy: args.format_policy,
            ..TransformConfig::default()
        },
        strip_output_schema: args.strip_output_schema,
        max_tier: args.max_tier,
        descriptions,
    };
    let server = create_mcp_server(Arc::new(document), &settings, options)
        .context("create MCP server")?;

    tracing::info!("Starting Theta Data MCP Server");

    match args.transport {
        Transport::Stdio => run_stdio_server(server).await,
        Transport::Sse => run_http_server(server, &args.host, args.port).await,
    }
}

async fn run_stdio_server(server: ThetaDataServer) -> anyhow::Result<()> {
    use rmcp::{ServiceExt, transport::stdio};

    tracing::info!("Using stdio transport");

    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_http_server(server: ThetaDataServer, host: &str, port: u16) -> anyhow::Result<()> {
    use axum::Router;
    use rmcp::transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    };

    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new()
        .nest_service("/mcp", mcp_service)
        .route("/health", axum::routing::get(health_check));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!("Theta Data MCP Server listening on http://{}/mcp", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
