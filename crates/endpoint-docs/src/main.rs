use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use thetadata_endpoint_docs::{TierOutcome, default_tiers, generate, write_documents};
use thetadata_openapi_tools::document::SpecDocument;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate endpoints_by_subscription markdown from the OpenAPI spec
#[derive(Parser, Debug)]
#[command(name = "thetadata-endpoint-docs")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the OpenAPI spec file
    #[arg(long, default_value = "openapiv3.yaml")]
    spec: PathBuf,

    /// Output directory for markdown files
    #[arg(long, default_value = "endpoints_by_subscription")]
    output_dir: PathBuf,

    /// Subscription tiers to generate (always processed lowest first)
    #[arg(long, num_args = 1.., default_values_t = default_tiers())]
    tiers: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let document = SpecDocument::load(&args.spec)
        .with_context(|| format!("load OpenAPI spec {}", args.spec.display()))?;

    let report = generate(document.raw(), &args.tiers)
        .with_context(|| format!("read endpoints from {}", args.spec.display()))?;
    write_documents(&report, &args.output_dir).context("write tier documents")?;

    for outcome in &report.outcomes {
        match outcome {
            TierOutcome::Generated(doc) => println!(
                "Generated {} ({} total endpoints)",
                args.output_dir.join(&doc.file_name).display(),
                doc.endpoint_count
            ),
            TierOutcome::Missing(tier) => println!("No endpoints found for tier: {tier}"),
        }
    }
    println!("\nTotal endpoints across all tiers: {}", report.total_endpoints);

    Ok(())
}
