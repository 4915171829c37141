//! buildpulse CLI - build telemetry over a stats file
//!
//! Usage:
//!   buildpulse init                         Write a default buildpulse.toml
//!   buildpulse report --stats <file> --provider webpack
//!                                           Aggregate, filter, and emit metrics

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use buildpulse_core::fail_open::{fail_open, fail_open_with_retries};
use buildpulse_core::PulseConfig;
use buildpulse_graph::GraphBuilder;
use buildpulse_metrics::{
    adapter_for, aggregate, apply_filters, default_filters, to_sendable, BuildFacts,
};
use buildpulse_sink::{write_snapshot, HttpSink, MetricSink};

#[derive(Parser)]
#[command(name = "buildpulse")]
#[command(author, version, about = "Build telemetry: time, size, and why")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default buildpulse.toml to the repository root
    Init {
        /// Repository path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Aggregate a build-tool stats file into metrics
    Report {
        /// Path to the stats JSON file
        #[arg(long)]
        stats: PathBuf,

        /// Which build tool produced the stats
        #[arg(long, value_enum)]
        provider: Provider,

        /// Write the filtered metric series to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Send the series to the configured endpoint
        #[arg(long)]
        send: bool,

        /// Repository root holding buildpulse.toml
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Provider {
    Webpack,
    Esbuild,
}

impl Provider {
    fn as_str(self) -> &'static str {
        match self {
            Self::Webpack => "webpack",
            Self::Esbuild => "esbuild",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => {
            PulseConfig::write_default(&path)?;
            println!("Wrote {}", path.join("buildpulse.toml").display());
            Ok(())
        }
        Commands::Report {
            stats,
            provider,
            out,
            send,
            root,
        } => report(stats, provider, out, send, root).await,
    }
}

async fn report(
    stats_path: PathBuf,
    provider: Provider,
    out: Option<PathBuf>,
    send: bool,
    root: PathBuf,
) -> Result<()> {
    let config = PulseConfig::load_or_default(&root)?;

    let raw = std::fs::read_to_string(&stats_path)
        .with_context(|| format!("reading {}", stats_path.display()))?;
    let stats: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", stats_path.display()))?;

    let adapter = adapter_for(provider.as_str())?;

    // Each stats source fails open: a malformed section costs its own
    // metrics only.
    let provider_facts = match adapter.facts(&stats) {
        Ok(facts) => Some(facts),
        Err(e) => {
            warn!("skipping provider facts: {}", e);
            None
        }
    };

    let mut builder = GraphBuilder::new();
    match adapter.modules(&stats) {
        Ok(modules) => builder.record_pass(&modules),
        Err(e) => warn!("skipping dependency graph: {}", e),
    }
    builder.reconcile();
    let graph = builder.results();

    let chunk_count = graph
        .values()
        .flat_map(|node| node.chunks.iter())
        .collect::<BTreeSet<_>>()
        .len();

    let general = provider_facts
        .as_ref()
        .map(|facts| facts.general(chunk_count))
        .unwrap_or_default();

    let facts = BuildFacts {
        general,
        graph,
        provider: provider_facts,
        ..BuildFacts::default()
    };

    let metrics = aggregate(&facts, config.keep_tree_metrics);
    let filters = default_filters(config.thresholds, config.keep_tree_metrics);
    let timestamp = Utc::now().timestamp();

    let series: Vec<_> = metrics
        .into_iter()
        .filter_map(|metric| apply_filters(metric, &filters))
        .map(|metric| {
            to_sendable(
                &metric,
                &config.global_tags,
                Some(config.prefix.as_str()),
                timestamp,
            )
        })
        .collect();

    info!("{} metrics after filtering", series.len());

    if let Some(out) = out {
        fail_open("snapshot_writer", || write_snapshot(&out, &series)).await;
    }

    if send {
        // Transient endpoint failures get a few attempts before giving up.
        let endpoint = config.endpoint.as_str();
        let api_key_env = config.api_key_env.as_str();
        let batch = &series;
        fail_open_with_retries(
            "metric_sink",
            move || async move {
                let sink = HttpSink::from_env(endpoint, api_key_env)?;
                sink.send(batch).await
            },
            3,
        )
        .await;
    }

    println!("Emitted {} metrics", series.len());
    Ok(())
}
