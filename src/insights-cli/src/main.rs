//! Survey Insights — offline snapshot runner.
//!
//! Loads a JSON event log, computes the statistics snapshot for the selected
//! time window, and prints it to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use insights_core::{EngineConfig, EventRecord, MemoryStore, TimeRange};
use insights_engine::SnapshotEngine;
use insights_metrics::RefreshKey;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "insights-cli")]
#[command(about = "Compute survey analytics snapshots from a JSON event log")]
#[command(version)]
struct Cli {
    /// Path to a JSON array of event records
    #[arg(long, env = "SURVEY_INSIGHTS__EVENTS")]
    events: PathBuf,

    /// Time window selector: 24h, 7d, 30d or all (use --start/--end for a
    /// custom window)
    #[arg(long, default_value = "7d", conflicts_with_all = ["start", "end"])]
    range: String,

    /// Custom window start (RFC 3339)
    #[arg(long, requires = "end")]
    start: Option<DateTime<Utc>>,

    /// Custom window end (RFC 3339)
    #[arg(long, requires = "start")]
    end: Option<DateTime<Utc>>,

    /// Recompute a single card instead of the whole snapshot
    /// (e.g. surveyFunnel, signups, dropoffAnalysis)
    #[arg(long)]
    refresh: Option<String>,

    /// Pretty-print the snapshot JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

impl Cli {
    fn window(&self) -> anyhow::Result<TimeRange> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            return Ok(TimeRange::Custom { start, end });
        }
        serde_json::from_value(serde_json::Value::String(self.range.clone()))
            .with_context(|| format!("Unknown range selector: {}", self.range))
    }

    fn refresh_key(&self) -> anyhow::Result<RefreshKey> {
        let Some(key) = &self.refresh else {
            return Ok(RefreshKey::All);
        };
        serde_json::from_value(serde_json::Value::String(key.clone()))
            .with_context(|| format!("Unknown refresh key: {key}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insights=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });

    let raw = std::fs::read_to_string(&cli.events)
        .with_context(|| format!("Failed to read {}", cli.events.display()))?;
    let events: Vec<EventRecord> =
        serde_json::from_str(&raw).context("Failed to parse event log")?;
    info!(events = events.len(), path = %cli.events.display(), "Event log loaded");

    let window = cli.window()?;
    let key = cli.refresh_key()?;

    let engine = SnapshotEngine::new(Arc::new(MemoryStore::new(events)), &config);
    let snapshot = engine.refresh(window, key).await?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{output}");

    Ok(())
}
