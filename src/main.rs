use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::error;

use tagflow::{
    logging, Config, DispatchReport, FilterRule, FilterStage, Manager, Pipeline, Record,
    RenderStage, TagStage, ValidateStage,
};

#[derive(Parser)]
#[command(name = "tagflow")]
#[command(about = "Staged record pipelines with category-tagged dispatch")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a record through the configured pipelines
    Run {
        /// Path to the pipeline configuration file
        #[arg(long, default_value = "tagflow.toml")]
        config: PathBuf,
        /// Path to a JSON file holding the input record
        #[arg(long)]
        input: PathBuf,
        /// Print the full dispatch report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a configuration and dry-build every pipeline it defines
    CheckConfig {
        /// Path to the pipeline configuration file
        #[arg(long, default_value = "tagflow.toml")]
        config: PathBuf,
    },
    /// Dispatch built-in sample records through the standard adapters
    Demo,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            json,
        } => run_dispatch(&config, &input, json)?,
        Commands::CheckConfig { config } => check_config(&config)?,
        Commands::Demo => run_demo()?,
    }
    Ok(())
}

fn run_dispatch(config_path: &Path, input_path: &Path, as_json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("loading pipeline config from '{}'", config_path.display()))?;
    let manager = Manager::from_config(&config).context("building configured pipelines")?;

    let raw = fs::read_to_string(input_path)
        .with_context(|| format!("reading input record from '{}'", input_path.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("parsing input record as JSON")?;

    let report = manager.dispatch_report(&Record::new(payload));
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn check_config(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("loading pipeline config from '{}'", config_path.display()))?;

    println!(
        "🔍 Checking {} pipeline definitions...",
        config.pipelines.len()
    );
    let mut failures = 0;
    for def in &config.pipelines {
        match Pipeline::from_def(def) {
            Ok(pipeline) => {
                println!(
                    "✅ {} ({} stages: {})",
                    pipeline.id(),
                    pipeline.stage_count(),
                    pipeline.stage_names().join(" -> ")
                );
            }
            Err(e) => {
                error!(pipeline_id = %def.id, error = %e, "pipeline definition rejected");
                println!("❌ {}: {}", def.id, e);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{} pipeline definition(s) failed to build", failures);
    }
    println!("✅ Configuration OK");
    Ok(())
}

fn run_demo() -> anyhow::Result<()> {
    println!("🚀 Dispatching sample records through the standard adapters...");

    let mut manager =
        Manager::from_config(&Config::standard()).context("building standard adapters")?;

    // extra pipeline that thins event batches down to errors before rendering
    let mut alerts = Pipeline::new("alerts");
    alerts.add_stage(Box::new(ValidateStage));
    alerts.add_stage(Box::new(TagStage));
    alerts.add_stage(Box::new(FilterStage::new(
        "events",
        FilterRule::Equals("error".to_string()),
    )));
    alerts.add_stage(Box::new(RenderStage));
    manager.add_pipeline(alerts);

    let samples = [
        (
            "sensor reading",
            json!({"sensor": "temp", "value": 23.5, "unit": "C"}),
        ),
        (
            "sensor batch",
            json!({"sensor": "temp", "readings": [21.5, 23.0, 21.8], "unit": "C"}),
        ),
        ("user activity", json!({"action": "logged", "user": "x"})),
        (
            "event stream",
            json!({"stream": "auth", "events": ["login", "error", "logout", "error"]}),
        ),
        (
            "ledger batch",
            json!({"ledger": "acct-7", "operations": [
                {"op": "buy", "amount": 100},
                {"op": "sell", "amount": 75}
            ]}),
        ),
        ("malformed input", json!("123")),
    ];

    for (label, payload) in samples {
        println!("\n📥 {}", label);
        let report = manager.dispatch_report(&Record::new(payload));
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &DispatchReport) {
    println!("\n📊 Dispatch results ({} pipelines):", report.total);
    for outcome in &report.outcomes {
        if let Some(summary) = &outcome.summary {
            println!("   {} -> {}", outcome.pipeline_id, summary);
        } else if let Some(error) = &outcome.error {
            println!("   {} -> ⚠️  {}", outcome.pipeline_id, error);
        } else {
            println!("   {} -> (no summary rendered)", outcome.pipeline_id);
        }
    }
    println!(
        "   Succeeded: {}   Failed: {}",
        report.succeeded, report.failed
    );
}
