// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use aquachain::graph::{build_supply_chain_graph, EdgeKind};
use aquachain::metrics::{detect_bottlenecks, fmt_days};
use aquachain::quality::{DataQualityEngine, Severity};
use aquachain::{collect_alerts, load_batches, load_logistics, load_transactions};
use aquachain::{AnalyticsReport, Config, Dataset};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Parser)]
#[command(name = "aquachain")]
#[command(about = "Aquachain - Supply Chain Graph & Metrics Engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    source: SourceArgs,

    /// Bottleneck factor: a move is slow when duration > factor × mean
    #[arg(long, global = true, env = "AQUACHAIN_BOTTLENECK_FACTOR")]
    factor: Option<f64>,

    /// Reference day for overdue/delayed alerts (default: today)
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    as_of: Option<NaiveDate>,
}

#[derive(Args)]
struct SourceArgs {
    /// Directory with transactions.csv, batches.csv and logistics.csv
    #[arg(long, global = true, env = "AQUACHAIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Transactions CSV
    #[arg(long, global = true)]
    transactions: Option<PathBuf>,

    /// Batches CSV
    #[arg(long, global = true)]
    batches: Option<PathBuf>,

    /// Logistics CSV
    #[arg(long, global = true)]
    logistics: Option<PathBuf>,

    /// Extra CSV files; the record kind is detected from name and headers
    #[arg(long = "file", global = true, value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Use the built-in demo data
    #[arg(long, global = true)]
    demo: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analytics report (default)
    Report {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Graph statistics and edges
    Graph {
        /// Print Graphviz DOT instead
        #[arg(long)]
        dot: bool,
    },

    /// Chronological path of one batch through the network
    Trace {
        #[arg(value_name = "BATCH_ID")]
        batch_id: String,
    },

    /// Logistics legs slower than factor × mean transit time
    Bottlenecks,

    /// Overdue payments and delayed shipments
    Alerts,

    /// Data quality checks on the input files
    Validate,

    /// Interactive terminal view
    #[cfg(feature = "tui")]
    Ui,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --json and --dot
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?
        .with_data_dir(cli.source.data_dir.clone())
        .with_bottleneck_factor(cli.factor)?;
    let today = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let dataset = load_dataset(&cli.source, &config)?;

    match cli.command.unwrap_or(Commands::Report { json: false }) {
        Commands::Report { json } => run_report(&dataset, &config, today, json),
        Commands::Graph { dot } => run_graph(&dataset, dot),
        Commands::Trace { batch_id } => run_trace(&dataset, &batch_id),
        Commands::Bottlenecks => run_bottlenecks(&dataset, &config),
        Commands::Alerts => run_alerts(&dataset, today),
        Commands::Validate => run_validate(&dataset),
        #[cfg(feature = "tui")]
        Commands::Ui => run_ui_mode(&dataset, &config, today),
    }
}

/// Demo flag > explicit files > data directory > demo fallback
fn load_dataset(source: &SourceArgs, config: &Config) -> Result<Dataset> {
    if source.demo {
        return Ok(Dataset::demo());
    }

    let explicit = source.transactions.is_some()
        || source.batches.is_some()
        || source.logistics.is_some()
        || !source.files.is_empty();

    if explicit {
        let mut dataset = Dataset::from_files(&source.files)?;
        if let Some(path) = &source.transactions {
            dataset.transactions.extend(load_transactions(path)?);
        }
        if let Some(path) = &source.batches {
            dataset.batches.extend(load_batches(path)?);
        }
        if let Some(path) = &source.logistics {
            dataset.logistics.extend(load_logistics(path)?);
        }
        return Ok(dataset);
    }

    match &config.data_dir {
        Some(dir) => Dataset::from_dir(dir),
        None => {
            tracing::warn!("No data source configured, using demo data");
            Ok(Dataset::demo())
        }
    }
}

fn run_report(dataset: &Dataset, config: &Config, today: NaiveDate, json: bool) -> Result<()> {
    let report = AnalyticsReport::generate(dataset, &config.engine, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🐟 Aquachain - Supply Chain Report");
    println!("{}", RULE);
    println!("Report: {}", report.report_id);
    println!("As of:  {}\n", report.as_of);

    for line in report.summary_lines() {
        println!("✓ {}", line);
    }

    if !report.graph.top_nodes.is_empty() {
        println!("\n🔗 Most connected nodes:");
        for node in &report.graph.top_nodes {
            println!(
                "   {:<28} {:<9} in {:>2}  out {:>2}",
                node.name,
                node.kind.as_str(),
                node.in_degree,
                node.out_degree
            );
        }
    }

    println!("{}", RULE);
    Ok(())
}

fn run_graph(dataset: &Dataset, dot: bool) -> Result<()> {
    let graph = build_supply_chain_graph(
        &dataset.transactions,
        &dataset.batches,
        &dataset.logistics,
    );

    if dot {
        println!("{}", graph.to_dot());
        return Ok(());
    }

    let stats = graph.stats();
    println!("🕸️  Supply Chain Network");
    println!("{}", RULE);
    println!("✓ Nodes: {} ({} entities, {} locations, {} batches)",
        stats.node_count, stats.entity_count, stats.location_count, stats.batch_count);
    println!("✓ Edges: {} ({} transactions, {} logistics)\n",
        stats.edge_count, stats.transaction_edges, stats.logistics_edges);

    for edge in graph.edges() {
        let arrow = match edge.edge.kind {
            EdgeKind::Transaction => "💰",
            EdgeKind::Logistics => "🚚",
        };
        println!("{} {} → {}  [{}]", arrow, edge.from, edge.to, edge.edge);
    }
    Ok(())
}

fn run_trace(dataset: &Dataset, batch_id: &str) -> Result<()> {
    let graph = build_supply_chain_graph(
        &dataset.transactions,
        &dataset.batches,
        &dataset.logistics,
    );
    let steps = graph.batch_trace(batch_id)?;

    println!("📦 Batch {}", batch_id);
    if let Some(node) = graph.node(batch_id) {
        if let Some(origin) = &node.origin {
            println!("   Origin: {}", origin);
        }
        if let Some(status) = &node.status {
            println!("   Status: {}", status);
        }
    }
    println!("{}", RULE);

    if steps.is_empty() {
        println!("No movements recorded");
    }
    for (i, step) in steps.iter().enumerate() {
        println!(
            "{:>2}. {} → {}  ({}, {})",
            i + 1,
            step.from,
            step.to,
            step.edge.kind.as_str(),
            step.edge.date.as_deref().unwrap_or("no date")
        );
    }
    Ok(())
}

fn run_bottlenecks(dataset: &Dataset, config: &Config) -> Result<()> {
    let factor = config.engine.bottleneck_factor;
    let bottlenecks = detect_bottlenecks(&dataset.logistics, factor);

    println!("🚧 Logistics Bottlenecks (> {:.1}x mean transit)", factor);
    println!("{}", RULE);

    if bottlenecks.is_empty() {
        println!("✅ No bottlenecks detected");
        return Ok(());
    }

    println!("Mean transit: {}, threshold: {}\n",
        fmt_days(Some(bottlenecks[0].average_days)),
        fmt_days(Some(bottlenecks[0].threshold_days)));

    for b in &bottlenecks {
        let mv = &b.logistics_move;
        println!(
            "⚠️  {} {} → {}: {} days{}",
            mv.batch_id,
            mv.from_location,
            mv.to_location,
            b.duration_days,
            mv.shipment_id
                .as_deref()
                .map(|s| format!(" (shipment {})", s))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn run_alerts(dataset: &Dataset, today: NaiveDate) -> Result<()> {
    let alerts = collect_alerts(dataset, today);

    println!("🔔 Alerts as of {}", today);
    println!("{}", RULE);

    if alerts.is_empty() {
        println!("✅ Nothing overdue or delayed");
    }
    for alert in &alerts {
        println!("⚠️  {}", alert.message);
    }
    Ok(())
}

fn run_validate(dataset: &Dataset) -> Result<()> {
    let report = DataQualityEngine::new().validate(dataset);

    println!("🔍 Data Quality");
    println!("{}", RULE);

    for issue in &report.issues {
        let icon = match issue.severity {
            Severity::Critical => "❌",
            Severity::Warning => "⚠️ ",
            Severity::Info => "ℹ️ ",
        };
        println!(
            "{} {} line {} [{}]: {}",
            icon, issue.kind, issue.line, issue.field, issue.issue
        );
        println!("     → {}", issue.recommendation);
    }

    println!("{}", RULE);
    println!("{}", report.summary());

    if report.has_critical_issues() {
        eprintln!("❌ Critical data quality issues found");
        std::process::exit(1);
    }
    println!("✅ No critical issues");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(dataset: &Dataset, config: &Config, today: NaiveDate) -> Result<()> {
    println!("🖥️  Loading Aquachain UI...\n");

    let mut app = ui::App::new(dataset, &config.engine, today);
    println!("✓ {} edges, {} batches\n", app.edges.len(), app.batches.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}
