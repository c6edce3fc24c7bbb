use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use airport_traffic::app::ingest_use_case::IngestUseCase;
use airport_traffic::config::Config;
use airport_traffic::domain::{MetricFamily, SourceDocument, TrafficRecord};
use airport_traffic::infra::csv_export;
use airport_traffic::infra::gemini_extractor::GeminiFieldExtractor;
use airport_traffic::infra::text_extractor::DocumentTextExtractor;
use airport_traffic::observability::metrics::IngestMetrics;
use airport_traffic::observability::{init_logging, init_metrics, render_metrics};
use airport_traffic::pipeline::dedup::DedupPolicy;
use airport_traffic::pipeline::repository::DatasetRepository;
use airport_traffic::pipeline::sort::{sort_records, SortConfig, SortDirection, SortKey};
use airport_traffic::pipeline::storage::SqliteBlobStore;
use airport_traffic::pipeline::trends;

#[derive(Parser)]
#[command(name = "airport_traffic")]
#[command(about = "Consolidate monthly airport traffic reports into one deduplicated dataset")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and merge traffic records from report files
    Ingest {
        /// Report files (PDF, XLSX, XLS, CSV, TXT)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Duplicate checks to apply: record or layered
        #[arg(long)]
        policy: Option<DedupPolicy>,
        /// Only one metric family is present: passengers, cargo, or movements
        #[arg(long)]
        hint: Option<MetricFamily>,
        /// Print the Prometheus metrics snapshot after the run
        #[arg(long)]
        print_metrics: bool,
    },
    /// List records in table order
    List {
        /// Column to order by; newest year first when omitted
        #[arg(long)]
        sort: Option<SortKey>,
        /// asc or desc; a newly chosen column starts ascending
        #[arg(long)]
        direction: Option<SortDirection>,
        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print per-period totals for each airport, oldest first
    Trends,
    /// List processed files
    Files,
    /// Remove a processed file and every record it contributed
    DeleteFile { name: String },
    /// Remove all records and the processed-file ledger
    Wipe {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Write the dataset to <dir>/<name>_Master_Export.csv
    Export {
        #[arg(long, default_value = "AAI_Master_Database")]
        name: String,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print headline totals
    Totals,
    /// Add a hand-entered record
    AddRecord {
        #[arg(long)]
        airport: String,
        #[arg(long)]
        month: String,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value_t = 0.0)]
        passengers: f64,
        #[arg(long, default_value_t = 0.0)]
        cargo: f64,
        #[arg(long, default_value_t = 0.0)]
        atms: f64,
    },
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("invalid file name: {}", path.display()))?;
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SourceDocument::new(name, bytes))
        })
        .collect()
}

fn format_growth(growth: Option<f64>) -> String {
    growth.map(|g| format!("{:+.1}%", g)).unwrap_or_else(|| "-".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = init_logging("logs");
    init_metrics();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let store = SqliteBlobStore::open(&config.store.path)?;
    let repo = DatasetRepository::new(Arc::new(store));
    let mut dataset = repo.load().await?;
    info!(records = dataset.len(), files = dataset.ledger().len(), "Dataset loaded");

    match cli.command {
        Commands::Ingest {
            files,
            policy,
            hint,
            print_metrics,
        } => {
            let documents = read_documents(&files)?;
            let text = DocumentTextExtractor::new(config.text.endpoint.clone(), config.extraction.timeout())?;
            let fields = GeminiFieldExtractor::new(&config.extraction, config.extraction.api_key()?)?;

            let use_case = IngestUseCase::new(Arc::new(text), Arc::new(fields))
                .with_policy(policy.unwrap_or(config.ingest.policy))
                .with_retry_policy(config.extraction.retry_policy())
                .with_hint(hint);

            println!("🔄 Processing {} files...", documents.len());
            let summary = use_case.run(&mut dataset, &repo, documents).await?;

            println!("\n📊 {}", summary.message());
            for (file, accepted) in &summary.accepted_by_file {
                println!("   {}: {} new records", file, accepted);
            }
            if summary.unrecognized_months > 0 {
                println!(
                    "⚠️  {} records had an unrecognized month label and were keyed as January",
                    summary.unrecognized_months
                );
            }
            println!("   Dataset now holds {} records", dataset.len());

            if print_metrics {
                if let Some(snapshot) = render_metrics() {
                    println!("\n{}", snapshot);
                }
            }
        }
        Commands::List {
            sort,
            direction,
            limit,
        } => {
            let order = SortConfig::from_selection(sort, direction);
            let ordered = sort_records(dataset.records(), order.key, order.direction);
            let limit = limit.unwrap_or(ordered.len());
            println!(
                "{:<6} {:<10} {:<30} {:>12} {:>8} {:>12} {:>8} {:>10} {:>8}",
                "Year", "Month", "Airport", "Total Pax", "Pax YoY", "Cargo", "Cgo YoY", "ATMs", "ATM YoY"
            );
            for record in ordered.into_iter().take(limit) {
                println!(
                    "{:<6} {:<10} {:<30} {:>12} {:>8} {:>12} {:>8} {:>10} {:>8}",
                    record.year,
                    record.month,
                    record.airport_name,
                    record.passengers.total,
                    format_growth(record.passengers.growth_percentage),
                    record.cargo.total,
                    format_growth(record.cargo.growth_percentage),
                    record.atms.total,
                    format_growth(record.atms.growth_percentage),
                );
            }
        }
        Commands::Trends => {
            for period in trends::aggregate(dataset.records()) {
                println!("📅 {}", period.period);
                for (airport, m) in &period.airports {
                    println!(
                        "   {:<30} pax {:>12}  cargo {:>10}  atms {:>8}",
                        airport, m.passengers, m.cargo, m.movements
                    );
                }
            }
        }
        Commands::Files => {
            if dataset.ledger().is_empty() {
                println!("No files processed yet");
            }
            for meta in dataset.ledger().entries() {
                println!(
                    "{}  {:>5} records  {}",
                    meta.processed_at.format("%Y-%m-%d %H:%M:%S"),
                    meta.record_count,
                    meta.name
                );
            }
        }
        Commands::DeleteFile { name } => {
            let removed = dataset.remove_file(&name);
            if removed.meta.is_none() {
                warn!(file = %name, "File was not in the processed-file ledger");
            }
            repo.save(&dataset).await?;
            IngestMetrics::file_deleted();
            println!("🗑️  Removed {} and {} records", name, removed.records_removed);
        }
        Commands::Wipe { yes } => {
            if !yes {
                bail!("refusing to wipe the dataset without --yes");
            }
            dataset.wipe();
            repo.clear().await?;
            IngestMetrics::dataset_wiped();
            println!("🧹 Dataset cleared");
        }
        Commands::Export { name, dir } => {
            let path = csv_export::export_to_file(dataset.records(), Path::new(&dir), &name)?;
            println!("✅ Exported {} records to {}", dataset.len(), path.display());
        }
        Commands::Totals => {
            let totals = trends::totals(dataset.records());
            println!("Records:    {}", dataset.len());
            println!("Airports:   {}", trends::unique_airports(dataset.records()).len());
            println!("Passengers: {}", totals.passengers);
            println!("Cargo:      {}", totals.cargo);
            println!("ATMs:       {}", totals.movements);
        }
        Commands::AddRecord {
            airport,
            month,
            year,
            passengers,
            cargo,
            atms,
        } => {
            let mut record = TrafficRecord {
                airport_name: airport,
                month,
                year,
                ..Default::default()
            };
            record.passengers.total = passengers;
            record.cargo.total = cargo;
            record.atms.total = atms;

            if dataset.insert_manual(record) {
                repo.save(&dataset).await?;
                println!("✅ Record added; dataset now holds {} records", dataset.len());
            } else {
                println!("⏭️  A record for that airport and period already exists");
            }
        }
    }

    Ok(())
}
