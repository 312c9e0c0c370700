use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use intake_data::SubTypeLoader;
use intake_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load document subtypes (series) from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - document_type_key: key of an existing document type (e.g. INV)
/// - sub_type_key: series key, unique within the type
/// - name: display name
/// - start_date, end_date: inclusive validity window (YYYY-MM-DD)
/// - is_active: true/false or 1/0, blank means active
///
/// Every document type named in the file has its subtypes replaced.
#[derive(Parser, Debug)]
#[command(name = "intake-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing subtype data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "intake.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading subtypes from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = SubTypeLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let inserted = SubTypeLoader::load(&repo, &records)
        .await
        .context("Failed to load subtypes into database")?;

    println!("Successfully loaded {} subtypes into the database.", inserted);

    Ok(())
}
