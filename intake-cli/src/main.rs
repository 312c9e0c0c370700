use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;

use intake_cli::answers::Answers;
use intake_cli::app;
use intake_cli::config::{AppConfig, CliOverrides};
use intake_cli::logging;
use intake_core::DocumentRepository;
use intake_core::dates::parse_calendar_date;
use intake_core::wizard::WizardController;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Document intake wizard.
///
/// Connects to the configured backend, inspects the option sets the wizard
/// resolves, and creates documents from an answers file.
#[derive(Debug, Parser)]
#[command(name = "doc-intake", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `intake.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Operating user name.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Responsibility centre assigned to the user.
    #[arg(long, global = true)]
    centre: Option<i64>,

    /// Log level or `EnvFilter` directive (`RUST_LOG` wins when set).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List document types.
    Types,

    /// List the subtypes valid for a document type on a date.
    Subtypes {
        /// Document type key.
        #[arg(long = "type")]
        type_key: String,

        /// Document date; defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// List the circuits a document type may use.
    Circuits {
        /// Document type key.
        #[arg(long = "type")]
        type_key: String,
    },

    /// Run the wizard with the values of an answers file and create the
    /// document.
    Create {
        /// TOML answers file.
        #[arg(long)]
        answers: PathBuf,

        /// Date the session opens on; defaults to today.
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_calendar_date(s).map_err(|e| e.to_string())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        backend: cli.backend,
        db: cli.db,
        user: cli.user,
        centre: cli.centre,
        log_level: cli.log_level,
        log_file: cli.log_file,
    };
    let config = AppConfig::resolve(cli.config.as_deref(), overrides)?;
    logging::init_logging(&config.logging)?;

    debug!("connecting to {} backend", config.database.backend);
    let repo = app::open_repository(&config).await?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Types => {
            let types = repo
                .list_document_types()
                .await
                .context("Failed to list document types")?;
            print!("{}", app::render_document_types(&types));
        }
        Command::Subtypes { type_key, date } => {
            let resolution =
                app::resolve_sub_types(repo, &type_key, date.unwrap_or(today)).await?;
            print!("{}", app::render_sub_types(&resolution));
        }
        Command::Circuits { type_key } => {
            let circuits = app::resolve_circuits(repo, &type_key).await?;
            print!("{}", app::render_circuits(&circuits));
        }
        Command::Create { answers, today: opened_on } => {
            let answers = Answers::load(&answers)?;
            let mut wizard =
                WizardController::with_repository(config.profile(), repo, opened_on.unwrap_or(today));
            let document = app::run_wizard(&mut wizard, &answers).await?;
            println!("Created document {} \"{}\"", document.id, document.title);
            if document.circuit_id.is_none() {
                println!("No circuit: the document is static.");
            }
        }
    }

    Ok(())
}
