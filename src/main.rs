use clap::{Parser, Subcommand};
use sheetload::cli;
use sheetload::config::AppConfig;
use sheetload::error::SheetloadResult;
use sheetload::ingest::IngestService;
use sheetload::store::Store;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetload")]
#[command(about = "Load quarterly multi-sheet Excel workbooks into period tables")]
#[command(long_about = "Sheetload - Quarterly workbook ingestion

Every workbook becomes one table named <category>_q<quarter>_<year>, taken
from its file name (Sales_Q1_2025.xlsx → sales_q1_2025). Each sheet is one
region (Q1-Central, Q1-NW, ...). Row 1 is a title, row 2 holds the headers,
data starts at row 3. All sheets must share the same headers; a workbook
is loaded completely or not at all.

COMMANDS:
  ingest    - Load one or more workbooks
  list      - List ingested tables
  describe  - Show row count and columns of a table
  export    - Write a table back to .xlsx (one sheet per region)
  drop      - Drop a table

EXAMPLES:
  sheetload ingest Sales_Q1_2025.xlsx
  sheetload --database-url sqlite://data.db list
  sheetload export sales_q1_2025 -o sales.xlsx")]
#[command(version)]
struct Cli {
    /// Datastore URL (overrides the config file)
    #[arg(long, global = true, env = "SHEETLOAD_DATABASE_URL")]
    database_url: Option<String>,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "SHEETLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Largest accepted workbook in bytes (overrides the config file)
    #[arg(long, global = true, env = "SHEETLOAD_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest quarterly workbooks
    Ingest {
        /// Path(s) to .xlsx workbook(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Show the columns of each created table
        #[arg(short, long)]
        verbose: bool,
    },

    /// List ingested tables
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show metadata for one table
    Describe {
        /// Table name, e.g. sales_q1_2025
        table: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export a table to .xlsx
    Export {
        /// Table name, e.g. sales_q1_2025
        table: String,

        /// Output file (defaults to <table>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show verbose export steps
        #[arg(short, long)]
        verbose: bool,
    },

    /// Drop a table and its registry entry
    Drop {
        /// Table name, e.g. sales_q1_2025
        table: String,
    },
}

fn load_config(cli: &Cli) -> SheetloadResult<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.database_url {
        config.store.database_url = url.clone();
    }
    if let Some(max) = cli.max_upload_bytes {
        config.ingest.max_upload_bytes = max;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> SheetloadResult<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetload=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = Store::connect(&config.store).await?;

    let outcome = match cli.command {
        Commands::Ingest { files, verbose } => {
            let service = IngestService::new(store.clone(), config.ingest);
            cli::ingest(&service, files, verbose).await
        }

        Commands::List { json } => cli::list(&store, json).await,

        Commands::Describe { table, json } => cli::describe(&store, table, json).await,

        Commands::Export {
            table,
            output,
            verbose,
        } => cli::export(&store, table, output, verbose).await,

        Commands::Drop { table } => cli::drop_table(&store, table).await,
    };

    store.close().await;
    outcome
}
