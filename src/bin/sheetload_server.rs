//! Sheetload API Server binary
//!
//! HTTP REST API for workbook uploads and the table catalog.

use std::path::PathBuf;

use clap::Parser;
use sheetload::api::{run_api_server, ApiConfig};
use sheetload::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "sheetload-server")]
#[command(version)]
#[command(about = "Sheetload API Server - HTTP upload endpoint for quarterly workbooks")]
#[command(long_about = r#"
Sheetload API Server - HTTP REST API

Endpoints:
  - POST   /api/v1/upload              - Ingest a workbook (multipart field "file")
  - GET    /api/v1/tables              - List ingested tables
  - GET    /api/v1/tables/:name        - Row count and columns of a table
  - GET    /api/v1/tables/:name/export - Download a table as .xlsx
  - DELETE /api/v1/tables/:name        - Drop a table

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Example usage:
  sheetload-server                           # Start on localhost:8080
  sheetload-server --host 0.0.0.0 --port 3000

  curl -F "file=@Sales_Q1_2025.xlsx" http://localhost:8080/api/v1/upload
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETLOAD_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SHEETLOAD_PORT")]
    port: u16,

    /// YAML configuration file
    #[arg(short, long, env = "SHEETLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Datastore URL (overrides the config file)
    #[arg(long, env = "SHEETLOAD_DATABASE_URL")]
    database_url: Option<String>,

    /// Largest accepted upload in bytes (overrides the config file)
    #[arg(long, env = "SHEETLOAD_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut app_config = AppConfig::load(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        app_config.store.database_url = url;
    }
    if let Some(max) = args.max_upload_bytes {
        app_config.ingest.max_upload_bytes = max;
    }
    app_config.validate()?;

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config, app_config).await
}
