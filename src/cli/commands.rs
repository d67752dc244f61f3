use crate::error::{SheetloadError, SheetloadResult};
use crate::excel::TableExporter;
use crate::ingest::IngestService;
use crate::store::Store;
use crate::types::{IngestionResult, TableMetadata};
use colored::Colorize;
use std::path::PathBuf;

/// Execute the ingest command
///
/// Every file is attempted; the command fails if any of them did.
pub async fn ingest(
    service: &IngestService,
    files: Vec<PathBuf>,
    verbose: bool,
) -> SheetloadResult<()> {
    println!("{}", "📥 Sheetload - Ingesting workbooks".bold().green());
    println!("   Files: {}\n", files.len());

    let total = files.len();
    let mut failed = 0;
    for file in &files {
        println!("📄 {}", file.display().to_string().bright_blue().bold());
        match service.ingest_path(file).await {
            Ok(result) if result.success => print_success(&result, verbose),
            Ok(result) => {
                failed += 1;
                print_failure(&result);
            }
            Err(e) => {
                failed += 1;
                println!("   {} {}", "❌ Rejected:".bold().red(), e);
            }
        }
        println!();
    }

    if failed > 0 {
        return Err(SheetloadError::IngestionFailed { failed, total });
    }
    println!("{}", "✅ All workbooks ingested!".bold().green());
    Ok(())
}

fn print_success(result: &IngestionResult, verbose: bool) {
    for table in &result.tables_created {
        println!(
            "   {} {} rows → {}",
            "✅".green(),
            table.rows_count.to_string().bold(),
            table.table_name.bright_yellow().bold()
        );
        if verbose {
            println!("   Columns: {}", table.columns.join(", "));
        }
    }
    println!(
        "   Processed in {} ms",
        result.processing_time.as_millis().to_string().cyan()
    );
}

fn print_failure(result: &IngestionResult) {
    println!(
        "   {}",
        "❌ Ingestion failed, nothing was loaded".bold().red()
    );
    for error in &result.errors {
        match &error.sheet_name {
            Some(sheet) => println!("      • {}: {}", sheet.yellow(), error.message),
            None => println!("      • {}", error.message),
        }
    }
}

/// Execute the list command
pub async fn list(store: &Store, json: bool) -> SheetloadResult<()> {
    let tables = store.list_dynamic_tables().await?;

    if json {
        println!("{}", to_json(&tables)?);
        return Ok(());
    }

    if tables.is_empty() {
        println!("{}", "⚠️  No ingested tables found".yellow());
        return Ok(());
    }

    println!("{}", "📚 Ingested tables".bold().green());
    println!();
    for table in &tables {
        println!(
            "   {:<32} {:>8} rows   {} {}   ingested {}x",
            table.table_name.bright_blue().bold(),
            table.row_count,
            table.quarter,
            table.year,
            table.ingest_count
        );
    }
    println!();
    println!("   {} table(s)", tables.len().to_string().bold());
    Ok(())
}

/// Execute the describe command
pub async fn describe(store: &Store, table: String, json: bool) -> SheetloadResult<()> {
    let metadata = store.get_metadata(&table).await?;

    if json {
        println!("{}", to_json(&metadata)?);
        return Ok(());
    }

    print_metadata(&metadata);
    Ok(())
}

fn print_metadata(metadata: &TableMetadata) {
    println!("{}", metadata.table_name.bold().bright_blue());
    println!("   Category:      {}", metadata.category);
    println!("   Period:        {} {}", metadata.quarter, metadata.year);
    println!("   Rows:          {}", metadata.row_count.to_string().bold());
    println!("   Created:       {}", metadata.created_at);
    println!("   Last ingest:   {}", metadata.last_ingested_at);
    println!("   Ingest count:  {}", metadata.ingest_count);
    println!("   Columns:");
    for column in &metadata.columns {
        println!("      • {}", column.cyan());
    }
}

/// Execute the drop command
pub async fn drop_table(store: &Store, table: String) -> SheetloadResult<()> {
    store.drop_table(&table).await?;
    println!(
        "{} {}",
        "🗑️  Dropped".bold().green(),
        table.bright_yellow().bold()
    );
    Ok(())
}

/// Execute the export command
pub async fn export(
    store: &Store,
    table: String,
    output: Option<PathBuf>,
    verbose: bool,
) -> SheetloadResult<()> {
    println!("{}", "📤 Sheetload - Exporting table".bold().green());
    println!("   Table: {}", table.bright_blue().bold());

    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", table)));
    println!("   Output: {}\n", output.display());

    let (metadata, rows) = store.fetch_rows(&table).await?;
    if verbose {
        println!(
            "   Read {} rows, {} columns",
            rows.len(),
            metadata.columns.len()
        );
    }

    let row_count = rows.len();
    TableExporter::new(metadata, rows).export(&output)?;

    println!(
        "{}",
        format!("✅ Exported {} rows to {}", row_count, output.display())
            .bold()
            .green()
    );
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> SheetloadResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
