//! CLI commands for data export

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};

use crate::config::Settings;
use crate::error::{BilleteraError, BilleteraResult};
use crate::export::{export_full_json, export_full_yaml, export_movements_csv, FullExport};
use crate::services::{AccountService, CategoryService, MovementFilter};
use crate::storage::Storage;

use super::parse_date;

/// Export format for the full database
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// JSON (machine-readable)
    Json,
    /// YAML (human-readable)
    Yaml,
}

/// Output format for a movement export
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MovementFormat {
    /// CSV with account and category names
    Csv,
    /// JSON array of movements
    Json,
    /// YAML list of movements
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export every entity to a file
    All {
        /// Output file path
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export movements
    Movements {
        /// Output file path
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: MovementFormat,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// From date (inclusive)
        #[arg(long)]
        from: Option<String>,
        /// To date (inclusive)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show what an export would contain
    Info,
}

fn create_file(output: &Path) -> BilleteraResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        BilleteraError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> BilleteraResult<()> {
    match cmd {
        ExportCommands::All {
            output,
            format,
            pretty,
        } => {
            let mut writer = create_file(&output)?;
            match format {
                ExportFormat::Json => export_full_json(storage, &mut writer, pretty)?,
                ExportFormat::Yaml => export_full_yaml(storage, &mut writer)?,
            }
            println!("Full database exported to: {}", output.display());
        }

        ExportCommands::Movements {
            output,
            format,
            account,
            category,
            from,
            to,
        } => {
            let filter = MovementFilter {
                account_id: account
                    .as_deref()
                    .map(|a| AccountService::new(storage).resolve(a).map(|a| a.id))
                    .transpose()?,
                category_id: category
                    .as_deref()
                    .map(|c| CategoryService::new(storage).resolve(c).map(|c| c.id))
                    .transpose()?,
                from: from.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                to: to.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                ..Default::default()
            };

            let mut movements = storage.movements.filter(|m| filter.matches(m))?;
            movements.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

            let mut writer = create_file(&output)?;
            match format {
                MovementFormat::Csv => export_movements_csv(storage, &movements, writer)?,
                MovementFormat::Json => serde_json::to_writer_pretty(&mut writer, &movements)?,
                MovementFormat::Yaml => serde_yaml::to_writer(&mut writer, &movements)?,
            }
            println!("Exported {} movements to: {}", movements.len(), output.display());
        }

        ExportCommands::Info => {
            let export = FullExport::from_storage(storage)?;

            println!("Export Information");
            println!("==================\n");
            println!("Schema Version: {}", export.schema_version);
            println!("App Version:    {}", export.app_version);
            println!();
            println!("Data Summary:");
            println!("  Accounts:     {}", export.metadata.account_count);
            println!("  Movements:    {}", export.metadata.movement_count);
            println!("  Categories:   {}", export.metadata.category_count);
            println!("  Budgets:      {}", export.budgets.len());
            println!("  Goals:        {}", export.goals.len());
            println!("  Recurring:    {}", export.recurring.len());
            println!("  Scheduled:    {}", export.scheduled.len());
            println!("  Rules:        {}", export.rules.len());

            if let Some(earliest) = &export.metadata.earliest_movement {
                println!();
                println!("Movement Date Range:");
                println!("  Earliest: {}", earliest);
            }
            if let Some(latest) = &export.metadata.latest_movement {
                println!("  Latest:   {}", latest);
            }
        }
    }

    Ok(())
}
