//! Recurring transaction CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::currency::format_amount;
use crate::display::recurring::{format_pending_occurrences, format_recurring_list};
use crate::display::Names;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{CreationMode, Frequency, MovementKind, RecurringTransaction};
use crate::services::{AccountService, CategoryService, RecurringPatch, RecurringService};
use crate::storage::Storage;

use super::account::account_or_recent;
use super::{clearable, date_or_today, parse_date, parse_money, today};

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Create a recurring income or expense
    Create {
        /// Template name
        name: String,
        /// Amount of each occurrence
        amount: String,
        /// income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// daily, weekly, biweekly, monthly, monthly:DAY, yearly, every:DAYS
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
        /// First occurrence (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        start: Option<String>,
        /// Last possible occurrence
        #[arg(short, long)]
        end: Option<String>,
        /// confirm (ask each time) or auto
        #[arg(short, long, default_value = "confirm")]
        mode: String,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List recurring transactions with their next date
    List,
    /// Edit a recurring transaction
    Edit {
        /// Name or ID
        recurring: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
        /// Category ("none" clears it)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        frequency: Option<String>,
        /// End date ("none" removes it)
        #[arg(short, long)]
        end: Option<String>,
        #[arg(short, long)]
        mode: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Pause a recurring transaction
    Pause { recurring: String },
    /// Resume a paused recurring transaction
    Resume { recurring: String },
    /// Delete a recurring transaction (its movements are kept)
    Delete { recurring: String },
    /// Occurrences due and waiting for confirmation
    Pending,
    /// Create the movement for an occurrence
    Confirm {
        recurring: String,
        /// Occurrence date (YYYY-MM-DD)
        date: String,
        /// Use this amount instead of the template's
        #[arg(short, long)]
        amount: Option<String>,
    },
    /// Skip an occurrence
    Skip {
        recurring: String,
        /// Occurrence date (YYYY-MM-DD)
        date: String,
    },
    /// Create movements for every due occurrence of automatic templates
    Process,
}

fn parse_frequency(input: &str) -> BilleteraResult<Frequency> {
    Frequency::parse(input).ok_or_else(|| {
        BilleteraError::Validation(format!(
            "Invalid frequency: '{}'. Use daily, weekly, biweekly, monthly, monthly:DAY, yearly or every:DAYS",
            input
        ))
    })
}

fn parse_mode(input: &str) -> BilleteraResult<CreationMode> {
    CreationMode::parse(input).ok_or_else(|| {
        BilleteraError::Validation(format!("Invalid mode: '{}'. Use confirm or auto", input))
    })
}

pub fn handle_recurring_command(
    storage: &Storage,
    settings: &Settings,
    cmd: RecurringCommands,
) -> BilleteraResult<()> {
    let service = RecurringService::new(storage);

    match cmd {
        RecurringCommands::Create {
            name,
            amount,
            kind,
            account,
            category,
            frequency,
            start,
            end,
            mode,
            note,
        } => {
            let kind = MovementKind::parse(&kind).ok_or_else(|| {
                BilleteraError::Validation(format!("Invalid kind: '{}'. Use income or expense", kind))
            })?;
            let account = account_or_recent(storage, settings, account.as_deref())?;

            let mut template = RecurringTransaction::new(
                name,
                kind,
                parse_money(&amount)?,
                account.currency,
                account.id,
                parse_frequency(&frequency)?,
                date_or_today(start.as_deref(), settings)?,
                parse_mode(&mode)?,
            );
            if let Some(category) = category {
                template.category_id = Some(CategoryService::new(storage).resolve(&category)?.id);
            }
            template.end_date = end.as_deref().map(|d| parse_date(d, settings)).transpose()?;
            template.note = note.unwrap_or_default();

            let created = service.create(template)?;
            println!("Created recurring transaction: {}", created);
            println!("  First date: {}", created.start_date.format("%Y-%m-%d"));
            println!("  ID: {}", created.id);
        }

        RecurringCommands::List => {
            let stats = service.list_with_stats(today())?;
            print!("{}", format_recurring_list(&stats, &Names::load(storage)?));
        }

        RecurringCommands::Edit {
            recurring,
            name,
            amount,
            account,
            category,
            frequency,
            end,
            mode,
            note,
        } => {
            let found = service.resolve(&recurring)?;
            let patch = RecurringPatch {
                name,
                amount: amount.as_deref().map(parse_money).transpose()?,
                account_id: account
                    .as_deref()
                    .map(|a| AccountService::new(storage).resolve(a).map(|a| a.id))
                    .transpose()?,
                category_id: category
                    .as_deref()
                    .map(|c| {
                        clearable(c)
                            .map(|c| CategoryService::new(storage).resolve(c).map(|c| c.id))
                            .transpose()
                    })
                    .transpose()?,
                note,
                frequency: frequency.as_deref().map(parse_frequency).transpose()?,
                end_date: end
                    .as_deref()
                    .map(|d| clearable(d).map(|d| parse_date(d, settings)).transpose())
                    .transpose()?,
                creation_mode: mode.as_deref().map(parse_mode).transpose()?,
            };
            let updated = service.update(found.id, patch)?;
            println!("Updated recurring transaction: {}", updated);
        }

        RecurringCommands::Pause { recurring } => {
            let found = service.resolve(&recurring)?;
            let paused = service.pause(found.id)?;
            println!("Paused: {}", paused.name);
        }

        RecurringCommands::Resume { recurring } => {
            let found = service.resolve(&recurring)?;
            let resumed = service.resume(found.id)?;
            println!("Resumed: {}", resumed.name);
        }

        RecurringCommands::Delete { recurring } => {
            let found = service.resolve(&recurring)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted recurring transaction: {}", deleted.name);
        }

        RecurringCommands::Pending => {
            let pending = service.pending(today())?;
            print!("{}", format_pending_occurrences(&pending));
        }

        RecurringCommands::Confirm {
            recurring,
            date,
            amount,
        } => {
            let found = service.resolve(&recurring)?;
            let movement = service.confirm_occurrence(
                found.id,
                parse_date(&date, settings)?,
                amount.as_deref().map(parse_money).transpose()?,
            )?;
            println!(
                "Confirmed {} on {}: {}",
                found.name,
                movement.date.format("%Y-%m-%d"),
                format_amount(movement.amount, movement.currency)
            );
            println!("  Movement: {}", movement.id);
        }

        RecurringCommands::Skip { recurring, date } => {
            let found = service.resolve(&recurring)?;
            let date = parse_date(&date, settings)?;
            service.skip_occurrence(found.id, date)?;
            println!("Skipped {} on {}", found.name, date.format("%Y-%m-%d"));
        }

        RecurringCommands::Process => {
            let created = service.process_due(today())?;
            if created.is_empty() {
                println!("No automatic occurrences due.");
            } else {
                println!("Created {} movement(s)", created.len());
            }
        }
    }

    Ok(())
}
