//! Scheduled transaction CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::currency::format_amount;
use crate::display::recurring::format_scheduled_list;
use crate::display::Names;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{MovementKind, ScheduledStatus, ScheduledTransaction};
use crate::services::{AccountService, CategoryService, ScheduledPatch, ScheduledService};
use crate::storage::Storage;

use super::{clearable, parse_date, parse_money, today};

#[derive(Subcommand)]
pub enum ScheduledCommands {
    /// Plan a one-off movement for a future date
    Create {
        /// income, expense or transfer
        kind: String,
        /// Account name or ID (source account for transfers)
        account: String,
        /// Amount
        amount: String,
        /// Date (YYYY-MM-DD)
        date: String,
        /// Destination account for transfers
        #[arg(long)]
        to: Option<String>,
        /// Amount credited to the destination when currencies differ
        #[arg(long)]
        received: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
        /// Post automatically when due instead of waiting for approval
        #[arg(long)]
        auto: bool,
    },
    /// List scheduled transactions
    List {
        /// pending, approved or rejected
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Due items waiting for approval
    Due,
    /// Edit a pending scheduled transaction
    Edit {
        /// Scheduled transaction ID
        scheduled: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        received: Option<String>,
        /// Category ("none" clears it)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
        /// Require approval: true or false
        #[arg(long)]
        approval: Option<bool>,
    },
    /// Delete a scheduled transaction
    Delete { scheduled: String },
    /// Post a pending item now
    Approve { scheduled: String },
    /// Discard a pending item
    Reject { scheduled: String },
    /// Post every due item that does not need approval
    Process,
}

pub fn handle_scheduled_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ScheduledCommands,
) -> BilleteraResult<()> {
    let service = ScheduledService::new(storage, settings);

    match cmd {
        ScheduledCommands::Create {
            kind,
            account,
            amount,
            date,
            to,
            received,
            category,
            note,
            auto,
        } => {
            let kind = MovementKind::parse(&kind).ok_or_else(|| {
                BilleteraError::Validation(format!(
                    "Invalid kind: '{}'. Use income, expense or transfer",
                    kind
                ))
            })?;
            let accounts = AccountService::new(storage);
            let account = accounts.resolve(&account)?;

            let mut item = ScheduledTransaction::new(
                kind,
                account.id,
                parse_date(&date, settings)?,
                parse_money(&amount)?,
                account.currency,
            );
            if let Some(to) = to {
                item.destination_account_id = Some(accounts.resolve(&to)?.id);
            }
            item.destination_amount = received.as_deref().map(parse_money).transpose()?;
            if let Some(category) = category {
                item.category_id = Some(CategoryService::new(storage).resolve(&category)?.id);
            }
            item.note = note.unwrap_or_default();
            item.requires_approval = !auto;

            let created = service.create(item)?;
            println!("Scheduled: {}", created);
            println!("  ID: {}", created.id);
        }

        ScheduledCommands::List { status } => {
            let status = status
                .map(|s| {
                    ScheduledStatus::parse(&s).ok_or_else(|| {
                        BilleteraError::Validation(format!(
                            "Invalid status: '{}'. Use pending, approved or rejected",
                            s
                        ))
                    })
                })
                .transpose()?;
            let items = service.list(status)?;
            print!("{}", format_scheduled_list(&items, &Names::load(storage)?, today()));
        }

        ScheduledCommands::Due => {
            let items = service.awaiting_approval(today())?;
            if items.is_empty() {
                println!("Nothing waiting for approval.");
            } else {
                print!("{}", format_scheduled_list(&items, &Names::load(storage)?, today()));
            }
        }

        ScheduledCommands::Edit {
            scheduled,
            date,
            amount,
            received,
            category,
            note,
            approval,
        } => {
            let found = service.resolve(&scheduled)?;
            let patch = ScheduledPatch {
                date: date.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                amount: amount.as_deref().map(parse_money).transpose()?,
                destination_amount: received.as_deref().map(parse_money).transpose()?,
                category_id: category
                    .as_deref()
                    .map(|c| {
                        clearable(c)
                            .map(|c| CategoryService::new(storage).resolve(c).map(|c| c.id))
                            .transpose()
                    })
                    .transpose()?,
                note,
                requires_approval: approval,
            };
            let updated = service.update(found.id, patch)?;
            println!("Updated: {}", updated);
        }

        ScheduledCommands::Delete { scheduled } => {
            let found = service.resolve(&scheduled)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted: {}", deleted);
        }

        ScheduledCommands::Approve { scheduled } => {
            let found = service.resolve(&scheduled)?;
            let movement = service.approve(found.id)?;
            println!(
                "Approved: {} on {}",
                format_amount(movement.amount, movement.currency),
                movement.date.format("%Y-%m-%d")
            );
            println!("  Movement: {}", movement.id);
        }

        ScheduledCommands::Reject { scheduled } => {
            let found = service.resolve(&scheduled)?;
            let rejected = service.reject(found.id)?;
            println!("Rejected: {}", rejected);
        }

        ScheduledCommands::Process => {
            let posted = service.process_due(today())?;
            if posted.is_empty() {
                println!("No scheduled transactions due.");
            } else {
                println!("Posted {} scheduled transaction(s)", posted.len());
            }
        }
    }

    Ok(())
}
