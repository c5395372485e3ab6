//! Movement CLI commands
//!
//! `income`, `expense` and `transfer` add movements; `movement` lists,
//! edits, deletes and converts them.

use clap::{Args, Subcommand};

use crate::config::{Settings, SortPreference};
use crate::currency::format_amount;
use crate::display::movement::{format_bulk_outcome, format_movement_details, format_movement_page};
use crate::display::Names;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{CreationMode, Frequency, Movement, MovementId, MovementKind};
use crate::services::{
    AccountService, CategoryService, MovementFilter, MovementInput, MovementPatch,
    MovementService, TransferInput,
};
use crate::storage::Storage;

use super::account::{account_or_recent, touch_recents};
use super::{clearable, date_or_today, parse_currency, parse_date, parse_money, parse_period};

/// List key the movement sort preference is stored under
const SORT_KEY: &str = "movements";

/// Fields shared by income and expense entry
#[derive(Args)]
pub struct IncomeArgs {
    /// Amount (e.g. "1500" or "1.500,50")
    pub amount: String,
    /// Account name or ID (defaults to the last one used)
    #[arg(short, long)]
    pub account: Option<String>,
    /// Category name or ID
    #[arg(short, long)]
    pub category: Option<String>,
    /// Date (YYYY-MM-DD, defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,
    /// Note
    #[arg(short, long)]
    pub note: Option<String>,
    /// Path or URL of a receipt
    #[arg(long)]
    pub attachment: Option<String>,
    /// Do not run the auto-categorization rules
    #[arg(long)]
    pub no_rules: bool,
}

#[derive(Args)]
pub struct ExpenseArgs {
    #[command(flatten)]
    pub common: IncomeArgs,
    /// Split a credit-card purchase into this many installments
    #[arg(short, long)]
    pub installments: Option<u32>,
    /// Statement period to bill a credit-card expense in (YYYY-MM)
    #[arg(short, long)]
    pub period: Option<String>,
}

#[derive(Args)]
pub struct TransferArgs {
    /// Source account name or ID
    pub from: String,
    /// Destination account name or ID
    pub to: String,
    /// Amount taken from the source account
    pub amount: String,
    /// Amount credited on the destination (converted at the configured rate if omitted)
    #[arg(short, long)]
    pub received: Option<String>,
    /// Date (YYYY-MM-DD, defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,
    /// Note
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Movement subcommands
#[derive(Subcommand)]
pub enum MovementCommands {
    /// List movements
    List {
        /// Only income, expense or transfer
        #[arg(short, long)]
        kind: Option<String>,
        /// Only movements touching this account
        #[arg(short, long)]
        account: Option<String>,
        /// Only movements in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only movements in this currency
        #[arg(long)]
        currency: Option<String>,
        /// From date (inclusive)
        #[arg(long)]
        from: Option<String>,
        /// To date (inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Text to look for in notes
        #[arg(short, long)]
        search: Option<String>,
        /// Sort as field:direction, e.g. "amount:asc"; remembered for next time
        #[arg(long)]
        sort: Option<String>,
        /// Show at most this many rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a movement
    Show {
        /// Movement ID
        movement: String,
    },
    /// Edit a movement
    Edit {
        /// Movement ID
        movement: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        /// Amount received on the destination of a transfer
        #[arg(long)]
        received: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
        /// Category name or ID ("none" clears it)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
        /// Attachment ("none" clears it)
        #[arg(long)]
        attachment: Option<String>,
        /// Statement period YYYY-MM ("none" clears it)
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Delete a movement
    Delete {
        /// Movement ID
        movement: String,
    },
    /// Delete several movements
    BulkDelete {
        /// Movement IDs
        #[arg(required = true)]
        movements: Vec<String>,
    },
    /// Apply the same change to several movements
    BulkUpdate {
        /// Movement IDs
        #[arg(required = true)]
        movements: Vec<String>,
        /// Category name or ID ("none" clears it)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Delete every installment of the purchase a movement belongs to
    DeleteGroup {
        /// ID of any installment of the purchase
        movement: String,
    },
    /// Turn a movement into a recurring transaction
    ToRecurring {
        /// Movement ID
        movement: String,
        /// daily, weekly, biweekly, monthly, monthly:DAY, yearly, every:DAYS
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
        /// confirm (ask each time) or auto
        #[arg(short, long, default_value = "confirm")]
        mode: String,
        /// Template name (defaults to the note or category)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show the current balance of an account
    Balance {
        /// Account name or ID
        account: String,
    },
}

fn movement_input(
    storage: &Storage,
    settings: &Settings,
    args: &IncomeArgs,
) -> BilleteraResult<MovementInput> {
    let account = account_or_recent(storage, settings, args.account.as_deref())?;
    let mut input = MovementInput::new(
        account.id,
        date_or_today(args.date.as_deref(), settings)?,
        parse_money(&args.amount)?,
    );
    if let Some(category) = &args.category {
        input.category_id = Some(CategoryService::new(storage).resolve(category)?.id);
    }
    input.note = args.note.clone().unwrap_or_default();
    input.attachment = args.attachment.clone();
    input.auto_categorize = !args.no_rules;
    Ok(input)
}

fn print_added(label: &str, movement: &Movement, names: &Names) {
    println!(
        "Added {}: {} on {}",
        label,
        format_amount(movement.amount, movement.currency),
        movement.date.format("%Y-%m-%d")
    );
    println!("  Account:  {}", names.account(movement.account_id));
    if movement.category_id.is_some() {
        println!("  Category: {}", names.category(movement.category_id));
    }
    if let Some(period) = movement.statement_period {
        println!("  Statement: {}", period);
    }
    println!("  ID: {}", movement.id);
}

/// Handle `billetera income`
pub fn handle_income_command(
    storage: &Storage,
    settings: &mut Settings,
    args: IncomeArgs,
) -> BilleteraResult<()> {
    let input = movement_input(storage, settings, &args)?;
    let movement = MovementService::new(storage, settings).add_income(input)?;

    print_added("income", &movement, &Names::load(storage)?);
    touch_recents(settings, &movement);
    Ok(())
}

/// Handle `billetera expense`
pub fn handle_expense_command(
    storage: &Storage,
    settings: &mut Settings,
    args: ExpenseArgs,
) -> BilleteraResult<()> {
    let mut input = movement_input(storage, settings, &args.common)?;
    input.statement_period = args.period.as_deref().map(parse_period).transpose()?;
    let service = MovementService::new(storage, settings);
    let names = Names::load(storage)?;

    let movement = match args.installments {
        Some(count) if count > 1 => {
            let installments = service.add_expense_with_installments(input, count)?;
            let Some(first) = installments.first().cloned() else {
                return Err(BilleteraError::Validation("No installments created".into()));
            };
            println!(
                "Added purchase of {} in {} installments on {}",
                format_amount(
                    installments.iter().map(|m| m.amount).sum(),
                    first.currency
                ),
                count,
                names.account(first.account_id)
            );
            for m in &installments {
                println!(
                    "  {}  {}  {:>16}  [{}]",
                    m.installment.map(|i| i.to_string()).unwrap_or_default(),
                    m.date.format("%Y-%m-%d"),
                    format_amount(m.amount, m.currency),
                    m.statement_period.map(|p| p.to_string()).unwrap_or_default()
                );
            }
            first
        }
        _ => {
            let movement = service.add_expense(input)?;
            print_added("expense", &movement, &names);
            movement
        }
    };

    touch_recents(settings, &movement);
    Ok(())
}

/// Handle `billetera transfer`
pub fn handle_transfer_command(
    storage: &Storage,
    settings: &mut Settings,
    args: TransferArgs,
) -> BilleteraResult<()> {
    let accounts = AccountService::new(storage);
    let from = accounts.resolve(&args.from)?;
    let to = accounts.resolve(&args.to)?;

    let input = TransferInput {
        from_account_id: from.id,
        to_account_id: to.id,
        date: date_or_today(args.date.as_deref(), settings)?,
        amount: parse_money(&args.amount)?,
        destination_amount: args.received.as_deref().map(parse_money).transpose()?,
        note: args.note.unwrap_or_default(),
    };
    let movement = MovementService::new(storage, settings).add_transfer(input)?;

    println!(
        "Transferred {} from {} to {}",
        format_amount(movement.amount, from.currency),
        from.name,
        to.name
    );
    if let Some(received) = movement.destination_amount {
        if from.currency != to.currency {
            println!("  Received: {}", format_amount(received, to.currency));
        }
    }
    println!("  ID: {}", movement.id);

    touch_recents(settings, &movement);
    Ok(())
}

fn resolve_all(service: &MovementService, refs: &[String]) -> BilleteraResult<Vec<MovementId>> {
    refs.iter().map(|r| service.resolve(r).map(|m| m.id)).collect()
}

fn category_change(storage: &Storage, input: &str) -> BilleteraResult<Option<crate::models::CategoryId>> {
    match clearable(input) {
        Some(reference) => Ok(Some(CategoryService::new(storage).resolve(reference)?.id)),
        None => Ok(None),
    }
}

/// Handle a movement command
pub fn handle_movement_command(
    storage: &Storage,
    settings: &mut Settings,
    cmd: MovementCommands,
) -> BilleteraResult<()> {
    match cmd {
        MovementCommands::List {
            kind,
            account,
            category,
            currency,
            from,
            to,
            search,
            sort,
            limit,
        } => {
            if let Some(sort) = sort {
                let pref = SortPreference::parse(&sort).ok_or_else(|| {
                    BilleteraError::Validation(format!(
                        "Invalid sort: '{}'. Use date|amount with :asc|:desc",
                        sort
                    ))
                })?;
                settings.set_sort_preference(SORT_KEY, pref);
            }

            let filter = MovementFilter {
                kind: kind
                    .as_deref()
                    .map(|k| {
                        MovementKind::parse(k).ok_or_else(|| {
                            BilleteraError::Validation(format!("Invalid movement kind: '{}'", k))
                        })
                    })
                    .transpose()?,
                account_id: account
                    .as_deref()
                    .map(|a| AccountService::new(storage).resolve(a).map(|a| a.id))
                    .transpose()?,
                category_id: category
                    .as_deref()
                    .map(|c| CategoryService::new(storage).resolve(c).map(|c| c.id))
                    .transpose()?,
                currency: currency.as_deref().map(parse_currency).transpose()?,
                from: from.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                to: to.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                text: search,
            };

            let service = MovementService::new(storage, settings);
            let mut page = service.list(&filter, settings.sort_preference(SORT_KEY))?;
            let total = page.movements.len();
            if let Some(limit) = limit {
                page.movements.truncate(limit);
            }
            print!("{}", format_movement_page(&page, &Names::load(storage)?));
            if page.movements.len() < total {
                println!("(showing {} of {})", page.movements.len(), total);
            }
        }

        MovementCommands::Show { movement } => {
            let found = MovementService::new(storage, settings).resolve(&movement)?;
            print!("{}", format_movement_details(&found, &Names::load(storage)?));
        }

        MovementCommands::Edit {
            movement,
            date,
            amount,
            received,
            account,
            category,
            note,
            attachment,
            period,
        } => {
            let patch = MovementPatch {
                date: date.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                amount: amount.as_deref().map(parse_money).transpose()?,
                destination_amount: received.as_deref().map(parse_money).transpose()?,
                account_id: account
                    .as_deref()
                    .map(|a| AccountService::new(storage).resolve(a).map(|a| a.id))
                    .transpose()?,
                category_id: category
                    .as_deref()
                    .map(|c| category_change(storage, c))
                    .transpose()?,
                note,
                attachment: attachment.as_deref().map(|a| clearable(a).map(String::from)),
                statement_period: period
                    .as_deref()
                    .map(|p| clearable(p).map(parse_period).transpose())
                    .transpose()?,
            };
            if patch.is_empty() {
                println!("No changes specified.");
                return Ok(());
            }

            let service = MovementService::new(storage, settings);
            let found = service.resolve(&movement)?;
            let updated = service.update_movement(found.id, patch)?;
            println!("Updated movement: {}", updated);
        }

        MovementCommands::Delete { movement } => {
            let service = MovementService::new(storage, settings);
            let found = service.resolve(&movement)?;
            let deleted = service.delete_movement(found.id)?;
            println!("Deleted movement: {}", deleted);
        }

        MovementCommands::BulkDelete { movements } => {
            let service = MovementService::new(storage, settings);
            let ids = resolve_all(&service, &movements)?;
            let outcome = service.bulk_delete_movements(&ids);
            print!("{}", format_bulk_outcome("Deleted", &outcome));
        }

        MovementCommands::BulkUpdate {
            movements,
            category,
            note,
            date,
            account,
        } => {
            let patch = MovementPatch {
                category_id: category
                    .as_deref()
                    .map(|c| category_change(storage, c))
                    .transpose()?,
                note,
                date: date.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                account_id: account
                    .as_deref()
                    .map(|a| AccountService::new(storage).resolve(a).map(|a| a.id))
                    .transpose()?,
                ..Default::default()
            };
            if patch.is_empty() {
                println!("No changes specified.");
                return Ok(());
            }

            let service = MovementService::new(storage, settings);
            let ids = resolve_all(&service, &movements)?;
            let outcome = service.bulk_update_movements(&ids, &patch);
            print!("{}", format_bulk_outcome("Updated", &outcome));
        }

        MovementCommands::DeleteGroup { movement } => {
            let service = MovementService::new(storage, settings);
            let found = service.resolve(&movement)?;
            let group = found.installment_group.ok_or_else(|| {
                BilleteraError::Validation(format!("Movement {} is not an installment", found.id))
            })?;
            let deleted = service.delete_installment_group(group)?;
            println!("Deleted {} installment(s)", deleted.len());
        }

        MovementCommands::ToRecurring {
            movement,
            frequency,
            mode,
            name,
        } => {
            let frequency = Frequency::parse(&frequency).ok_or_else(|| {
                BilleteraError::Validation(format!("Invalid frequency: '{}'", frequency))
            })?;
            let mode = CreationMode::parse(&mode).ok_or_else(|| {
                BilleteraError::Validation(format!("Invalid mode: '{}'. Use confirm or auto", mode))
            })?;

            let service = MovementService::new(storage, settings);
            let found = service.resolve(&movement)?;
            let template = service.convert_to_recurring(found.id, frequency, mode, name)?;
            println!("Created recurring transaction: {}", template);
            println!("  Starts: {}", template.start_date.format("%Y-%m-%d"));
            println!("  ID: {}", template.id);
        }

        MovementCommands::Balance { account } => {
            let account = AccountService::new(storage).resolve(&account)?;
            let balance = MovementService::new(storage, settings).account_balance(account.id)?;
            println!("{}: {}", account.name, format_amount(balance, account.currency));
        }
    }

    Ok(())
}
