//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use crate::config::Settings;
use crate::currency::{convert_money, format_amount};
use crate::display::account::{format_account_details, format_account_list};
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{Money, Movement};
use crate::services::{AccountPatch, AccountService, CreateAccountInput};
use crate::storage::Storage;

use super::{parse_currency, parse_money};

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Currency (ARS or USD)
        #[arg(short, long, default_value = "ARS")]
        currency: String,
        /// Make it a credit card closing on this day of the month (1-31)
        #[arg(long, value_name = "DAY")]
        card: Option<u32>,
        /// Initial balance (e.g. "1000" or "1.000,50")
        #[arg(short, long, default_value = "0")]
        balance: String,
    },
    /// List accounts with balances
    List {
        /// Include archived accounts
        #[arg(short, long)]
        all: bool,
    },
    /// Show account details
    Show {
        /// Account name or ID
        account: String,
    },
    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New statement closing day (credit cards only)
        #[arg(long, value_name = "DAY")]
        closing_day: Option<u32>,
        /// New initial balance
        #[arg(short, long)]
        balance: Option<String>,
    },
    /// Archive an account
    Archive {
        /// Account name or ID
        account: String,
    },
    /// Unarchive an account
    Unarchive {
        /// Account name or ID
        account: String,
    },
    /// Delete an account without movements
    Delete {
        /// Account name or ID
        account: String,
    },
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AccountCommands,
) -> BilleteraResult<()> {
    let service = AccountService::new(storage);

    match cmd {
        AccountCommands::Create {
            name,
            currency,
            card,
            balance,
        } => {
            let currency = parse_currency(&currency)?;
            let mut input = match card {
                Some(day) => CreateAccountInput::credit_card(&name, currency, day),
                None => CreateAccountInput::new(&name, currency),
            };
            input.initial_balance = parse_money(&balance)?;

            let account = service.create(input)?;

            println!("Created account: {}", account.name);
            println!("  Currency: {}", account.currency);
            if let Some(day) = account.statement_closing_day() {
                println!("  Credit card, closes on day {}", day);
            }
            println!(
                "  Initial Balance: {}",
                format_amount(account.initial_balance, account.currency)
            );
            println!("  ID: {}", account.id);
        }

        AccountCommands::List { all } => {
            let summaries = service.list_with_balances(all)?;
            print!("{}", format_account_list(&summaries));

            if summaries.len() > 1 {
                let target = settings.display_currency;
                let total: Money = summaries
                    .iter()
                    .filter(|s| !s.account.archived)
                    .map(|s| {
                        convert_money(s.balance, s.account.currency, target, &settings.exchange_rates)
                    })
                    .sum::<BilleteraResult<Money>>()?;
                println!("Net worth: {}", format_amount(total, target));
            }
        }

        AccountCommands::Show { account } => {
            let found = service.resolve(&account)?;
            let summary = service.summary(found)?;
            print!("{}", format_account_details(&summary));
        }

        AccountCommands::Edit {
            account,
            name,
            closing_day,
            balance,
        } => {
            let found = service.resolve(&account)?;
            let patch = AccountPatch {
                name,
                closing_day,
                initial_balance: balance.as_deref().map(parse_money).transpose()?,
            };
            if patch.name.is_none() && patch.closing_day.is_none() && patch.initial_balance.is_none() {
                println!("No changes specified. Use --name, --closing-day or --balance.");
                return Ok(());
            }

            let updated = service.update(found.id, patch)?;
            println!("Updated account: {}", updated.name);
        }

        AccountCommands::Archive { account } => {
            let found = service.resolve(&account)?;
            let archived = service.archive(found.id)?;
            println!("Archived account: {}", archived.name);
        }

        AccountCommands::Unarchive { account } => {
            let found = service.resolve(&account)?;
            let unarchived = service.unarchive(found.id)?;
            println!("Unarchived account: {}", unarchived.name);
        }

        AccountCommands::Delete { account } => {
            let found = service.resolve(&account)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted account: {}", deleted.name);
        }
    }

    Ok(())
}

/// Resolve an optional account reference, falling back to the most recent one
pub(crate) fn account_or_recent(
    storage: &Storage,
    settings: &Settings,
    reference: Option<&str>,
) -> BilleteraResult<crate::models::Account> {
    let service = AccountService::new(storage);
    if let Some(reference) = reference {
        return service.resolve(reference);
    }
    for id in &settings.recent_accounts {
        if let Some(account) = service.get(*id)? {
            if !account.archived {
                return Ok(account);
            }
        }
    }
    Err(BilleteraError::Validation(
        "No account given. Use --account <name>".into(),
    ))
}

/// Remember the accounts and category a new movement used
pub(crate) fn touch_recents(settings: &mut Settings, movement: &Movement) {
    if let Some(to) = movement.destination_account_id {
        settings.touch_recent_account(to);
    }
    settings.touch_recent_account(movement.account_id);
    if let Some(category_id) = movement.category_id {
        settings.touch_recent_category(category_id);
    }
}
