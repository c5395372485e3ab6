//! Credit-card statement CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::currency::format_amount;
use crate::display::statement::{format_period_options, format_statement_summary};
use crate::error::BilleteraResult;
use crate::models::{Account, YearMonth};
use crate::services::{AccountService, StatementService};
use crate::storage::Storage;

use super::{date_or_today, parse_currency, parse_money, parse_period, today};

#[derive(Subcommand)]
pub enum StatementCommands {
    /// List the statement periods offered for new expenses on a card
    Periods {
        /// Card name or ID
        account: String,
    },
    /// Show charges, payments and the outstanding amount of a statement
    Show {
        /// Card name or ID
        account: String,
        /// Period (YYYY-MM); defaults to the first unpaid one
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Record a statement payment
    Pay {
        /// Card name or ID
        account: String,
        /// Amount paid
        amount: String,
        /// Period (YYYY-MM); defaults to the first unpaid one
        #[arg(short, long)]
        period: Option<String>,
        /// Currency of the payment; defaults to the card's
        #[arg(short, long)]
        currency: Option<String>,
        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// List the payments recorded for a card
    Payments {
        /// Card name or ID
        account: String,
    },
}

fn period_or_default(
    service: &StatementService,
    account: &Account,
    period: Option<&str>,
) -> BilleteraResult<YearMonth> {
    match period {
        Some(p) => parse_period(p),
        None => service.default_period(account, today()),
    }
}

pub fn handle_statement_command(
    storage: &Storage,
    settings: &Settings,
    cmd: StatementCommands,
) -> BilleteraResult<()> {
    let accounts = AccountService::new(storage);
    let service = StatementService::new(storage);

    match cmd {
        StatementCommands::Periods { account } => {
            let card = accounts.resolve(&account)?;
            let options = service.periods_for(&card, today())?;
            let paid = service.paid_keys(card.id)?;
            println!("Statement periods for {}:", card.name);
            print!("{}", format_period_options(&options, &paid));
        }

        StatementCommands::Show { account, period } => {
            let card = accounts.resolve(&account)?;
            let period = period_or_default(&service, &card, period.as_deref())?;
            let summary = service.summary(&card, period)?;
            let payments = service.payments(card.id)?;
            print!("{}", format_statement_summary(&card, &summary, &payments));
        }

        StatementCommands::Pay {
            account,
            amount,
            period,
            currency,
            date,
        } => {
            let card = accounts.resolve(&account)?;
            let period = period_or_default(&service, &card, period.as_deref())?;
            let currency = match currency {
                Some(c) => parse_currency(&c)?,
                None => card.currency,
            };
            let payment = service.record_payment(
                &card,
                period,
                currency,
                parse_money(&amount)?,
                date_or_today(date.as_deref(), settings)?,
            )?;
            println!(
                "Recorded payment of {} for the {} statement of {}",
                format_amount(payment.amount, payment.currency),
                payment.period.label(),
                card.name
            );
        }

        StatementCommands::Payments { account } => {
            let card = accounts.resolve(&account)?;
            let payments = service.payments(card.id)?;
            if payments.is_empty() {
                println!("No payments recorded for {}.", card.name);
            }
            for payment in payments {
                println!(
                    "  {}  {}  {:>16}",
                    payment.period,
                    payment.date.format("%Y-%m-%d"),
                    format_amount(payment.amount, payment.currency)
                );
            }
        }
    }

    Ok(())
}
