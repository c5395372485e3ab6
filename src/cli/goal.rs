//! Goal CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::currency::format_amount;
use crate::display::budget::{format_goal_details, format_goal_list};
use crate::display::Names;
use crate::error::BilleteraResult;
use crate::services::{GoalPatch, GoalService};
use crate::storage::Storage;

use super::budget::{parse_scope, scope_from_flags};
use super::{clearable, date_or_today, parse_currency, parse_date, parse_money, today};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a saving goal
    Create {
        /// Goal name
        name: String,
        /// Target amount
        target: String,
        #[arg(long, default_value = "ARS")]
        currency: String,
        /// Count saving in one category only
        #[arg(short, long, conflicts_with = "account")]
        category: Option<String>,
        /// Count the balance change of one account
        #[arg(short, long)]
        account: Option<String>,
        /// Start counting from (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// List goals with progress
    List,
    /// Show a goal in detail
    Show { goal: String },
    /// Edit a goal
    Edit {
        /// Goal name or ID
        goal: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<String>,
        /// Scope: "all", "category:<name>" or "account:<name>"
        #[arg(short, long)]
        scope: Option<String>,
        #[arg(long)]
        start: Option<String>,
        /// Deadline ("none" removes it)
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// Delete a goal
    Delete { goal: String },
}

pub fn handle_goal_command(
    storage: &Storage,
    settings: &Settings,
    cmd: GoalCommands,
) -> BilleteraResult<()> {
    let service = GoalService::new(storage);

    match cmd {
        GoalCommands::Create {
            name,
            target,
            currency,
            category,
            account,
            start,
            deadline,
        } => {
            let scope = scope_from_flags(storage, category.as_deref(), account.as_deref())?;
            let goal = service.create(
                &name,
                parse_money(&target)?,
                parse_currency(&currency)?,
                scope,
                date_or_today(start.as_deref(), settings)?,
                deadline.as_deref().map(|d| parse_date(d, settings)).transpose()?,
            )?;
            println!(
                "Created goal: {} (target {})",
                goal.name,
                format_amount(goal.target_amount, goal.currency)
            );
            println!("  ID: {}", goal.id);
        }

        GoalCommands::List => {
            let progress = service
                .list()?
                .iter()
                .map(|goal| service.progress(goal, today()))
                .collect::<BilleteraResult<Vec<_>>>()?;
            print!("{}", format_goal_list(&progress, &Names::load(storage)?));
        }

        GoalCommands::Show { goal } => {
            let found = service.resolve(&goal)?;
            let progress = service.progress(&found, today())?;
            print!("{}", format_goal_details(&progress, &Names::load(storage)?));
        }

        GoalCommands::Edit {
            goal,
            name,
            target,
            scope,
            start,
            deadline,
        } => {
            let found = service.resolve(&goal)?;
            let patch = GoalPatch {
                name,
                target_amount: target.as_deref().map(parse_money).transpose()?,
                scope: scope.as_deref().map(|s| parse_scope(storage, s)).transpose()?,
                start_date: start.as_deref().map(|d| parse_date(d, settings)).transpose()?,
                deadline: deadline
                    .as_deref()
                    .map(|d| clearable(d).map(|d| parse_date(d, settings)).transpose())
                    .transpose()?,
            };
            let updated = service.update(found.id, patch)?;
            println!("Updated goal: {}", updated.name);
        }

        GoalCommands::Delete { goal } => {
            let found = service.resolve(&goal)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted goal: {}", deleted.name);
        }
    }

    Ok(())
}
