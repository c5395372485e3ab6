//! Auto-categorization rule CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::rule::{format_rule_details, format_rule_list};
use crate::display::Names;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{
    Action, ActionField, Condition, ConditionField, MatchMode, Movement, MovementKind, Operator,
};
use crate::services::{AccountService, CategoryService, RuleInput, RulePatch, RuleService};
use crate::storage::Storage;

use super::account::account_or_recent;
use super::{parse_money, today};

#[derive(Subcommand)]
pub enum RuleCommands {
    /// Create a rule
    Create {
        /// Rule name
        name: String,
        /// Condition as "FIELD OPERATOR VALUE", e.g. "note contains uber" (repeatable)
        #[arg(short, long = "when")]
        conditions: Vec<String>,
        /// Match when any condition holds instead of all
        #[arg(long)]
        any: bool,
        /// Higher priority rules are tried first
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
        /// Category to assign
        #[arg(long)]
        set_category: Option<String>,
        /// Replace the note
        #[arg(long)]
        set_note: Option<String>,
        /// Append to the note
        #[arg(long)]
        append_note: Option<String>,
    },
    /// List rules in evaluation order
    List,
    /// Show a rule
    Show { rule: String },
    /// Edit a rule; conditions or actions given here replace the old ones
    Edit {
        /// Rule name or ID
        rule: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long = "when")]
        conditions: Vec<String>,
        /// all or any
        #[arg(short, long)]
        mode: Option<String>,
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i32>,
        #[arg(long)]
        set_category: Option<String>,
        #[arg(long)]
        set_note: Option<String>,
        #[arg(long)]
        append_note: Option<String>,
    },
    /// Enable a rule
    Enable { rule: String },
    /// Disable a rule without deleting it
    Disable { rule: String },
    /// Delete a rule
    Delete { rule: String },
    /// Show which rule would apply to a movement
    Test {
        /// Amount
        amount: String,
        /// income or expense
        #[arg(short, long, default_value = "expense")]
        kind: String,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },
}

/// Parse "FIELD OPERATOR VALUE"; account and category values become IDs
fn parse_condition(storage: &Storage, input: &str) -> BilleteraResult<Condition> {
    let invalid = || {
        BilleteraError::Validation(format!(
            "Invalid condition: '{}'. Use \"FIELD OPERATOR VALUE\"",
            input
        ))
    };

    let mut parts = input.trim().splitn(3, char::is_whitespace);
    let field = parts.next().and_then(ConditionField::parse).ok_or_else(invalid)?;
    let operator = parts.next().and_then(Operator::parse).ok_or_else(invalid)?;
    let value = parts.next().map(str::trim).filter(|v| !v.is_empty()).ok_or_else(invalid)?;

    let value = match field {
        ConditionField::Account => AccountService::new(storage)
            .resolve(value)?
            .id
            .as_uuid()
            .to_string(),
        ConditionField::Category => CategoryService::new(storage)
            .resolve(value)?
            .id
            .as_uuid()
            .to_string(),
        _ => value.to_string(),
    };

    Ok(Condition::new(field, operator, value))
}

fn build_actions(
    storage: &Storage,
    set_category: Option<&str>,
    set_note: Option<String>,
    append_note: Option<String>,
) -> BilleteraResult<Vec<Action>> {
    let mut actions = Vec::new();
    if let Some(category) = set_category {
        actions.push(Action::set_category(
            CategoryService::new(storage).resolve(category)?.id,
        ));
    }
    if let Some(note) = set_note {
        actions.push(Action::new(ActionField::Note, note));
    }
    if let Some(note) = append_note {
        actions.push(Action::new(ActionField::AppendNote, note));
    }
    Ok(actions)
}

pub fn handle_rule_command(
    storage: &Storage,
    settings: &Settings,
    cmd: RuleCommands,
) -> BilleteraResult<()> {
    let service = RuleService::new(storage);

    match cmd {
        RuleCommands::Create {
            name,
            conditions,
            any,
            priority,
            set_category,
            set_note,
            append_note,
        } => {
            let conditions = conditions
                .iter()
                .map(|c| parse_condition(storage, c))
                .collect::<BilleteraResult<Vec<_>>>()?;
            let actions = build_actions(storage, set_category.as_deref(), set_note, append_note)?;

            let rule = service.create(RuleInput {
                name,
                priority,
                match_mode: if any { MatchMode::Any } else { MatchMode::All },
                conditions,
                actions,
            })?;
            println!("Created rule: {}", rule);
            println!("  ID: {}", rule.id);
            if rule.conditions.is_empty() {
                println!("  Note: a rule without conditions never matches");
            }
        }

        RuleCommands::List => {
            let rules = service.list()?;
            print!("{}", format_rule_list(&rules, &Names::load(storage)?));
        }

        RuleCommands::Show { rule } => {
            let found = service.resolve(&rule)?;
            print!("{}", format_rule_details(&found, &Names::load(storage)?));
        }

        RuleCommands::Edit {
            rule,
            name,
            conditions,
            mode,
            priority,
            set_category,
            set_note,
            append_note,
        } => {
            let found = service.resolve(&rule)?;
            let conditions = if conditions.is_empty() {
                None
            } else {
                Some(
                    conditions
                        .iter()
                        .map(|c| parse_condition(storage, c))
                        .collect::<BilleteraResult<Vec<_>>>()?,
                )
            };
            let actions = build_actions(storage, set_category.as_deref(), set_note, append_note)?;
            let match_mode = mode
                .map(|m| {
                    MatchMode::parse(&m).ok_or_else(|| {
                        BilleteraError::Validation(format!("Invalid mode: '{}'. Use all or any", m))
                    })
                })
                .transpose()?;

            let patch = RulePatch {
                name,
                priority,
                active: None,
                match_mode,
                conditions,
                actions: if actions.is_empty() { None } else { Some(actions) },
            };
            let updated = service.update(found.id, patch)?;
            println!("Updated rule: {}", updated);
        }

        RuleCommands::Enable { rule } => {
            let found = service.resolve(&rule)?;
            let patch = RulePatch {
                active: Some(true),
                ..Default::default()
            };
            let updated = service.update(found.id, patch)?;
            println!("Enabled rule: {}", updated.name);
        }

        RuleCommands::Disable { rule } => {
            let found = service.resolve(&rule)?;
            let patch = RulePatch {
                active: Some(false),
                ..Default::default()
            };
            let updated = service.update(found.id, patch)?;
            println!("Disabled rule: {}", updated.name);
        }

        RuleCommands::Delete { rule } => {
            let found = service.resolve(&rule)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted rule: {}", deleted.name);
        }

        RuleCommands::Test {
            amount,
            kind,
            account,
            note,
        } => {
            let kind = MovementKind::parse(&kind)
                .filter(|k| *k != MovementKind::Transfer)
                .ok_or_else(|| {
                    BilleteraError::Validation(format!(
                        "Invalid kind: '{}'. Use income or expense",
                        kind
                    ))
                })?;
            let account = account_or_recent(storage, settings, account.as_deref())?;
            let mut draft = Movement::new(kind, account.id, today(), parse_money(&amount)?, account.currency);
            draft.note = note.unwrap_or_default();

            match service.evaluate(&draft)? {
                Some(suggestion) => {
                    let names = Names::load(storage)?;
                    println!("Matched rule: {}", suggestion.rule_name);
                    if suggestion.category_id.is_some() {
                        println!("  Category: {}", names.category(suggestion.category_id));
                    }
                    if let Some(note) = suggestion.note {
                        println!("  Note:     {}", note);
                    }
                }
                None => println!("No rule matches."),
            }
        }
    }

    Ok(())
}
