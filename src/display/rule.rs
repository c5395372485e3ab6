//! Auto-categorization rule display formatting

use crate::models::{Action, ActionField, AutoRule, CategoryId, MatchMode};

use super::{truncate, Names};

fn action_label(action: &Action, names: &Names) -> String {
    match action.field {
        ActionField::Category => match CategoryId::parse(&action.value) {
            Ok(id) => format!("category = {}", names.category(Some(id))),
            Err(_) => action.to_string(),
        },
        _ => action.to_string(),
    }
}

/// Format rules in evaluation order
pub fn format_rule_list(rules: &[AutoRule], names: &Names) -> String {
    if rules.is_empty() {
        return "No rules defined.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:12}  {:>4}  {:24}  {:>5}  {}\n",
        "ID", "Prio", "Name", "Conds", "Actions"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for rule in rules {
        let inactive = if rule.active { "" } else { " (inactive)" };
        let actions: Vec<String> = rule.actions.iter().map(|a| action_label(a, names)).collect();
        output.push_str(&format!(
            "{:12}  {:>4}  {:24}  {:>5}  {}{}\n",
            rule.id.to_string(),
            rule.priority,
            truncate(&rule.name, 24),
            rule.conditions.len(),
            actions.join("; "),
            inactive
        ));
    }

    output
}

/// Format a rule's conditions and actions
pub fn format_rule_details(rule: &AutoRule, names: &Names) -> String {
    let mut output = String::new();

    output.push_str(&format!("Rule: {}\n", rule.name));
    output.push_str(&format!("  ID:       {}\n", rule.id));
    output.push_str(&format!("  Priority: {}\n", rule.priority));
    output.push_str(&format!(
        "  Active:   {}\n",
        if rule.active { "Yes" } else { "No" }
    ));
    let joiner = match rule.match_mode {
        MatchMode::All => "all of",
        MatchMode::Any => "any of",
    };
    output.push_str(&format!("\n  When {}:\n", joiner));
    if rule.conditions.is_empty() {
        output.push_str("    (no conditions, never matches)\n");
    }
    for condition in &rule.conditions {
        output.push_str(&format!("    {}\n", condition));
    }
    output.push_str("  Then:\n");
    for action in &rule.actions {
        output.push_str(&format!("    {}\n", action_label(action, names)));
    }

    output
}
