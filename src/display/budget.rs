//! Budget and goal display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::currency::format_amount;
use crate::models::Scope;
use crate::services::budget::BudgetProgress;
use crate::services::goal::GoalProgress;

use super::{truncate, Names};

const BAR_WIDTH: usize = 20;

fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

pub(crate) fn scope_label(scope: &Scope, names: &Names) -> String {
    match scope {
        Scope::Global => "All".to_string(),
        Scope::Category { category_id } => names.category(Some(*category_id)),
        Scope::Account { account_id } => names.account(*account_id),
    }
}

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "Budget")]
    name: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

/// Format the month's budgets as a table with progress bars
pub fn format_budget_overview(progress: &[BudgetProgress], names: &Names) -> String {
    let Some(first) = progress.first() else {
        return "No active budgets.\n".to_string();
    };

    let rows: Vec<BudgetRow> = progress
        .iter()
        .map(|p| {
            let currency = p.budget.currency;
            let flag = if p.over_limit { " OVER" } else { "" };
            BudgetRow {
                name: truncate(&p.budget.name, 24),
                scope: truncate(&scope_label(&p.budget.scope, names), 20),
                limit: format_amount(p.budget.amount, currency),
                spent: format_amount(p.spent, currency),
                remaining: format_amount(p.remaining, currency),
                progress: format!("{} {:>5.1}%{}", progress_bar(p.percent), p.percent, flag),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("Budgets for {}\n\n{}\n", first.month.label(), table)
}

/// Format goals with their progress
pub fn format_goal_list(progress: &[GoalProgress], names: &Names) -> String {
    if progress.is_empty() {
        return "No goals found.\n".to_string();
    }

    let mut output = String::new();
    for p in progress {
        let currency = p.goal.currency;
        let status = if p.completed { " ✓" } else { "" };
        output.push_str(&format!(
            "{}{}  ({})\n",
            p.goal.name,
            status,
            scope_label(&p.goal.scope, names)
        ));
        output.push_str(&format!(
            "  {} {:>5.1}%  {} of {}\n",
            progress_bar(p.percent),
            p.percent,
            format_amount(p.saved, currency),
            format_amount(p.goal.target_amount, currency)
        ));
    }
    output
}

/// Format one goal in detail
pub fn format_goal_details(p: &GoalProgress, names: &Names) -> String {
    let goal = &p.goal;
    let currency = goal.currency;
    let mut output = String::new();

    output.push_str(&format!("Goal: {}\n", goal.name));
    output.push_str(&format!("  ID:        {}\n", goal.id));
    output.push_str(&format!("  Scope:     {}\n", scope_label(&goal.scope, names)));
    output.push_str(&format!("  Since:     {}\n", goal.start_date.format("%Y-%m-%d")));
    if let Some(deadline) = goal.deadline {
        output.push_str(&format!("  Deadline:  {}\n", deadline.format("%Y-%m-%d")));
    }
    output.push('\n');
    output.push_str(&format!("  Target:    {}\n", format_amount(goal.target_amount, currency)));
    output.push_str(&format!("  Saved:     {}\n", format_amount(p.saved, currency)));
    output.push_str(&format!("  Remaining: {}\n", format_amount(p.remaining, currency)));
    output.push_str(&format!("  Progress:  {} {:.1}%\n", progress_bar(p.percent), p.percent));

    if let Some(months) = p.months_left {
        output.push_str(&format!("  Months left: {}\n", months));
    }
    if let Some(monthly) = p.required_monthly {
        output.push_str(&format!(
            "  Needed per month: {}\n",
            format_amount(monthly, currency)
        ));
    }

    output
}
