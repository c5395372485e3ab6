//! Movement display formatting
//!
//! The movement register is rendered with `tabled`; details and bulk
//! results are plain text.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::currency::format_amount;
use crate::models::{Movement, MovementKind};
use crate::services::movement::{BulkOutcome, MovementPage};

use super::{truncate, Names};

#[derive(Tabled)]
struct MovementRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Note")]
    note: String,
}

fn kind_marker(movement: &Movement) -> String {
    let mut kind = match movement.kind {
        MovementKind::Income => "+ Income".to_string(),
        MovementKind::Expense => "- Expense".to_string(),
        MovementKind::Transfer => "⇄ Transfer".to_string(),
    };
    if let Some(installment) = movement.installment {
        kind.push_str(&format!(" {}", installment));
    }
    kind
}

fn account_cell(movement: &Movement, names: &Names) -> String {
    match movement.destination_account_id {
        Some(to) => format!(
            "{} → {}",
            truncate(&names.account(movement.account_id), 14),
            truncate(&names.account(to), 14)
        ),
        None => truncate(&names.account(movement.account_id), 20),
    }
}

fn movement_row(movement: &Movement, names: &Names) -> MovementRow {
    let mut note = truncate(&movement.note, 30);
    if let Some(period) = movement.statement_period {
        note = format!("{} [{}]", note, period).trim_start().to_string();
    }
    MovementRow {
        id: movement.id.to_string(),
        date: movement.date.format("%Y-%m-%d").to_string(),
        kind: kind_marker(movement),
        account: account_cell(movement, names),
        category: truncate(&names.category(movement.category_id), 20),
        amount: format_amount(movement.amount, movement.currency),
        note,
    }
}

/// Format a page of movements as a register followed by currency subtotals
pub fn format_movement_page(page: &MovementPage, names: &Names) -> String {
    if page.movements.is_empty() {
        return "No movements found.\n".to_string();
    }

    let rows: Vec<MovementRow> = page
        .movements
        .iter()
        .map(|m| movement_row(m, names))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::psql());

    let mut output = table.to_string();
    output.push_str("\n\n");
    for subtotal in &page.subtotals {
        output.push_str(&format!(
            "{}  income {}  expense {}  net {}\n",
            subtotal.currency,
            format_amount(subtotal.income, subtotal.currency),
            format_amount(subtotal.expense, subtotal.currency),
            format_amount(subtotal.net, subtotal.currency),
        ));
    }
    output.push_str(&format!("{} movement(s)\n", page.movements.len()));

    output
}

/// Format a single movement's details
pub fn format_movement_details(movement: &Movement, names: &Names) -> String {
    let mut output = String::new();

    output.push_str(&format!("Movement: {}\n", movement.id));
    output.push_str(&format!("  Date:      {}\n", movement.date.format("%Y-%m-%d")));
    output.push_str(&format!("  Kind:      {}\n", movement.kind));
    output.push_str(&format!(
        "  Amount:    {}\n",
        format_amount(movement.amount, movement.currency)
    ));

    match movement.destination_account_id {
        Some(to) => {
            output.push_str(&format!("  From:      {}\n", names.account(movement.account_id)));
            output.push_str(&format!("  To:        {}\n", names.account(to)));
            if let Some(received) = movement.destination_amount {
                output.push_str(&format!("  Received:  {}\n", received));
            }
        }
        None => {
            output.push_str(&format!("  Account:   {}\n", names.account(movement.account_id)));
            output.push_str(&format!(
                "  Category:  {}\n",
                names.category(movement.category_id)
            ));
        }
    }

    if let Some(installment) = movement.installment {
        output.push_str(&format!("  Installment: {}\n", installment));
    }
    if let Some(group) = movement.installment_group {
        output.push_str(&format!("  Group:     {}\n", group));
    }
    if let Some(period) = movement.statement_period {
        output.push_str(&format!("  Statement: {}\n", period));
    }
    if let Some(recurring) = movement.recurring_id {
        output.push_str(&format!("  Recurring: {}\n", recurring));
    }
    if let Some(scheduled) = movement.scheduled_id {
        output.push_str(&format!("  Scheduled: {}\n", scheduled));
    }
    if !movement.note.is_empty() {
        output.push_str(&format!("  Note:      {}\n", movement.note));
    }
    if let Some(attachment) = &movement.attachment {
        output.push_str(&format!("  Attachment: {}\n", attachment));
    }

    output
}

/// Summarize a bulk delete or update
pub fn format_bulk_outcome(action: &str, outcome: &BulkOutcome) -> String {
    let mut output = format!("{} {} movement(s)", action, outcome.succeeded.len());
    if outcome.is_complete() {
        output.push('\n');
        return output;
    }

    output.push_str(&format!(", {} failed:\n", outcome.failed.len()));
    for (id, reason) in &outcome.failed {
        output.push_str(&format!("  {}: {}\n", id, reason));
    }
    output
}
