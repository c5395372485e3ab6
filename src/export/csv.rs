//! CSV export of movements
//!
//! One row per movement with account and category names resolved. Amounts
//! are plain decimals so spreadsheets can sum them.

use std::io::Write;

use serde::Serialize;

use crate::display::Names;
use crate::error::BilleteraResult;
use crate::models::{Money, Movement};
use crate::storage::Storage;

#[derive(Debug, Serialize)]
struct MovementRecord<'a> {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "To Account")]
    to_account: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Currency")]
    currency: &'static str,
    #[serde(rename = "Received")]
    received: String,
    #[serde(rename = "Installment")]
    installment: String,
    #[serde(rename = "Statement")]
    statement: String,
    #[serde(rename = "Note")]
    note: &'a str,
}

fn decimal(amount: Money) -> String {
    format!("{:.2}", amount.as_f64())
}

/// Write `movements` as CSV, header first
pub fn export_movements_csv<W: Write>(
    storage: &Storage,
    movements: &[Movement],
    writer: W,
) -> BilleteraResult<()> {
    let names = Names::load(storage)?;
    let mut csv = ::csv::Writer::from_writer(writer);

    for movement in movements {
        let category = if movement.is_transfer() {
            "Transfer".to_string()
        } else if movement.category_id.is_some() {
            names.category(movement.category_id)
        } else {
            String::new()
        };

        csv.serialize(MovementRecord {
            id: movement.id.as_uuid().to_string(),
            date: movement.date.format("%Y-%m-%d").to_string(),
            kind: movement.kind.to_string(),
            account: names.account(movement.account_id),
            to_account: movement
                .destination_account_id
                .map(|id| names.account(id))
                .unwrap_or_default(),
            category,
            amount: decimal(movement.amount),
            currency: movement.currency.code(),
            received: movement.destination_amount.map(decimal).unwrap_or_default(),
            installment: movement
                .installment
                .map(|i| i.to_string())
                .unwrap_or_default(),
            statement: movement
                .statement_period
                .map(|p| p.to_string())
                .unwrap_or_default(),
            note: &movement.note,
        })?;
    }

    if movements.is_empty() {
        csv.write_record([
            "ID",
            "Date",
            "Kind",
            "Account",
            "To Account",
            "Category",
            "Amount",
            "Currency",
            "Received",
            "Installment",
            "Statement",
            "Note",
        ])?;
    }

    csv.flush()?;
    Ok(())
}
