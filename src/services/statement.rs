//! Credit-card statement service
//!
//! Offers statement periods for a card, picks the default (first unpaid)
//! one, summarizes what each statement charges and records payments.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{
    Account, AccountId, Currency, Money, MovementKind, StatementPayment, YearMonth,
};
use crate::statement::{self, PeriodOption};
use crate::storage::Storage;

pub struct StatementService<'a> {
    storage: &'a Storage,
}

/// Charged, paid and outstanding amounts of one statement in one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementTotal {
    pub currency: Currency,
    pub charged: Money,
    pub paid: Money,
    pub outstanding: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub account_id: AccountId,
    pub period: YearMonth,
    pub closing_date: NaiveDate,
    pub movement_count: usize,
    pub totals: Vec<StatementTotal>,
}

impl StatementSummary {
    pub fn total_for(&self, currency: Currency) -> Option<&StatementTotal> {
        self.totals.iter().find(|t| t.currency == currency)
    }
}

fn closing_day_of(account: &Account) -> BilleteraResult<u32> {
    account.statement_closing_day().ok_or_else(|| {
        BilleteraError::Statement(format!("Account '{}' is not a credit card", account.name))
    })
}

impl<'a> StatementService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// The six periods offered when entering an expense on this card
    pub fn periods_for(&self, account: &Account, today: NaiveDate) -> BilleteraResult<Vec<PeriodOption>> {
        statement::statement_periods(closing_day_of(account)?, today)
    }

    /// Payment keys ("2025-03_ARS") recorded for a card
    pub fn paid_keys(&self, account_id: AccountId) -> BilleteraResult<HashSet<String>> {
        Ok(self
            .payments(account_id)?
            .iter()
            .map(StatementPayment::key)
            .collect())
    }

    /// First unpaid period from the base period onward
    pub fn default_period(&self, account: &Account, today: NaiveDate) -> BilleteraResult<YearMonth> {
        let periods = self.periods_for(account, today)?;
        let paid = self.paid_keys(account.id)?;
        Ok(statement::first_unpaid_period(&periods, &paid, today))
    }

    /// Payments recorded for a card, latest period first
    pub fn payments(&self, account_id: AccountId) -> BilleteraResult<Vec<StatementPayment>> {
        let mut payments = self
            .storage
            .statement_payments
            .filter(|p| p.account_id == account_id)?;
        payments.sort_by(|a, b| b.period.cmp(&a.period).then(b.date.cmp(&a.date)));
        Ok(payments)
    }

    pub fn summary(&self, account: &Account, period: YearMonth) -> BilleteraResult<StatementSummary> {
        let closing_day = closing_day_of(account)?;

        let charges: Vec<_> = self
            .storage
            .movements
            .get_by_account(account.id)?
            .into_iter()
            .filter(|m| {
                m.kind == MovementKind::Expense
                    && m.account_id == account.id
                    && m.statement_period == Some(period)
            })
            .collect();
        let payments: Vec<_> = self
            .payments(account.id)?
            .into_iter()
            .filter(|p| p.period == period)
            .collect();

        let totals = Currency::ALL
            .iter()
            .filter_map(|&currency| {
                let charged: Money = charges
                    .iter()
                    .filter(|m| m.currency == currency)
                    .map(|m| m.amount)
                    .sum();
                let paid: Money = payments
                    .iter()
                    .filter(|p| p.currency == currency)
                    .map(|p| p.amount)
                    .sum();
                if charged.is_zero() && paid.is_zero() {
                    return None;
                }
                Some(StatementTotal {
                    currency,
                    charged,
                    paid,
                    outstanding: charged - paid,
                })
            })
            .collect();

        Ok(StatementSummary {
            account_id: account.id,
            period,
            closing_date: period.day(closing_day),
            movement_count: charges.len(),
            totals,
        })
    }

    pub fn record_payment(
        &self,
        account: &Account,
        period: YearMonth,
        currency: Currency,
        amount: Money,
        date: NaiveDate,
    ) -> BilleteraResult<StatementPayment> {
        closing_day_of(account)?;
        if !amount.is_positive() {
            return Err(BilleteraError::Validation(format!(
                "Payment amount must be greater than zero (got {})",
                amount
            )));
        }

        let payment = StatementPayment::new(account.id, period, currency, amount, date);
        self.storage.statement_payments.upsert(payment.clone())?;
        self.storage.statement_payments.save()?;

        self.storage.log_create(
            EntityType::StatementPayment,
            payment.id.to_string(),
            Some(payment.key()),
            &payment,
        )?;
        self.storage.events().emit(Topic::Statements);
        info!(account = %account.id, key = %payment.key(), "statement payment recorded");

        Ok(payment)
    }
}
