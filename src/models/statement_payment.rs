//! Credit-card statement payments

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, StatementPaymentId};
use super::money::{Currency, Money};
use super::period::YearMonth;

/// A payment made against one currency of a card statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementPayment {
    pub id: StatementPaymentId,
    pub account_id: AccountId,
    pub period: YearMonth,
    pub currency: Currency,
    pub amount: Money,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl StatementPayment {
    pub fn new(
        account_id: AccountId,
        period: YearMonth,
        currency: Currency,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: StatementPaymentId::new(),
            account_id,
            period,
            currency,
            amount,
            date,
            created_at: Utc::now(),
        }
    }

    /// Lookup key, e.g. "2025-03_ARS"
    pub fn key(&self) -> String {
        self.period.payment_key(self.currency)
    }
}
