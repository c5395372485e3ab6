//! Account service
//!
//! Account CRUD, archiving and balance calculation.

use tracing::info;

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{Account, AccountId, Currency, Money, Movement};
use crate::storage::Storage;

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// Input for a new account
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub name: String,
    pub currency: Currency,
    pub is_credit_card: bool,
    pub closing_day: Option<u32>,
    pub initial_balance: Money,
}

impl CreateAccountInput {
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            name: name.into(),
            currency,
            is_credit_card: false,
            closing_day: None,
            initial_balance: Money::zero(),
        }
    }

    pub fn credit_card(name: impl Into<String>, currency: Currency, closing_day: u32) -> Self {
        Self {
            is_credit_card: true,
            closing_day: Some(closing_day),
            ..Self::new(name, currency)
        }
    }
}

/// Changes to an existing account; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub closing_day: Option<u32>,
    pub initial_balance: Option<Money>,
}

/// An account with its computed balance
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    pub balance: Money,
    pub movement_count: usize,
}

/// Initial balance plus the signed effect of every movement on the account
pub fn balance_of(account: &Account, movements: &[Movement]) -> Money {
    account.initial_balance
        + movements
            .iter()
            .map(|m| m.signed_amount_for(account.id))
            .sum::<Money>()
}

impl<'a> AccountService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, input: CreateAccountInput) -> BilleteraResult<Account> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(BilleteraError::Validation(
                "Account name cannot be empty".into(),
            ));
        }

        if self.storage.accounts.name_exists(name, None)? {
            return Err(BilleteraError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }

        let mut account = Account::new(name, input.currency);
        account.is_credit_card = input.is_credit_card;
        account.closing_day = input.closing_day;
        account.initial_balance = input.initial_balance;
        account.sort_order = self.storage.accounts.count()? as i32;

        account
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_create(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;
        self.storage.events().emit(Topic::Accounts);
        info!(account = %account.id, name = %account.name, "account created");

        Ok(account)
    }

    pub fn get(&self, id: AccountId) -> BilleteraResult<Option<Account>> {
        self.storage.accounts.get(id)
    }

    /// Find an account by name or ID reference
    pub fn find(&self, reference: &str) -> BilleteraResult<Option<Account>> {
        self.storage.accounts.find_by_ref(reference)
    }

    /// Like [`find`](Self::find) but a missing account is an error
    pub fn resolve(&self, reference: &str) -> BilleteraResult<Account> {
        self.find(reference)?
            .ok_or_else(|| BilleteraError::account_not_found(reference))
    }

    pub fn list(&self, include_archived: bool) -> BilleteraResult<Vec<Account>> {
        let mut accounts = self
            .storage
            .accounts
            .filter(|a| include_archived || !a.archived)?;
        accounts.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(accounts)
    }

    pub fn list_with_balances(&self, include_archived: bool) -> BilleteraResult<Vec<AccountSummary>> {
        self.list(include_archived)?
            .into_iter()
            .map(|account| self.summary(account))
            .collect()
    }

    pub fn summary(&self, account: Account) -> BilleteraResult<AccountSummary> {
        let movements = self.storage.movements.get_by_account(account.id)?;
        Ok(AccountSummary {
            balance: balance_of(&account, &movements),
            movement_count: movements.len(),
            account,
        })
    }

    pub fn update(&self, id: AccountId, patch: AccountPatch) -> BilleteraResult<Account> {
        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| BilleteraError::account_not_found(id.to_string()))?;
        let before = account.clone();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if self.storage.accounts.name_exists(&name, Some(id))? {
                return Err(BilleteraError::Duplicate {
                    entity_type: "Account",
                    identifier: name,
                });
            }
            account.name = name;
        }
        if let Some(day) = patch.closing_day {
            account.closing_day = Some(day);
        }
        if let Some(balance) = patch.initial_balance {
            account.initial_balance = balance;
        }

        account
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        account.updated_at = chrono::Utc::now();

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;
        self.storage.events().emit(Topic::Accounts);
        info!(account = %account.id, "account updated");

        Ok(account)
    }

    pub fn archive(&self, id: AccountId) -> BilleteraResult<Account> {
        self.set_archived(id, true)
    }

    pub fn unarchive(&self, id: AccountId) -> BilleteraResult<Account> {
        self.set_archived(id, false)
    }

    fn set_archived(&self, id: AccountId, archived: bool) -> BilleteraResult<Account> {
        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| BilleteraError::account_not_found(id.to_string()))?;

        if account.archived == archived {
            let state = if archived { "archived" } else { "active" };
            return Err(BilleteraError::InvalidState(format!(
                "Account '{}' is already {}",
                account.name, state
            )));
        }

        let before = account.clone();
        if archived {
            account.archive();
        } else {
            account.unarchive();
        }

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;
        self.storage.events().emit(Topic::Accounts);

        Ok(account)
    }

    /// Delete an account that has no movements
    pub fn delete(&self, id: AccountId) -> BilleteraResult<Account> {
        let account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| BilleteraError::account_not_found(id.to_string()))?;

        if !self.storage.movements.get_by_account(id)?.is_empty() {
            return Err(BilleteraError::InvalidState(format!(
                "Account '{}' has movements; archive it instead",
                account.name
            )));
        }

        self.storage.accounts.delete(id)?;
        self.storage.accounts.save()?;

        self.storage.log_delete(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;
        self.storage.events().emit(Topic::Accounts);
        info!(account = %account.id, "account deleted");

        Ok(account)
    }
}
