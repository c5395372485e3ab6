//! Movement service
//!
//! Income, expense and transfer entry, installment purchases on credit
//! cards, edits and deletes (single and bulk), conversion into a recurring
//! template, and filtered listing with per-currency subtotals.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::config::settings::{Settings, SortDirection, SortField, SortPreference};
use crate::currency::convert_money;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{
    Account, AccountId, CategoryId, CategoryKind, CreationMode, Currency, Frequency, Installment,
    InstallmentGroupId, Money, Movement, MovementId, MovementKind, RecurringTransaction, YearMonth,
};
use crate::statement;
use crate::storage::Storage;

use super::account::balance_of;
use super::recurring::RecurringService;
use super::rule::RuleService;
use super::statement::StatementService;

/// Service for movement management
pub struct MovementService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

/// Input for a new income or expense
#[derive(Debug, Clone)]
pub struct MovementInput {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub category_id: Option<CategoryId>,
    pub note: String,
    pub attachment: Option<String>,
    /// Statement to bill a credit-card expense in; the first unpaid one if unset
    pub statement_period: Option<YearMonth>,
    /// Ask the auto-rules for a category when none is given
    pub auto_categorize: bool,
}

impl MovementInput {
    pub fn new(account_id: AccountId, date: NaiveDate, amount: Money) -> Self {
        Self {
            account_id,
            date,
            amount,
            category_id: None,
            note: String::new(),
            attachment: None,
            statement_period: None,
            auto_categorize: true,
        }
    }
}

/// Input for a transfer between two accounts
#[derive(Debug, Clone)]
pub struct TransferInput {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    /// Amount credited on the destination; converted from `amount` if unset
    pub destination_amount: Option<Money>,
    pub note: String,
}

/// Changes to an existing movement; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct MovementPatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub destination_amount: Option<Money>,
    pub account_id: Option<AccountId>,
    /// `Some(None)` clears the category
    pub category_id: Option<Option<CategoryId>>,
    pub note: Option<String>,
    pub attachment: Option<Option<String>>,
    pub statement_period: Option<Option<YearMonth>>,
}

impl MovementPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.destination_amount.is_none()
            && self.account_id.is_none()
            && self.category_id.is_none()
            && self.note.is_none()
            && self.attachment.is_none()
            && self.statement_period.is_none()
    }
}

/// Result of a bulk operation; items are processed one by one and a failure
/// does not undo the items before it
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<MovementId>,
    pub failed: Vec<(MovementId, String)>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Criteria for listing movements
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub currency: Option<Currency>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Case-insensitive match against the note
    pub text: Option<String>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        if self.kind.is_some_and(|k| movement.kind != k) {
            return false;
        }
        if self
            .account_id
            .is_some_and(|a| !movement.involves_account(a))
        {
            return false;
        }
        if self
            .category_id
            .is_some_and(|c| movement.category_id != Some(c))
        {
            return false;
        }
        if self.currency.is_some_and(|c| movement.currency != c) {
            return false;
        }
        if self.from.is_some_and(|from| movement.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| movement.date > to) {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !movement.note.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Income, expense and net of the listed movements in one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencySubtotal {
    pub currency: Currency,
    pub income: Money,
    pub expense: Money,
    pub net: Money,
}

/// A filtered, sorted list of movements
#[derive(Debug, Clone)]
pub struct MovementPage {
    pub movements: Vec<Movement>,
    pub subtotals: Vec<CurrencySubtotal>,
}

fn subtotals(movements: &[Movement]) -> Vec<CurrencySubtotal> {
    Currency::ALL
        .iter()
        .filter_map(|&currency| {
            let in_currency = || movements.iter().filter(move |m| m.currency == currency);
            if in_currency().next().is_none() {
                return None;
            }
            let sum_of = |kind: MovementKind| {
                in_currency()
                    .filter(|m| m.kind == kind)
                    .map(|m| m.amount)
                    .sum::<Money>()
            };
            let income = sum_of(MovementKind::Income);
            let expense = sum_of(MovementKind::Expense);
            Some(CurrencySubtotal {
                currency,
                income,
                expense,
                net: income - expense,
            })
        })
        .collect()
}

fn sort_movements(movements: &mut [Movement], sort: SortPreference) {
    movements.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Date => a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)),
            SortField::Amount => a.amount.cmp(&b.amount).then(a.date.cmp(&b.date)),
        };
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn category_kind_for(kind: MovementKind) -> Option<CategoryKind> {
    match kind {
        MovementKind::Income => Some(CategoryKind::Income),
        MovementKind::Expense => Some(CategoryKind::Expense),
        MovementKind::Transfer => None,
    }
}

impl<'a> MovementService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn get(&self, id: MovementId) -> BilleteraResult<Option<Movement>> {
        self.storage.movements.get(id)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<Movement> {
        self.storage
            .movements
            .find_by_ref(reference)?
            .ok_or_else(|| BilleteraError::movement_not_found(reference))
    }

    /// An account that exists and can take new movements
    fn active_account(&self, id: AccountId) -> BilleteraResult<Account> {
        let account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| BilleteraError::account_not_found(id.to_string()))?;
        if account.archived {
            return Err(BilleteraError::InvalidState(format!(
                "Account '{}' is archived",
                account.name
            )));
        }
        Ok(account)
    }

    fn check_category(&self, kind: MovementKind, category_id: Option<CategoryId>) -> BilleteraResult<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        let category = self
            .storage
            .categories
            .get(category_id)?
            .ok_or_else(|| BilleteraError::category_not_found(category_id.to_string()))?;

        match category_kind_for(kind) {
            Some(expected) if expected == category.kind => Ok(()),
            Some(_) => Err(BilleteraError::Validation(format!(
                "Category '{}' is for {} movements, not {}",
                category.name,
                category.kind.to_string().to_lowercase(),
                kind.to_string().to_lowercase()
            ))),
            None => Err(BilleteraError::Validation(
                "Transfers cannot have a category".into(),
            )),
        }
    }

    /// Apply the winning auto-rule, dropping a suggested category of the wrong kind
    fn auto_categorize(&self, draft: &mut Movement) -> BilleteraResult<()> {
        let Some(suggestion) = RuleService::new(self.storage).evaluate(draft)? else {
            return Ok(());
        };
        let had_category = draft.category_id.is_some();
        suggestion.apply_to(draft);
        if !had_category && self.check_category(draft.kind, draft.category_id).is_err() {
            debug!(rule = %suggestion.rule_id, "suggested category does not fit, ignored");
            draft.category_id = None;
        }
        Ok(())
    }

    /// Build a validated income/expense draft from input
    fn draft(&self, kind: MovementKind, input: &MovementInput, account: &Account) -> BilleteraResult<Movement> {
        let mut movement = Movement::new(kind, account.id, input.date, input.amount, account.currency);
        movement.category_id = input.category_id;
        movement.note = input.note.trim().to_string();
        movement.attachment = input.attachment.clone();

        movement
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        self.check_category(kind, movement.category_id)?;

        if movement.category_id.is_none() && input.auto_categorize {
            self.auto_categorize(&mut movement)?;
        }
        Ok(movement)
    }

    fn persist_new(&self, movements: &[Movement]) -> BilleteraResult<()> {
        for movement in movements {
            self.storage.movements.upsert(movement.clone())?;
        }
        self.storage.movements.save()?;

        for movement in movements {
            self.storage.log_create(
                EntityType::Movement,
                movement.id.to_string(),
                Some(movement.to_string()),
                movement,
            )?;
        }
        self.storage.events().emit(Topic::Movements);
        Ok(())
    }

    pub fn add_income(&self, input: MovementInput) -> BilleteraResult<Movement> {
        let account = self.active_account(input.account_id)?;
        let movement = self.draft(MovementKind::Income, &input, &account)?;

        self.persist_new(std::slice::from_ref(&movement))?;
        info!(movement = %movement.id, account = %account.id, amount = %movement.amount, "income added");
        Ok(movement)
    }

    pub fn add_expense(&self, input: MovementInput) -> BilleteraResult<Movement> {
        let account = self.active_account(input.account_id)?;
        let mut movement = self.draft(MovementKind::Expense, &input, &account)?;

        if account.is_credit_card {
            movement.statement_period = match input.statement_period {
                Some(period) => Some(period),
                None => Some(StatementService::new(self.storage).default_period(&account, input.date)?),
            };
        }

        self.persist_new(std::slice::from_ref(&movement))?;
        info!(movement = %movement.id, account = %account.id, amount = %movement.amount, "expense added");
        Ok(movement)
    }

    /// Split a credit-card purchase into `count` installments
    ///
    /// With an explicit statement period the installments are billed from that
    /// period on; otherwise they are dated from the purchase date.
    pub fn add_expense_with_installments(
        &self,
        input: MovementInput,
        count: u32,
    ) -> BilleteraResult<Vec<Movement>> {
        let account = self.active_account(input.account_id)?;
        let closing_day = account.statement_closing_day().ok_or_else(|| {
            BilleteraError::Validation(format!(
                "Installments need a credit-card account; '{}' is not one",
                account.name
            ))
        })?;
        statement::validate_installment_count(count, self.settings.max_installments)?;

        let template = self.draft(MovementKind::Expense, &input, &account)?;
        let amounts = statement::split_installments(input.amount, count)?;
        let schedule: Vec<(YearMonth, NaiveDate)> = match input.statement_period {
            Some(period) => statement::installments_from_period(period, closing_day, count)?,
            None => statement::installment_dates(input.date, closing_day, count)?
                .into_iter()
                .map(|date| (YearMonth::from_date(date), date))
                .collect(),
        };

        let group = InstallmentGroupId::new();
        let movements: Vec<Movement> = schedule
            .into_iter()
            .zip(amounts)
            .enumerate()
            .map(|(i, ((period, date), amount))| {
                let mut movement = template.clone();
                movement.id = MovementId::new();
                movement.date = date;
                movement.amount = amount;
                movement.installment = Installment::new(i as u32 + 1, count);
                movement.installment_group = Some(group);
                movement.statement_period = Some(period);
                movement
            })
            .collect();

        self.persist_new(&movements)?;
        info!(
            group = %group,
            account = %account.id,
            count,
            total = %input.amount,
            "installment purchase added"
        );
        Ok(movements)
    }

    pub fn add_transfer(&self, input: TransferInput) -> BilleteraResult<Movement> {
        if input.from_account_id == input.to_account_id {
            return Err(BilleteraError::Validation(
                "Cannot transfer to the same account".into(),
            ));
        }
        let from = self.active_account(input.from_account_id)?;
        let to = self.active_account(input.to_account_id)?;

        let destination_amount = match input.destination_amount {
            Some(amount) => amount,
            None if from.currency != to.currency => convert_money(
                input.amount,
                from.currency,
                to.currency,
                &self.settings.exchange_rates,
            )?,
            None => input.amount,
        };

        let mut movement = Movement::transfer(
            from.id,
            to.id,
            input.date,
            input.amount,
            from.currency,
            destination_amount,
        );
        movement.note = input.note.trim().to_string();
        movement
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;

        self.persist_new(std::slice::from_ref(&movement))?;
        info!(movement = %movement.id, from = %from.id, to = %to.id, "transfer added");
        Ok(movement)
    }

    pub fn update_movement(&self, id: MovementId, patch: MovementPatch) -> BilleteraResult<Movement> {
        let mut movement = self
            .storage
            .movements
            .get(id)?
            .ok_or_else(|| BilleteraError::movement_not_found(id.to_string()))?;
        let before = movement.clone();

        if let Some(account_id) = patch.account_id {
            if account_id != movement.account_id {
                let account = self.active_account(account_id)?;
                if movement.is_installment() && !account.is_credit_card {
                    return Err(BilleteraError::Validation(
                        "Installments must stay on a credit-card account".into(),
                    ));
                }
                movement.account_id = account.id;
                movement.currency = account.currency;
                if !account.is_credit_card {
                    movement.statement_period = None;
                }
            }
        }
        if let Some(date) = patch.date {
            movement.date = date;
        }
        if let Some(amount) = patch.amount {
            let same_currency_transfer =
                movement.is_transfer() && movement.destination_amount == Some(movement.amount);
            movement.amount = amount;
            if same_currency_transfer && patch.destination_amount.is_none() {
                movement.destination_amount = Some(amount);
            }
        }
        if let Some(destination_amount) = patch.destination_amount {
            if !movement.is_transfer() {
                return Err(BilleteraError::Validation(
                    "Only transfers have a destination amount".into(),
                ));
            }
            movement.destination_amount = Some(destination_amount);
        }
        if let Some(category_id) = patch.category_id {
            movement.category_id = category_id;
        }
        if let Some(note) = patch.note {
            movement.note = note.trim().to_string();
        }
        if let Some(attachment) = patch.attachment {
            movement.attachment = attachment;
        }
        if let Some(period) = patch.statement_period {
            movement.statement_period = period;
        }

        movement
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        if movement.category_id != before.category_id {
            self.check_category(movement.kind, movement.category_id)?;
        }
        movement.touch();

        self.storage.movements.upsert(movement.clone())?;
        self.storage.movements.save()?;

        self.storage.log_update(
            EntityType::Movement,
            movement.id.to_string(),
            Some(movement.to_string()),
            &before,
            &movement,
        )?;
        self.storage.events().emit(Topic::Movements);
        info!(movement = %movement.id, "movement updated");

        Ok(movement)
    }

    pub fn delete_movement(&self, id: MovementId) -> BilleteraResult<Movement> {
        let movement = self
            .storage
            .movements
            .delete(id)?
            .ok_or_else(|| BilleteraError::movement_not_found(id.to_string()))?;
        self.storage.movements.save()?;

        self.storage.log_delete(
            EntityType::Movement,
            movement.id.to_string(),
            Some(movement.to_string()),
            &movement,
        )?;
        self.storage.events().emit(Topic::Movements);
        info!(movement = %movement.id, "movement deleted");

        Ok(movement)
    }

    /// Delete every installment of one purchase
    pub fn delete_installment_group(&self, group: InstallmentGroupId) -> BilleteraResult<Vec<Movement>> {
        let installments = self.storage.movements.get_by_group(group)?;
        if installments.is_empty() {
            return Err(BilleteraError::NotFound {
                entity_type: "Installment group",
                identifier: group.to_string(),
            });
        }

        for movement in &installments {
            self.storage.movements.delete(movement.id)?;
        }
        self.storage.movements.save()?;

        for movement in &installments {
            self.storage.log_delete(
                EntityType::Movement,
                movement.id.to_string(),
                Some(movement.to_string()),
                movement,
            )?;
        }
        self.storage.events().emit(Topic::Movements);
        info!(group = %group, count = installments.len(), "installment group deleted");

        Ok(installments)
    }

    pub fn bulk_delete_movements(&self, ids: &[MovementId]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.delete_movement(id) {
                Ok(_) => outcome.succeeded.push(id),
                Err(e) => {
                    warn!(movement = %id, error = %e, "bulk delete failed for item");
                    outcome.failed.push((id, e.to_string()));
                }
            }
        }
        outcome
    }

    pub fn bulk_update_movements(&self, ids: &[MovementId], patch: &MovementPatch) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.update_movement(id, patch.clone()) {
                Ok(_) => outcome.succeeded.push(id),
                Err(e) => {
                    warn!(movement = %id, error = %e, "bulk update failed for item");
                    outcome.failed.push((id, e.to_string()));
                }
            }
        }
        outcome
    }

    /// Create a recurring template from a movement and link the movement to it
    ///
    /// The template starts at the first occurrence after the movement's date.
    pub fn convert_to_recurring(
        &self,
        id: MovementId,
        frequency: Frequency,
        creation_mode: CreationMode,
        name: Option<String>,
    ) -> BilleteraResult<RecurringTransaction> {
        let movement = self
            .storage
            .movements
            .get(id)?
            .ok_or_else(|| BilleteraError::movement_not_found(id.to_string()))?;

        if movement.is_transfer() {
            return Err(BilleteraError::Validation(
                "Transfers cannot be made recurring".into(),
            ));
        }
        if movement.recurring_id.is_some() {
            return Err(BilleteraError::InvalidState(
                "Movement already belongs to a recurring transaction".into(),
            ));
        }

        let frequency = match frequency {
            Frequency::Monthly { day: None } => Frequency::monthly_on(movement.date.day()),
            other => other,
        };
        let start = frequency
            .next_after(movement.date, movement.date)
            .ok_or_else(|| BilleteraError::Validation("Frequency has no next occurrence".into()))?;

        let name = match name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => self.default_recurring_name(&movement)?,
        };

        let mut template = RecurringTransaction::new(
            name,
            movement.kind,
            movement.amount,
            movement.currency,
            movement.account_id,
            frequency,
            start,
            creation_mode,
        );
        template.category_id = movement.category_id;
        template.note = movement.note.clone();
        let template = RecurringService::new(self.storage).create(template)?;

        let mut linked = movement.clone();
        linked.recurring_id = Some(template.id);
        linked.touch();
        self.storage.movements.upsert(linked.clone())?;
        self.storage.movements.save()?;
        self.storage.log_update(
            EntityType::Movement,
            linked.id.to_string(),
            Some(linked.to_string()),
            &movement,
            &linked,
        )?;
        self.storage.events().emit(Topic::Movements);

        Ok(template)
    }

    fn default_recurring_name(&self, movement: &Movement) -> BilleteraResult<String> {
        if !movement.note.is_empty() {
            return Ok(movement.note.clone());
        }
        if let Some(category_id) = movement.category_id {
            if let Some(category) = self.storage.categories.get(category_id)? {
                return Ok(category.name);
            }
        }
        Ok(format!("Recurring {}", movement.kind.to_string().to_lowercase()))
    }

    /// Movements matching `filter`, sorted, with subtotals per currency
    pub fn list(&self, filter: &MovementFilter, sort: SortPreference) -> BilleteraResult<MovementPage> {
        let mut movements: Vec<Movement> = match filter.account_id {
            Some(account_id) => self.storage.movements.get_by_account(account_id)?,
            None => self.storage.movements.get_all()?,
        };
        movements.retain(|m| filter.matches(m));
        sort_movements(&mut movements, sort);

        debug!(count = movements.len(), "movements listed");
        Ok(MovementPage {
            subtotals: subtotals(&movements),
            movements,
        })
    }

    /// Initial balance plus income, minus expenses, minus transfers out, plus transfers in
    pub fn account_balance(&self, account_id: AccountId) -> BilleteraResult<Money> {
        let account = self
            .storage
            .accounts
            .get(account_id)?
            .ok_or_else(|| BilleteraError::account_not_found(account_id.to_string()))?;
        let movements = self.storage.movements.get_by_account(account_id)?;
        Ok(balance_of(&account, &movements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BilleteraPaths;
    use crate::currency::ExchangeRates;
    use crate::models::{Action, Category, Condition, ConditionField, MatchMode, Operator};
    use crate::services::rule::RuleInput;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BilleteraPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn account(storage: &Storage, account: Account) -> Account {
        storage.accounts.upsert(account.clone()).unwrap();
        account
    }

    fn category(storage: &Storage, name: &str, kind: CategoryKind) -> Category {
        let category = Category::new(name, kind);
        storage.categories.upsert(category.clone()).unwrap();
        category
    }

    #[test]
    fn test_add_income_and_balance() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));

        service
            .add_income(MovementInput::new(cash.id, date(2025, 1, 1), Money::from_cents(50_000)))
            .unwrap();
        service
            .add_expense(MovementInput::new(cash.id, date(2025, 1, 2), Money::from_cents(20_000)))
            .unwrap();

        assert_eq!(service.account_balance(cash.id).unwrap(), Money::from_cents(30_000));
    }

    #[test]
    fn test_rejects_bad_input() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));
        let salary = category(&storage, "Sueldo", CategoryKind::Income);

        let zero = MovementInput::new(cash.id, date(2025, 1, 1), Money::zero());
        assert!(service.add_expense(zero).unwrap_err().is_validation());

        let mut wrong_kind = MovementInput::new(cash.id, date(2025, 1, 1), Money::from_cents(100));
        wrong_kind.category_id = Some(salary.id);
        assert!(service.add_expense(wrong_kind).unwrap_err().is_validation());

        let missing = MovementInput::new(AccountId::new(), date(2025, 1, 1), Money::from_cents(100));
        assert!(service.add_income(missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_credit_card_expense_gets_first_unpaid_period() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let card = account(&storage, Account::credit_card("Visa", Currency::Ars, 20));

        let movement = service
            .add_expense(MovementInput::new(card.id, date(2025, 3, 25), Money::from_cents(1_000)))
            .unwrap();
        assert_eq!(movement.statement_period, Some(ym(2025, 4)));

        let mut explicit = MovementInput::new(card.id, date(2025, 3, 25), Money::from_cents(1_000));
        explicit.statement_period = Some(ym(2025, 6));
        let movement = service.add_expense(explicit).unwrap();
        assert_eq!(movement.statement_period, Some(ym(2025, 6)));
    }

    #[test]
    fn test_installments_from_purchase_date() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let card = account(&storage, Account::credit_card("Visa", Currency::Ars, 31));

        let installments = service
            .add_expense_with_installments(
                MovementInput::new(card.id, date(2025, 1, 15), Money::from_cents(1_000)),
                3,
            )
            .unwrap();

        let dates: Vec<_> = installments.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![date(2025, 2, 28), date(2025, 3, 31), date(2025, 4, 30)]);
        let amounts: Vec<_> = installments.iter().map(|m| m.amount.cents()).collect();
        assert_eq!(amounts, vec![334, 333, 333]);
        assert_eq!(installments[2].installment.unwrap().to_string(), "3/3");

        let group = installments[0].installment_group.unwrap();
        assert!(installments.iter().all(|m| m.installment_group == Some(group)));
        assert_eq!(storage.movements.get_by_group(group).unwrap().len(), 3);
    }

    #[test]
    fn test_installments_from_statement_period() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let card = account(&storage, Account::credit_card("Visa", Currency::Ars, 10));

        let mut input = MovementInput::new(card.id, date(2025, 11, 3), Money::from_cents(600));
        input.statement_period = Some(ym(2025, 12));
        let installments = service.add_expense_with_installments(input, 2).unwrap();

        assert_eq!(installments[0].statement_period, Some(ym(2025, 12)));
        assert_eq!(installments[0].date, date(2025, 12, 9));
        assert_eq!(installments[1].statement_period, Some(ym(2026, 1)));
        assert_eq!(installments[1].date, date(2026, 1, 9));
    }

    #[test]
    fn test_installments_need_credit_card_and_valid_count() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));
        let card = account(&storage, Account::credit_card("Visa", Currency::Ars, 10));

        let input = MovementInput::new(cash.id, date(2025, 1, 1), Money::from_cents(600));
        assert!(service.add_expense_with_installments(input, 3).is_err());

        let input = MovementInput::new(card.id, date(2025, 1, 1), Money::from_cents(600));
        assert!(service.add_expense_with_installments(input.clone(), 0).is_err());
        assert!(service.add_expense_with_installments(input, 49).is_err());
    }

    #[test]
    fn test_transfer_converts_between_currencies() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let pesos = account(&storage, Account::new("Pesos", Currency::Ars));
        let dollars = account(&storage, Account::new("Dolares", Currency::Usd));

        let transfer = service
            .add_transfer(TransferInput {
                from_account_id: pesos.id,
                to_account_id: dollars.id,
                date: date(2025, 1, 1),
                amount: Money::from_cents(100_000),
                destination_amount: None,
                note: String::new(),
            })
            .unwrap();
        assert_eq!(transfer.destination_amount, Some(Money::from_cents(100)));
        assert_eq!(service.account_balance(dollars.id).unwrap(), Money::from_cents(100));

        let same = TransferInput {
            from_account_id: pesos.id,
            to_account_id: pesos.id,
            date: date(2025, 1, 1),
            amount: Money::from_cents(1),
            destination_amount: None,
            note: String::new(),
        };
        assert!(service.add_transfer(same).unwrap_err().is_validation());
    }

    #[test]
    fn test_transfer_with_zero_rate_is_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let mut settings = Settings::default();
        settings.exchange_rates = ExchangeRates::new(0.0);
        let service = MovementService::new(&storage, &settings);
        let pesos = account(&storage, Account::new("Pesos", Currency::Ars));
        let dollars = account(&storage, Account::new("Dolares", Currency::Usd));

        let input = TransferInput {
            from_account_id: pesos.id,
            to_account_id: dollars.id,
            date: date(2025, 1, 1),
            amount: Money::from_cents(1_000),
            destination_amount: None,
            note: String::new(),
        };
        assert!(service.add_transfer(input.clone()).unwrap_err().is_validation());
        assert_eq!(storage.movements.count().unwrap(), 0);

        // an explicit received amount needs no rate
        let transfer = service
            .add_transfer(TransferInput {
                destination_amount: Some(Money::from_cents(1)),
                ..input
            })
            .unwrap();
        assert_eq!(service.account_balance(dollars.id).unwrap(), Money::from_cents(1));
        assert_eq!(transfer.destination_amount, Some(Money::from_cents(1)));
    }

    #[test]
    fn test_auto_categorize_applies_rule() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));
        let market = category(&storage, "Supermercado", CategoryKind::Expense);

        RuleService::new(&storage)
            .create(RuleInput {
                name: "coto".into(),
                priority: 0,
                match_mode: MatchMode::All,
                conditions: vec![Condition::new(ConditionField::Note, Operator::Contains, "coto")],
                actions: vec![Action::set_category(market.id)],
            })
            .unwrap();

        let mut input = MovementInput::new(cash.id, date(2025, 1, 1), Money::from_cents(100));
        input.note = "Coto Palermo".into();
        let movement = service.add_expense(input.clone()).unwrap();
        assert_eq!(movement.category_id, Some(market.id));

        input.auto_categorize = false;
        assert_eq!(service.add_expense(input).unwrap().category_id, None);
    }

    #[test]
    fn test_bulk_delete_reports_failures() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));
        let movement = service
            .add_expense(MovementInput::new(cash.id, date(2025, 1, 1), Money::from_cents(100)))
            .unwrap();
        let missing = MovementId::new();

        let outcome = service.bulk_delete_movements(&[movement.id, missing]);
        assert_eq!(outcome.succeeded, vec![movement.id]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, missing);
        assert!(!outcome.is_complete());
        assert_eq!(storage.movements.count().unwrap(), 0);
    }

    #[test]
    fn test_bulk_update_and_delete_group() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let card = account(&storage, Account::credit_card("Visa", Currency::Ars, 10));
        let installments = service
            .add_expense_with_installments(
                MovementInput::new(card.id, date(2025, 1, 1), Money::from_cents(900)),
                3,
            )
            .unwrap();
        let ids: Vec<_> = installments.iter().map(|m| m.id).collect();

        let patch = MovementPatch {
            note: Some("Heladera".into()),
            ..Default::default()
        };
        let outcome = service.bulk_update_movements(&ids, &patch);
        assert!(outcome.is_complete());
        assert!(storage
            .movements
            .get_all()
            .unwrap()
            .iter()
            .all(|m| m.note == "Heladera"));

        let group = installments[0].installment_group.unwrap();
        assert_eq!(service.delete_installment_group(group).unwrap().len(), 3);
        assert!(service.delete_installment_group(group).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_filters_sorts_and_subtotals() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));
        let dollars = account(&storage, Account::new("Dolares", Currency::Usd));

        service
            .add_income(MovementInput::new(cash.id, date(2025, 1, 1), Money::from_cents(10_000)))
            .unwrap();
        let mut lunch = MovementInput::new(cash.id, date(2025, 1, 3), Money::from_cents(3_000));
        lunch.note = "Almuerzo".into();
        service.add_expense(lunch).unwrap();
        service
            .add_expense(MovementInput::new(dollars.id, date(2025, 1, 2), Money::from_cents(500)))
            .unwrap();

        let page = service
            .list(&MovementFilter::default(), SortPreference::default())
            .unwrap();
        assert_eq!(page.movements[0].date, date(2025, 1, 3));
        let ars = page.subtotals.iter().find(|s| s.currency == Currency::Ars).unwrap();
        assert_eq!(ars.net, Money::from_cents(7_000));
        let usd = page.subtotals.iter().find(|s| s.currency == Currency::Usd).unwrap();
        assert_eq!(usd.expense, Money::from_cents(500));

        let by_amount = service
            .list(
                &MovementFilter::default(),
                SortPreference::new(SortField::Amount, SortDirection::Asc),
            )
            .unwrap();
        assert_eq!(by_amount.movements[0].amount, Money::from_cents(500));

        let filter = MovementFilter {
            text: Some("ALMUERZO".into()),
            ..Default::default()
        };
        assert_eq!(service.list(&filter, SortPreference::default()).unwrap().movements.len(), 1);
    }

    #[test]
    fn test_convert_to_recurring_links_movement() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MovementService::new(&storage, &settings);
        let cash = account(&storage, Account::new("Efectivo", Currency::Ars));
        let mut input = MovementInput::new(cash.id, date(2025, 1, 31), Money::from_cents(5_000));
        input.note = "Gimnasio".into();
        let movement = service.add_expense(input).unwrap();

        let template = service
            .convert_to_recurring(movement.id, Frequency::monthly(), CreationMode::Confirm, None)
            .unwrap();
        assert_eq!(template.name, "Gimnasio");
        assert_eq!(template.start_date, date(2025, 2, 28));
        assert_eq!(template.frequency, Frequency::monthly_on(31));

        let linked = service.get(movement.id).unwrap().unwrap();
        assert_eq!(linked.recurring_id, Some(template.id));
        assert!(matches!(
            service
                .convert_to_recurring(movement.id, Frequency::Weekly, CreationMode::Auto, None)
                .unwrap_err(),
            BilleteraError::InvalidState(_)
        ));
    }
}
