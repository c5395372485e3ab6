//! Recurring transaction service
//!
//! Templates that repeat on a schedule. Each occurrence is either confirmed
//! (a movement is created and linked) or skipped. `auto` templates are
//! materialized by [`RecurringService::process_due`]; `confirm` ones wait
//! for the user.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{
    Account, AccountId, CategoryId, CategoryKind, CreationMode, Currency, Frequency, Money, Movement,
    MovementKind, OccurrenceStatus, RecurringId, RecurringTransaction,
};
use crate::storage::Storage;

use super::statement::StatementService;

pub struct RecurringService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone, Default)]
pub struct RecurringPatch {
    pub name: Option<String>,
    pub amount: Option<Money>,
    pub account_id: Option<AccountId>,
    pub category_id: Option<Option<CategoryId>>,
    pub note: Option<String>,
    pub frequency: Option<Frequency>,
    pub end_date: Option<Option<NaiveDate>>,
    pub creation_mode: Option<CreationMode>,
}

/// An occurrence waiting to be confirmed or skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOccurrence {
    pub recurring_id: RecurringId,
    pub name: String,
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub amount: Money,
    pub currency: Currency,
}

/// A template with figures derived from its history
#[derive(Debug, Clone, Serialize)]
pub struct RecurringStats {
    pub recurring: RecurringTransaction,
    pub next_date: Option<NaiveDate>,
    pub pending_count: usize,
    pub confirmed_count: usize,
    pub total_generated: Money,
}

impl<'a> RecurringService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn load(&self, id: RecurringId) -> BilleteraResult<RecurringTransaction> {
        self.storage
            .recurring
            .get(id)?
            .ok_or_else(|| BilleteraError::recurring_not_found(id.to_string()))
    }

    /// Check references and take the currency from the account
    fn check(&self, template: &mut RecurringTransaction) -> BilleteraResult<()> {
        template
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;

        let account = self.active_account(template)?;
        template.currency = account.currency;

        if let Some(category_id) = template.category_id {
            let category = self
                .storage
                .categories
                .get(category_id)?
                .ok_or_else(|| BilleteraError::category_not_found(category_id.to_string()))?;
            let expected = match template.kind {
                MovementKind::Income => CategoryKind::Income,
                _ => CategoryKind::Expense,
            };
            if category.kind != expected {
                return Err(BilleteraError::Validation(format!(
                    "Category '{}' does not match a {} template",
                    category.name,
                    template.kind.to_string().to_lowercase()
                )));
            }
        }
        Ok(())
    }

    pub fn create(&self, mut template: RecurringTransaction) -> BilleteraResult<RecurringTransaction> {
        template.name = template.name.trim().to_string();
        if self.storage.recurring.name_exists(&template.name, None)? {
            return Err(BilleteraError::Duplicate {
                entity_type: "Recurring transaction",
                identifier: template.name,
            });
        }
        self.check(&mut template)?;

        self.storage.recurring.upsert(template.clone())?;
        self.storage.recurring.save()?;

        self.storage.log_create(
            EntityType::Recurring,
            template.id.to_string(),
            Some(template.name.clone()),
            &template,
        )?;
        self.storage.events().emit(Topic::Recurring);
        info!(recurring = %template.id, name = %template.name, "recurring transaction created");

        Ok(template)
    }

    pub fn get(&self, id: RecurringId) -> BilleteraResult<Option<RecurringTransaction>> {
        self.storage.recurring.get(id)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<RecurringTransaction> {
        self.storage
            .recurring
            .find_by_ref(reference)?
            .ok_or_else(|| BilleteraError::recurring_not_found(reference))
    }

    pub fn list(&self, include_paused: bool) -> BilleteraResult<Vec<RecurringTransaction>> {
        let mut templates = self
            .storage
            .recurring
            .filter(|r| include_paused || r.active)?;
        templates.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(templates)
    }

    fn store_update(
        &self,
        before: &RecurringTransaction,
        after: &RecurringTransaction,
    ) -> BilleteraResult<()> {
        self.storage.recurring.upsert(after.clone())?;
        self.storage.recurring.save()?;
        self.storage.log_update(
            EntityType::Recurring,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
        )?;
        self.storage.events().emit(Topic::Recurring);
        Ok(())
    }

    pub fn update(&self, id: RecurringId, patch: RecurringPatch) -> BilleteraResult<RecurringTransaction> {
        let mut template = self.load(id)?;
        let before = template.clone();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if self.storage.recurring.name_exists(&name, Some(id))? {
                return Err(BilleteraError::Duplicate {
                    entity_type: "Recurring transaction",
                    identifier: name,
                });
            }
            template.name = name;
        }
        if let Some(amount) = patch.amount {
            template.amount = amount;
        }
        if let Some(account_id) = patch.account_id {
            template.account_id = account_id;
        }
        if let Some(category_id) = patch.category_id {
            template.category_id = category_id;
        }
        if let Some(note) = patch.note {
            template.note = note.trim().to_string();
        }
        if let Some(frequency) = patch.frequency {
            template.frequency = frequency;
        }
        if let Some(end_date) = patch.end_date {
            template.end_date = end_date;
        }
        if let Some(mode) = patch.creation_mode {
            template.creation_mode = mode;
        }

        self.check(&mut template)?;
        template.updated_at = Utc::now();
        self.store_update(&before, &template)?;

        Ok(template)
    }

    pub fn pause(&self, id: RecurringId) -> BilleteraResult<RecurringTransaction> {
        self.set_active(id, false)
    }

    pub fn resume(&self, id: RecurringId) -> BilleteraResult<RecurringTransaction> {
        self.set_active(id, true)
    }

    fn set_active(&self, id: RecurringId, active: bool) -> BilleteraResult<RecurringTransaction> {
        let mut template = self.load(id)?;
        if template.active == active {
            let state = if active { "active" } else { "paused" };
            return Err(BilleteraError::InvalidState(format!(
                "'{}' is already {}",
                template.name, state
            )));
        }
        let before = template.clone();
        template.active = active;
        template.updated_at = Utc::now();
        self.store_update(&before, &template)?;
        info!(recurring = %template.id, active, "recurring transaction toggled");

        Ok(template)
    }

    /// Delete a template; movements it generated are kept
    pub fn delete(&self, id: RecurringId) -> BilleteraResult<RecurringTransaction> {
        let template = self
            .storage
            .recurring
            .delete(id)?
            .ok_or_else(|| BilleteraError::recurring_not_found(id.to_string()))?;
        self.storage.recurring.save()?;

        self.storage.log_delete(
            EntityType::Recurring,
            template.id.to_string(),
            Some(template.name.clone()),
            &template,
        )?;
        self.storage.events().emit(Topic::Recurring);

        Ok(template)
    }

    /// Unhandled occurrences of every active template up to `today`, oldest first
    pub fn pending(&self, today: NaiveDate) -> BilleteraResult<Vec<PendingOccurrence>> {
        let mut pending: Vec<PendingOccurrence> = self
            .list(false)?
            .into_iter()
            .flat_map(|template| {
                template
                    .pending(today)
                    .into_iter()
                    .map(|date| PendingOccurrence {
                        recurring_id: template.id,
                        name: template.name.clone(),
                        date,
                        kind: template.kind,
                        amount: template.amount,
                        currency: template.currency,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        pending.sort_by(|a, b| a.date.cmp(&b.date).then(a.name.cmp(&b.name)));
        Ok(pending)
    }

    /// Occurrence must exist and not be handled yet
    fn check_open(template: &RecurringTransaction, date: NaiveDate) -> BilleteraResult<()> {
        if !template.active {
            return Err(BilleteraError::InvalidState(format!(
                "'{}' is paused",
                template.name
            )));
        }
        if !template.is_occurrence(date) {
            return Err(BilleteraError::Validation(format!(
                "{} is not an occurrence of '{}'",
                date, template.name
            )));
        }
        if template.handled_on(date).is_some() {
            return Err(BilleteraError::InvalidState(format!(
                "The {} occurrence of '{}' was already handled",
                date, template.name
            )));
        }
        Ok(())
    }

    /// The template's account, which must still be open
    fn active_account(&self, template: &RecurringTransaction) -> BilleteraResult<Account> {
        let account = self
            .storage
            .accounts
            .get(template.account_id)?
            .ok_or_else(|| BilleteraError::account_not_found(template.account_id.to_string()))?;
        if account.archived {
            return Err(BilleteraError::InvalidState(format!(
                "Account '{}' is archived",
                account.name
            )));
        }
        Ok(account)
    }

    /// The movement for one occurrence; nothing is stored
    fn materialize(
        &self,
        template: &RecurringTransaction,
        account: &Account,
        date: NaiveDate,
        amount: Money,
    ) -> BilleteraResult<Movement> {
        let mut movement = Movement::new(template.kind, account.id, date, amount, account.currency);
        movement.category_id = template.category_id;
        movement.note = template.note.clone();
        movement.recurring_id = Some(template.id);
        if template.kind == MovementKind::Expense && account.is_credit_card {
            movement.statement_period =
                Some(StatementService::new(self.storage).default_period(account, date)?);
        }
        movement
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        Ok(movement)
    }

    /// Write movements to disk, then record them in the audit log
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
        Ok(())
    }

    /// Create the movement for an occurrence and mark it confirmed
    pub fn confirm_occurrence(
        &self,
        id: RecurringId,
        date: NaiveDate,
        amount_override: Option<Money>,
    ) -> BilleteraResult<Movement> {
        let mut template = self.load(id)?;
        Self::check_open(&template, date)?;
        let account = self.active_account(&template)?;
        let before = template.clone();

        let amount = amount_override.unwrap_or(template.amount);
        let movement = self.materialize(&template, &account, date, amount)?;
        self.persist_new(std::slice::from_ref(&movement))?;

        template.record(date, OccurrenceStatus::Confirmed { movement_id: movement.id });
        self.store_update(&before, &template)?;
        self.storage.events().emit(Topic::Movements);
        info!(recurring = %template.id, %date, movement = %movement.id, "occurrence confirmed");

        Ok(movement)
    }

    pub fn skip_occurrence(&self, id: RecurringId, date: NaiveDate) -> BilleteraResult<RecurringTransaction> {
        let mut template = self.load(id)?;
        Self::check_open(&template, date)?;
        let before = template.clone();

        template.record(date, OccurrenceStatus::Skipped);
        self.store_update(&before, &template)?;
        info!(recurring = %template.id, %date, "occurrence skipped");

        Ok(template)
    }

    /// Create movements for every pending occurrence of `auto` templates
    ///
    /// Templates whose account is archived are left pending.
    pub fn process_due(&self, today: NaiveDate) -> BilleteraResult<Vec<Movement>> {
        let mut created = Vec::new();

        for mut template in self.list(false)? {
            if template.creation_mode != CreationMode::Auto {
                continue;
            }
            let due = template.pending(today);
            if due.is_empty() {
                continue;
            }
            let account = match self.active_account(&template) {
                Ok(account) => account,
                Err(BilleteraError::InvalidState(reason)) => {
                    warn!(recurring = %template.id, %reason, "skipping automatic template");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let movements = due
                .iter()
                .map(|date| self.materialize(&template, &account, *date, template.amount))
                .collect::<BilleteraResult<Vec<_>>>()?;
            self.persist_new(&movements)?;

            let before = template.clone();
            for movement in &movements {
                template.record(movement.date, OccurrenceStatus::Confirmed { movement_id: movement.id });
            }
            self.store_update(&before, &template)?;
            created.extend(movements);
        }

        if !created.is_empty() {
            self.storage.events().emit(Topic::Movements);
            info!(count = created.len(), "recurring movements created");
        } else {
            debug!("no recurring movements due");
        }
        Ok(created)
    }

    pub fn list_with_stats(&self, today: NaiveDate) -> BilleteraResult<Vec<RecurringStats>> {
        self.list(true)?
            .into_iter()
            .map(|recurring| {
                let total_generated = self
                    .storage
                    .movements
                    .get_by_recurring(recurring.id)?
                    .iter()
                    .map(|m| m.amount)
                    .sum();
                Ok(RecurringStats {
                    next_date: recurring.next_due(today),
                    pending_count: recurring.pending(today).len(),
                    confirmed_count: recurring.confirmed_count(),
                    total_generated,
                    recurring,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BilleteraPaths;
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

    fn setup(mode: CreationMode) -> (TempDir, Storage, RecurringTransaction) {
        let (temp_dir, storage) = create_test_storage();
        let account = Account::new("Banco", Currency::Ars);
        storage.accounts.upsert(account.clone()).unwrap();

        let template = RecurringTransaction::new(
            "Alquiler",
            MovementKind::Expense,
            Money::from_cents(300_000),
            Currency::Ars,
            account.id,
            Frequency::monthly_on(31),
            date(2025, 1, 31),
            mode,
        );
        let template = RecurringService::new(&storage).create(template).unwrap();
        (temp_dir, storage, template)
    }

    #[test]
    fn test_pending_and_confirm() {
        let (_temp_dir, storage, template) = setup(CreationMode::Confirm);
        let service = RecurringService::new(&storage);
        let today = date(2025, 3, 31);

        let pending = service.pending(today).unwrap();
        let dates: Vec<_> = pending.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 31)]);

        let movement = service
            .confirm_occurrence(template.id, date(2025, 2, 28), Some(Money::from_cents(310_000)))
            .unwrap();
        assert_eq!(movement.amount, Money::from_cents(310_000));
        assert_eq!(movement.recurring_id, Some(template.id));
        assert_eq!(service.pending(today).unwrap().len(), 2);

        let again = service.confirm_occurrence(template.id, date(2025, 2, 28), None);
        assert!(matches!(again.unwrap_err(), BilleteraError::InvalidState(_)));
        let not_an_occurrence = service.confirm_occurrence(template.id, date(2025, 2, 27), None);
        assert!(not_an_occurrence.unwrap_err().is_validation());
    }

    #[test]
    fn test_skip_and_stats() {
        let (_temp_dir, storage, template) = setup(CreationMode::Confirm);
        let service = RecurringService::new(&storage);
        let today = date(2025, 3, 31);

        service.skip_occurrence(template.id, date(2025, 1, 31)).unwrap();
        service.confirm_occurrence(template.id, date(2025, 2, 28), None).unwrap();

        let stats = service.list_with_stats(today).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].pending_count, 1);
        assert_eq!(stats[0].confirmed_count, 1);
        assert_eq!(stats[0].total_generated, Money::from_cents(300_000));
        assert_eq!(stats[0].next_date, Some(date(2025, 3, 31)));
    }

    #[test]
    fn test_process_due_only_auto() {
        let (_temp_dir, storage, template) = setup(CreationMode::Auto);
        let service = RecurringService::new(&storage);

        let created = service.process_due(date(2025, 2, 28)).unwrap();
        assert_eq!(created.len(), 2);
        assert!(service.pending(date(2025, 2, 28)).unwrap().is_empty());
        assert!(service.process_due(date(2025, 2, 28)).unwrap().is_empty());

        service
            .update(
                template.id,
                RecurringPatch {
                    creation_mode: Some(CreationMode::Confirm),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(service.process_due(date(2025, 3, 31)).unwrap().is_empty());
        assert_eq!(service.pending(date(2025, 3, 31)).unwrap().len(), 1);
    }

    #[test]
    fn test_archived_account_gets_no_movements() {
        let (_temp_dir, storage, template) = setup(CreationMode::Auto);
        let service = RecurringService::new(&storage);
        let mut account = storage.accounts.get(template.account_id).unwrap().unwrap();
        account.archive();
        storage.accounts.upsert(account).unwrap();

        assert!(service.process_due(date(2025, 3, 31)).unwrap().is_empty());
        assert_eq!(storage.movements.count().unwrap(), 0);
        assert_eq!(service.pending(date(2025, 3, 31)).unwrap().len(), 3);

        let err = service
            .confirm_occurrence(template.id, date(2025, 1, 31), None)
            .unwrap_err();
        assert!(matches!(err, BilleteraError::InvalidState(_)));
        assert!(storage.movements.get_by_account(template.account_id).unwrap().is_empty());
    }

    #[test]
    fn test_process_due_persists_before_auditing() {
        let (temp_dir, storage, template) = setup(CreationMode::Auto);
        let service = RecurringService::new(&storage);
        let created = service.process_due(date(2025, 3, 31)).unwrap();
        assert_eq!(created.len(), 3);

        let reopened = Storage::new(BilleteraPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        reopened.load_all().unwrap();
        let saved = reopened.movements.get_by_recurring(template.id).unwrap();
        assert_eq!(saved.len(), 3);

        let logged: Vec<String> = storage
            .audit()
            .read_all()
            .unwrap()
            .into_iter()
            .filter(|e| e.entity_type == EntityType::Movement)
            .map(|e| e.entity_id)
            .collect();
        assert_eq!(logged.len(), 3);
        for movement in &saved {
            assert!(logged.contains(&movement.id.to_string()));
        }

        let stored = reopened.recurring.get(template.id).unwrap().unwrap();
        assert_eq!(stored.confirmed_count(), 3);
    }

    #[test]
    fn test_pause_hides_pending() {
        let (_temp_dir, storage, template) = setup(CreationMode::Confirm);
        let service = RecurringService::new(&storage);

        service.pause(template.id).unwrap();
        assert!(service.pending(date(2025, 3, 31)).unwrap().is_empty());
        assert!(service.pause(template.id).is_err());
        let paused = service.confirm_occurrence(template.id, date(2025, 1, 31), None);
        assert!(matches!(paused.unwrap_err(), BilleteraError::InvalidState(_)));

        service.resume(template.id).unwrap();
        assert_eq!(service.pending(date(2025, 3, 31)).unwrap().len(), 3);
    }

    #[test]
    fn test_transfer_template_rejected() {
        let (_temp_dir, storage, template) = setup(CreationMode::Confirm);
        let mut transfer = template.clone();
        transfer.id = RecurringId::new();
        transfer.name = "Ahorro".into();
        transfer.kind = MovementKind::Transfer;

        let err = RecurringService::new(&storage).create(transfer).unwrap_err();
        assert!(err.is_validation());
    }
}
