//! Scheduled transaction service
//!
//! One-off future movements. A pending item turns into a real movement when
//! approved, or automatically once due if it does not require approval.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::currency::convert_money;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{
    Account, AccountId, CategoryId, CategoryKind, Money, Movement, MovementKind, ScheduledId,
    ScheduledStatus, ScheduledTransaction,
};
use crate::storage::Storage;

use super::statement::StatementService;

pub struct ScheduledService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduledPatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub destination_amount: Option<Money>,
    pub category_id: Option<Option<CategoryId>>,
    pub note: Option<String>,
    pub requires_approval: Option<bool>,
}

impl<'a> ScheduledService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    fn load(&self, id: ScheduledId) -> BilleteraResult<ScheduledTransaction> {
        self.storage
            .scheduled
            .get(id)?
            .ok_or_else(|| BilleteraError::scheduled_not_found(id.to_string()))
    }

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

    fn check(&self, item: &mut ScheduledTransaction) -> BilleteraResult<()> {
        item.validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        let account = self.active_account(item.account_id)?;
        item.currency = account.currency;
        if let Some(destination) = item.destination_account_id {
            self.active_account(destination)?;
        }

        if let Some(category_id) = item.category_id {
            let category = self
                .storage
                .categories
                .get(category_id)?
                .ok_or_else(|| BilleteraError::category_not_found(category_id.to_string()))?;
            let fits = matches!(
                (item.kind, category.kind),
                (MovementKind::Income, CategoryKind::Income)
                    | (MovementKind::Expense, CategoryKind::Expense)
            );
            if !fits {
                return Err(BilleteraError::Validation(format!(
                    "Category '{}' cannot be used on a {}",
                    category.name,
                    item.kind.to_string().to_lowercase()
                )));
            }
        }
        Ok(())
    }

    fn ensure_pending(item: &ScheduledTransaction) -> BilleteraResult<()> {
        if item.is_pending() {
            Ok(())
        } else {
            Err(BilleteraError::InvalidState(format!(
                "Scheduled transaction {} is already {}",
                item.id, item.status
            )))
        }
    }

    pub fn create(&self, mut item: ScheduledTransaction) -> BilleteraResult<ScheduledTransaction> {
        item.status = ScheduledStatus::Pending;
        item.movement_id = None;
        self.check(&mut item)?;

        self.storage.scheduled.upsert(item.clone())?;
        self.storage.scheduled.save()?;

        self.storage.log_create(
            EntityType::Scheduled,
            item.id.to_string(),
            Some(item.to_string()),
            &item,
        )?;
        self.storage.events().emit(Topic::Scheduled);
        info!(scheduled = %item.id, date = %item.date, "scheduled transaction created");

        Ok(item)
    }

    pub fn get(&self, id: ScheduledId) -> BilleteraResult<Option<ScheduledTransaction>> {
        self.storage.scheduled.get(id)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<ScheduledTransaction> {
        self.storage
            .scheduled
            .find_by_ref(reference)?
            .ok_or_else(|| BilleteraError::scheduled_not_found(reference))
    }

    /// Items by date, optionally only those in one status
    pub fn list(&self, status: Option<ScheduledStatus>) -> BilleteraResult<Vec<ScheduledTransaction>> {
        let mut items = self
            .storage
            .scheduled
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))?;
        items.sort_by_key(|s| s.date);
        Ok(items)
    }

    /// Due items that wait for the user
    pub fn awaiting_approval(&self, today: NaiveDate) -> BilleteraResult<Vec<ScheduledTransaction>> {
        Ok(self
            .list(Some(ScheduledStatus::Pending))?
            .into_iter()
            .filter(|s| s.requires_approval && s.is_due(today))
            .collect())
    }

    fn store_update(&self, before: &ScheduledTransaction, after: &ScheduledTransaction) -> BilleteraResult<()> {
        self.storage.scheduled.upsert(after.clone())?;
        self.storage.scheduled.save()?;
        self.storage.log_update(
            EntityType::Scheduled,
            after.id.to_string(),
            Some(after.to_string()),
            before,
            after,
        )?;
        self.storage.events().emit(Topic::Scheduled);
        Ok(())
    }

    pub fn update(&self, id: ScheduledId, patch: ScheduledPatch) -> BilleteraResult<ScheduledTransaction> {
        let mut item = self.load(id)?;
        Self::ensure_pending(&item)?;
        let before = item.clone();

        if let Some(date) = patch.date {
            item.date = date;
        }
        if let Some(amount) = patch.amount {
            item.amount = amount;
        }
        if let Some(amount) = patch.destination_amount {
            item.destination_amount = Some(amount);
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        if let Some(note) = patch.note {
            item.note = note.trim().to_string();
        }
        if let Some(requires_approval) = patch.requires_approval {
            item.requires_approval = requires_approval;
        }

        self.check(&mut item)?;
        item.updated_at = Utc::now();
        self.store_update(&before, &item)?;

        Ok(item)
    }

    pub fn delete(&self, id: ScheduledId) -> BilleteraResult<ScheduledTransaction> {
        let item = self
            .storage
            .scheduled
            .delete(id)?
            .ok_or_else(|| BilleteraError::scheduled_not_found(id.to_string()))?;
        self.storage.scheduled.save()?;

        self.storage.log_delete(
            EntityType::Scheduled,
            item.id.to_string(),
            Some(item.to_string()),
            &item,
        )?;
        self.storage.events().emit(Topic::Scheduled);

        Ok(item)
    }

    /// The movement an item becomes
    fn to_movement(&self, item: &ScheduledTransaction) -> BilleteraResult<Movement> {
        let account = self.active_account(item.account_id)?;
        let mut movement = Movement::new(item.kind, account.id, item.date, item.amount, account.currency);
        movement.note = item.note.clone();
        movement.scheduled_id = Some(item.id);

        match item.kind {
            MovementKind::Transfer => {
                let destination_id = item
                    .destination_account_id
                    .ok_or_else(|| BilleteraError::Validation("Transfers need a destination account".into()))?;
                let destination = self.active_account(destination_id)?;
                movement.destination_account_id = Some(destination.id);
                movement.destination_amount = Some(match item.destination_amount {
                    Some(amount) => amount,
                    None => convert_money(
                        item.amount,
                        account.currency,
                        destination.currency,
                        &self.settings.exchange_rates,
                    )?,
                });
            }
            MovementKind::Expense => {
                movement.category_id = item.category_id;
                if account.is_credit_card {
                    movement.statement_period =
                        Some(StatementService::new(self.storage).default_period(&account, item.date)?);
                }
            }
            MovementKind::Income => movement.category_id = item.category_id,
        }

        movement
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        Ok(movement)
    }

    /// Post the item as a movement
    fn post(&self, mut item: ScheduledTransaction) -> BilleteraResult<Movement> {
        let before = item.clone();
        let movement = self.to_movement(&item)?;

        self.storage.movements.upsert(movement.clone())?;
        self.storage.movements.save()?;
        self.storage.log_create(
            EntityType::Movement,
            movement.id.to_string(),
            Some(movement.to_string()),
            &movement,
        )?;

        item.status = ScheduledStatus::Approved;
        item.movement_id = Some(movement.id);
        item.updated_at = Utc::now();
        self.store_update(&before, &item)?;
        self.storage.events().emit(Topic::Movements);
        info!(scheduled = %item.id, movement = %movement.id, "scheduled transaction posted");

        Ok(movement)
    }

    pub fn approve(&self, id: ScheduledId) -> BilleteraResult<Movement> {
        let item = self.load(id)?;
        Self::ensure_pending(&item)?;
        self.post(item)
    }

    pub fn reject(&self, id: ScheduledId) -> BilleteraResult<ScheduledTransaction> {
        let mut item = self.load(id)?;
        Self::ensure_pending(&item)?;
        let before = item.clone();

        item.status = ScheduledStatus::Rejected;
        item.updated_at = Utc::now();
        self.store_update(&before, &item)?;
        info!(scheduled = %item.id, "scheduled transaction rejected");

        Ok(item)
    }

    /// Post every due item that does not need approval
    pub fn process_due(&self, today: NaiveDate) -> BilleteraResult<Vec<Movement>> {
        self.list(Some(ScheduledStatus::Pending))?
            .into_iter()
            .filter(|item| !item.requires_approval && item.is_due(today))
            .map(|item| self.post(item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BilleteraPaths;
    use crate::currency::ExchangeRates;
    use crate::models::Currency;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BilleteraPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn account(storage: &Storage, name: &str, currency: Currency) -> Account {
        let account = Account::new(name, currency);
        storage.accounts.upsert(account.clone()).unwrap();
        account
    }

    #[test]
    fn test_approve_creates_movement() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = ScheduledService::new(&storage, &settings);
        let bank = account(&storage, "Banco", Currency::Ars);

        let item = service
            .create(ScheduledTransaction::new(
                MovementKind::Expense,
                bank.id,
                date(10),
                Money::from_cents(5_000),
                Currency::Ars,
            ))
            .unwrap();

        let movement = service.approve(item.id).unwrap();
        assert_eq!(movement.scheduled_id, Some(item.id));
        assert_eq!(movement.date, date(10));

        let stored = service.get(item.id).unwrap().unwrap();
        assert_eq!(stored.status, ScheduledStatus::Approved);
        assert_eq!(stored.movement_id, Some(movement.id));

        assert!(matches!(
            service.approve(item.id).unwrap_err(),
            BilleteraError::InvalidState(_)
        ));
        let edit = service.update(
            item.id,
            ScheduledPatch {
                note: Some("late".into()),
                ..Default::default()
            },
        );
        assert!(matches!(edit.unwrap_err(), BilleteraError::InvalidState(_)));
    }

    #[test]
    fn test_process_due_skips_items_needing_approval() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = ScheduledService::new(&storage, &settings);
        let bank = account(&storage, "Banco", Currency::Ars);

        let mut automatic = ScheduledTransaction::new(
            MovementKind::Income,
            bank.id,
            date(5),
            Money::from_cents(100),
            Currency::Ars,
        );
        automatic.requires_approval = false;
        let automatic = service.create(automatic).unwrap();
        let manual = service
            .create(ScheduledTransaction::new(
                MovementKind::Income,
                bank.id,
                date(5),
                Money::from_cents(200),
                Currency::Ars,
            ))
            .unwrap();

        let created = service.process_due(date(6)).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].scheduled_id, Some(automatic.id));

        let waiting = service.awaiting_approval(date(6)).unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].id, manual.id);
    }

    #[test]
    fn test_scheduled_transfer_converts() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = ScheduledService::new(&storage, &settings);
        let pesos = account(&storage, "Pesos", Currency::Ars);
        let dollars = account(&storage, "Dolares", Currency::Usd);

        let mut transfer = ScheduledTransaction::new(
            MovementKind::Transfer,
            pesos.id,
            date(1),
            Money::from_cents(200_000),
            Currency::Ars,
        );
        transfer.destination_account_id = Some(dollars.id);
        let transfer = service.create(transfer).unwrap();

        let movement = service.approve(transfer.id).unwrap();
        assert_eq!(movement.destination_amount, Some(Money::from_cents(200)));
    }

    #[test]
    fn test_scheduled_transfer_with_invalid_rate_stays_pending() {
        let (_temp_dir, storage) = create_test_storage();
        let mut settings = Settings::default();
        settings.exchange_rates = ExchangeRates::new(f64::NAN);
        let service = ScheduledService::new(&storage, &settings);
        let pesos = account(&storage, "Pesos", Currency::Ars);
        let dollars = account(&storage, "Dolares", Currency::Usd);

        let mut transfer = ScheduledTransaction::new(
            MovementKind::Transfer,
            pesos.id,
            date(1),
            Money::from_cents(200_000),
            Currency::Ars,
        );
        transfer.destination_account_id = Some(dollars.id);
        let transfer = service.create(transfer).unwrap();

        assert!(service.approve(transfer.id).unwrap_err().is_validation());
        assert_eq!(storage.movements.count().unwrap(), 0);
        assert_eq!(service.list(Some(ScheduledStatus::Pending)).unwrap().len(), 1);
    }

    #[test]
    fn test_reject() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = ScheduledService::new(&storage, &settings);
        let bank = account(&storage, "Banco", Currency::Ars);
        let item = service
            .create(ScheduledTransaction::new(
                MovementKind::Expense,
                bank.id,
                date(1),
                Money::from_cents(100),
                Currency::Ars,
            ))
            .unwrap();

        service.reject(item.id).unwrap();
        assert!(service.list(Some(ScheduledStatus::Pending)).unwrap().is_empty());
        assert_eq!(storage.movements.count().unwrap(), 0);
    }
}
