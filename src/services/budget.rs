//! Budget service
//!
//! Monthly spending limits and their progress.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{Budget, BudgetId, Currency, Money, MovementKind, Scope, YearMonth};
use crate::storage::Storage;

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<Currency>,
    pub scope: Option<Scope>,
    pub active: Option<bool>,
}

/// How much of a budget one month has used
#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub month: YearMonth,
    pub spent: Money,
    pub remaining: Money,
    pub percent: f64,
    pub over_limit: bool,
}

/// Check that the category or account a scope points at exists
pub(crate) fn check_scope(storage: &Storage, scope: &Scope) -> BilleteraResult<()> {
    match scope {
        Scope::Global => Ok(()),
        Scope::Category { category_id } => storage
            .categories
            .get(*category_id)?
            .map(|_| ())
            .ok_or_else(|| BilleteraError::category_not_found(category_id.to_string())),
        Scope::Account { account_id } => storage
            .accounts
            .get(*account_id)?
            .map(|_| ())
            .ok_or_else(|| BilleteraError::account_not_found(account_id.to_string())),
    }
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(
        &self,
        name: &str,
        amount: Money,
        currency: Currency,
        scope: Scope,
    ) -> BilleteraResult<Budget> {
        let name = name.trim();
        if self.storage.budgets.name_exists(name, None)? {
            return Err(BilleteraError::Duplicate {
                entity_type: "Budget",
                identifier: name.to_string(),
            });
        }

        let budget = Budget::new(name, amount, currency, scope);
        budget
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        check_scope(self.storage, &budget.scope)?;

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        self.storage.log_create(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;
        self.storage.events().emit(Topic::Budgets);
        info!(budget = %budget.id, name = %budget.name, "budget created");

        Ok(budget)
    }

    pub fn get(&self, id: BudgetId) -> BilleteraResult<Option<Budget>> {
        self.storage.budgets.get(id)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<Budget> {
        self.storage
            .budgets
            .find_by_ref(reference)?
            .ok_or_else(|| BilleteraError::budget_not_found(reference))
    }

    pub fn list(&self, include_inactive: bool) -> BilleteraResult<Vec<Budget>> {
        let mut budgets = self
            .storage
            .budgets
            .filter(|b| include_inactive || b.active)?;
        budgets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(budgets)
    }

    pub fn update(&self, id: BudgetId, patch: BudgetPatch) -> BilleteraResult<Budget> {
        let mut budget = self
            .storage
            .budgets
            .get(id)?
            .ok_or_else(|| BilleteraError::budget_not_found(id.to_string()))?;
        let before = budget.clone();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if self.storage.budgets.name_exists(&name, Some(id))? {
                return Err(BilleteraError::Duplicate {
                    entity_type: "Budget",
                    identifier: name,
                });
            }
            budget.name = name;
        }
        if let Some(amount) = patch.amount {
            budget.amount = amount;
        }
        if let Some(currency) = patch.currency {
            budget.currency = currency;
        }
        if let Some(scope) = patch.scope {
            check_scope(self.storage, &scope)?;
            budget.scope = scope;
        }
        if let Some(active) = patch.active {
            budget.active = active;
        }

        budget
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        budget.updated_at = Utc::now();

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        self.storage.log_update(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &before,
            &budget,
        )?;
        self.storage.events().emit(Topic::Budgets);

        Ok(budget)
    }

    pub fn delete(&self, id: BudgetId) -> BilleteraResult<Budget> {
        let budget = self
            .storage
            .budgets
            .delete(id)?
            .ok_or_else(|| BilleteraError::budget_not_found(id.to_string()))?;
        self.storage.budgets.save()?;

        self.storage.log_delete(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;
        self.storage.events().emit(Topic::Budgets);

        Ok(budget)
    }

    /// Expenses in scope and in the budget's currency during `month`
    pub fn progress(&self, budget: &Budget, month: YearMonth) -> BilleteraResult<BudgetProgress> {
        let spent: Money = self
            .storage
            .movements
            .get_by_date_range(month.start_date(), month.end_date())?
            .iter()
            .filter(|m| {
                m.kind == MovementKind::Expense
                    && m.currency == budget.currency
                    && budget.scope.includes(m)
            })
            .map(|m| m.amount)
            .sum();

        let percent = if budget.amount.is_positive() {
            spent.as_f64() / budget.amount.as_f64() * 100.0
        } else {
            0.0
        };

        Ok(BudgetProgress {
            budget: budget.clone(),
            month,
            spent,
            remaining: budget.amount - spent,
            percent,
            over_limit: spent > budget.amount,
        })
    }

    /// Progress of every active budget in `month`
    pub fn overview(&self, month: YearMonth) -> BilleteraResult<Vec<BudgetProgress>> {
        self.list(false)?
            .iter()
            .map(|budget| self.progress(budget, month))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BilleteraPaths;
    use crate::models::{Account, Category, CategoryId, CategoryKind, Movement};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BilleteraPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_progress_counts_scope_currency_and_month() {
        let (_temp_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let account = Account::new("Banco", Currency::Ars);
        let food = Category::new("Comida", CategoryKind::Expense);
        storage.accounts.upsert(account.clone()).unwrap();
        storage.categories.upsert(food.clone()).unwrap();

        let budget = service
            .create(
                "Comida",
                Money::from_cents(10_000),
                Currency::Ars,
                Scope::Category { category_id: food.id },
            )
            .unwrap();

        let movements = [
            (date(3, 1), 6_000, Currency::Ars, Some(food.id), MovementKind::Expense),
            (date(3, 31), 5_000, Currency::Ars, Some(food.id), MovementKind::Expense),
            (date(4, 1), 9_000, Currency::Ars, Some(food.id), MovementKind::Expense),
            (date(3, 10), 9_000, Currency::Usd, Some(food.id), MovementKind::Expense),
            (date(3, 10), 9_000, Currency::Ars, None, MovementKind::Expense),
            (date(3, 10), 9_000, Currency::Ars, Some(food.id), MovementKind::Income),
        ];
        for (d, cents, currency, category_id, kind) in movements {
            let mut m = Movement::new(kind, account.id, d, Money::from_cents(cents), currency);
            m.category_id = category_id;
            storage.movements.upsert(m).unwrap();
        }

        let progress = service
            .progress(&budget, YearMonth::new(2025, 3).unwrap())
            .unwrap();
        assert_eq!(progress.spent, Money::from_cents(11_000));
        assert_eq!(progress.remaining, Money::from_cents(-1_000));
        assert!(progress.over_limit);
        assert!((progress.percent - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_crud() {
        let (_temp_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);

        let budget = service
            .create("General", Money::from_cents(100), Currency::Ars, Scope::Global)
            .unwrap();
        assert!(service
            .create("general", Money::from_cents(100), Currency::Ars, Scope::Global)
            .is_err());
        assert!(service
            .create("Zero", Money::zero(), Currency::Ars, Scope::Global)
            .unwrap_err()
            .is_validation());
        assert!(service
            .create(
                "Ghost",
                Money::from_cents(1),
                Currency::Ars,
                Scope::Category { category_id: CategoryId::new() }
            )
            .unwrap_err()
            .is_not_found());

        service
            .update(budget.id, BudgetPatch { active: Some(false), ..Default::default() })
            .unwrap();
        assert!(service.list(false).unwrap().is_empty());
        assert_eq!(service.list(true).unwrap().len(), 1);

        service.delete(budget.id).unwrap();
        assert!(service.get(budget.id).unwrap().is_none());
    }
}
