//! Goal service
//!
//! Saving goals and their progress.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{Currency, Goal, GoalId, Money, Movement, MovementKind, Scope, YearMonth};
use crate::storage::Storage;

use super::budget::check_scope;

pub struct GoalService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<Money>,
    pub scope: Option<Scope>,
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` removes the deadline
    pub deadline: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub saved: Money,
    pub remaining: Money,
    pub percent: f64,
    pub completed: bool,
    /// Calendar months left including the current one; `None` without a deadline
    pub months_left: Option<i32>,
    /// Saving needed per month to reach the target by the deadline
    pub required_monthly: Option<Money>,
}

/// What a movement adds to (or takes from) a goal
///
/// Account goals share the account's currency, so the account-side amount of
/// every movement (transfers included) counts as is.
fn contribution(goal: &Goal, movement: &Movement) -> Money {
    match goal.scope {
        Scope::Account { account_id } => movement.signed_amount_for(account_id),
        _ if movement.currency != goal.currency || !goal.scope.includes(movement) => Money::zero(),
        _ => match movement.kind {
            MovementKind::Income => movement.amount,
            MovementKind::Expense => -movement.amount,
            MovementKind::Transfer => Money::zero(),
        },
    }
}

impl<'a> GoalService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// An account-scoped goal must be in the account's currency
    fn check(&self, goal: &Goal) -> BilleteraResult<()> {
        goal.validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        check_scope(self.storage, &goal.scope)?;
        if let Scope::Account { account_id } = goal.scope {
            if let Some(account) = self.storage.accounts.get(account_id)? {
                if account.currency != goal.currency {
                    return Err(BilleteraError::Validation(format!(
                        "Goal currency {} differs from account '{}' ({})",
                        goal.currency, account.name, account.currency
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn create(
        &self,
        name: &str,
        target_amount: Money,
        currency: Currency,
        scope: Scope,
        start_date: NaiveDate,
        deadline: Option<NaiveDate>,
    ) -> BilleteraResult<Goal> {
        let name = name.trim();
        if self.storage.goals.name_exists(name, None)? {
            return Err(BilleteraError::Duplicate {
                entity_type: "Goal",
                identifier: name.to_string(),
            });
        }

        let mut goal = Goal::new(name, target_amount, currency, scope, start_date);
        goal.deadline = deadline;
        self.check(&goal)?;

        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;

        self.storage.log_create(
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;
        self.storage.events().emit(Topic::Goals);
        info!(goal = %goal.id, name = %goal.name, "goal created");

        Ok(goal)
    }

    pub fn get(&self, id: GoalId) -> BilleteraResult<Option<Goal>> {
        self.storage.goals.get(id)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<Goal> {
        self.storage
            .goals
            .find_by_ref(reference)?
            .ok_or_else(|| BilleteraError::goal_not_found(reference))
    }

    /// Goals by deadline (open-ended last), then name
    pub fn list(&self) -> BilleteraResult<Vec<Goal>> {
        let mut goals = self.storage.goals.get_all()?;
        goals.sort_by(|a, b| {
            (a.deadline.is_none(), a.deadline, a.name.to_lowercase())
                .cmp(&(b.deadline.is_none(), b.deadline, b.name.to_lowercase()))
        });
        Ok(goals)
    }

    pub fn update(&self, id: GoalId, patch: GoalPatch) -> BilleteraResult<Goal> {
        let mut goal = self
            .storage
            .goals
            .get(id)?
            .ok_or_else(|| BilleteraError::goal_not_found(id.to_string()))?;
        let before = goal.clone();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if self.storage.goals.name_exists(&name, Some(id))? {
                return Err(BilleteraError::Duplicate {
                    entity_type: "Goal",
                    identifier: name,
                });
            }
            goal.name = name;
        }
        if let Some(target) = patch.target_amount {
            goal.target_amount = target;
        }
        if let Some(scope) = patch.scope {
            goal.scope = scope;
        }
        if let Some(start) = patch.start_date {
            goal.start_date = start;
        }
        if let Some(deadline) = patch.deadline {
            goal.deadline = deadline;
        }

        self.check(&goal)?;
        goal.updated_at = Utc::now();

        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;

        self.storage.log_update(
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &before,
            &goal,
        )?;
        self.storage.events().emit(Topic::Goals);

        Ok(goal)
    }

    pub fn delete(&self, id: GoalId) -> BilleteraResult<Goal> {
        let goal = self
            .storage
            .goals
            .delete(id)?
            .ok_or_else(|| BilleteraError::goal_not_found(id.to_string()))?;
        self.storage.goals.save()?;

        self.storage.log_delete(
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        )?;
        self.storage.events().emit(Topic::Goals);

        Ok(goal)
    }

    /// Net saving in scope from the start date up to `today`
    pub fn progress(&self, goal: &Goal, today: NaiveDate) -> BilleteraResult<GoalProgress> {
        let saved: Money = if today < goal.start_date {
            Money::zero()
        } else {
            self.storage
                .movements
                .get_by_date_range(goal.start_date, today)?
                .iter()
                .map(|m| contribution(goal, m))
                .sum()
        };

        let remaining = if saved >= goal.target_amount {
            Money::zero()
        } else {
            goal.target_amount - saved
        };
        let percent = (saved.as_f64() / goal.target_amount.as_f64() * 100.0).max(0.0);

        let months_left = goal.deadline.map(|deadline| {
            if deadline < today {
                0
            } else {
                YearMonth::from_date(today).months_until(&YearMonth::from_date(deadline)) + 1
            }
        });
        let required_monthly = match months_left {
            Some(months) if months > 0 => {
                let months = months as i64;
                Some(Money::from_cents((remaining.cents() + months - 1) / months))
            }
            _ => None,
        };

        Ok(GoalProgress {
            goal: goal.clone(),
            saved,
            remaining,
            percent,
            completed: saved >= goal.target_amount,
            months_left,
            required_monthly,
        })
    }
}
