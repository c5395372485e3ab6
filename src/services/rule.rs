//! Auto-categorization rule service
//!
//! Rules are evaluated by priority (highest first, ties by creation order).
//! The first active rule whose conditions hold supplies the suggestion.

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{Action, AutoRule, CategoryId, Condition, MatchMode, Movement, RuleId};
use crate::storage::Storage;

pub struct RuleService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone)]
pub struct RuleInput {
    pub name: String,
    pub priority: i32,
    pub match_mode: MatchMode,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub active: Option<bool>,
    pub match_mode: Option<MatchMode>,
    pub conditions: Option<Vec<Condition>>,
    pub actions: Option<Vec<Action>>,
}

/// What the winning rule proposes for a draft movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSuggestion {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
}

impl RuleSuggestion {
    /// Fill in the draft; an explicit category on the draft is kept
    pub fn apply_to(&self, movement: &mut Movement) {
        if movement.category_id.is_none() {
            movement.category_id = self.category_id;
        }
        if let Some(note) = &self.note {
            movement.note = note.clone();
        }
    }
}

impl<'a> RuleService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn check(&self, rule: &AutoRule) -> BilleteraResult<()> {
        rule.validate()
            .map_err(|e| BilleteraError::Rule(e.to_string()))?;
        if let Some(category_id) = rule.category_action() {
            if self.storage.categories.get(category_id)?.is_none() {
                return Err(BilleteraError::category_not_found(category_id.to_string()));
            }
        }
        Ok(())
    }

    pub fn create(&self, input: RuleInput) -> BilleteraResult<AutoRule> {
        let mut rule = AutoRule::new(input.name.trim());
        rule.priority = input.priority;
        rule.match_mode = input.match_mode;
        rule.conditions = input.conditions;
        rule.actions = input.actions;
        self.check(&rule)?;

        self.storage.rules.upsert(rule.clone())?;
        self.storage.rules.save()?;

        self.storage.log_create(
            EntityType::Rule,
            rule.id.to_string(),
            Some(rule.name.clone()),
            &rule,
        )?;
        self.storage.events().emit(Topic::Rules);
        info!(rule = %rule.id, name = %rule.name, "rule created");

        Ok(rule)
    }

    pub fn get(&self, id: RuleId) -> BilleteraResult<Option<AutoRule>> {
        self.storage.rules.get(id)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<AutoRule> {
        self.storage
            .rules
            .find_by_ref(reference)?
            .ok_or_else(|| BilleteraError::rule_not_found(reference))
    }

    /// All rules in evaluation order
    pub fn list(&self) -> BilleteraResult<Vec<AutoRule>> {
        let mut rules = self.storage.rules.get_all()?;
        // get_all is oldest first; a stable sort keeps that among equal priorities
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(rules)
    }

    pub fn update(&self, id: RuleId, patch: RulePatch) -> BilleteraResult<AutoRule> {
        let mut rule = self
            .storage
            .rules
            .get(id)?
            .ok_or_else(|| BilleteraError::rule_not_found(id.to_string()))?;
        let before = rule.clone();

        if let Some(name) = patch.name {
            rule.name = name.trim().to_string();
        }
        if let Some(priority) = patch.priority {
            rule.priority = priority;
        }
        if let Some(active) = patch.active {
            rule.active = active;
        }
        if let Some(mode) = patch.match_mode {
            rule.match_mode = mode;
        }
        if let Some(conditions) = patch.conditions {
            rule.conditions = conditions;
        }
        if let Some(actions) = patch.actions {
            rule.actions = actions;
        }
        self.check(&rule)?;
        rule.updated_at = Utc::now();

        self.storage.rules.upsert(rule.clone())?;
        self.storage.rules.save()?;

        self.storage.log_update(
            EntityType::Rule,
            rule.id.to_string(),
            Some(rule.name.clone()),
            &before,
            &rule,
        )?;
        self.storage.events().emit(Topic::Rules);

        Ok(rule)
    }

    pub fn delete(&self, id: RuleId) -> BilleteraResult<AutoRule> {
        let rule = self
            .storage
            .rules
            .delete(id)?
            .ok_or_else(|| BilleteraError::rule_not_found(id.to_string()))?;
        self.storage.rules.save()?;

        self.storage.log_delete(
            EntityType::Rule,
            rule.id.to_string(),
            Some(rule.name.clone()),
            &rule,
        )?;
        self.storage.events().emit(Topic::Rules);

        Ok(rule)
    }

    /// Suggestion from the first matching active rule, if any
    pub fn evaluate(&self, draft: &Movement) -> BilleteraResult<Option<RuleSuggestion>> {
        let winner = self
            .list()?
            .into_iter()
            .filter(|rule| rule.active)
            .find(|rule| rule.matches(draft));

        Ok(winner.map(|rule| {
            debug!(rule = %rule.id, "rule matched");
            RuleSuggestion {
                rule_id: rule.id,
                category_id: rule.category_action(),
                note: rule.apply_note(&draft.note),
                rule_name: rule.name,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BilleteraPaths;
    use crate::models::{
        AccountId, ActionField, Category, CategoryKind, ConditionField, Currency, Money, Operator,
    };
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BilleteraPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn category(storage: &Storage, name: &str) -> CategoryId {
        let category = Category::new(name, CategoryKind::Expense);
        let id = category.id;
        storage.categories.upsert(category).unwrap();
        id
    }

    fn note_rule(name: &str, priority: i32, needle: &str, category_id: CategoryId) -> RuleInput {
        RuleInput {
            name: name.to_string(),
            priority,
            match_mode: MatchMode::All,
            conditions: vec![Condition::new(ConditionField::Note, Operator::Contains, needle)],
            actions: vec![Action::set_category(category_id)],
        }
    }

    fn draft(note: &str) -> Movement {
        let mut movement = Movement::expense(
            AccountId::new(),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            Money::from_cents(10_000),
            Currency::Ars,
        );
        movement.note = note.to_string();
        movement
    }

    #[test]
    fn test_priority_wins_then_creation_order() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RuleService::new(&storage);
        let super_id = category(&storage, "Supermercado");
        let food_id = category(&storage, "Comida");
        let other_id = category(&storage, "Otros");

        service.create(note_rule("low", 0, "coto", other_id)).unwrap();
        service.create(note_rule("first", 5, "coto", super_id)).unwrap();
        service.create(note_rule("second", 5, "coto", food_id)).unwrap();

        let suggestion = service.evaluate(&draft("Compra en COTO")).unwrap().unwrap();
        assert_eq!(suggestion.rule_name, "first");
        assert_eq!(suggestion.category_id, Some(super_id));

        assert!(service.evaluate(&draft("Farmacia")).unwrap().is_none());
    }

    #[test]
    fn test_inactive_rules_are_skipped() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RuleService::new(&storage);
        let cat = category(&storage, "Transporte");
        let rule = service.create(note_rule("uber", 1, "uber", cat)).unwrap();

        service
            .update(rule.id, RulePatch { active: Some(false), ..Default::default() })
            .unwrap();
        assert!(service.evaluate(&draft("uber")).unwrap().is_none());
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RuleService::new(&storage);

        let mut input = note_rule("bad", 0, "x", CategoryId::new());
        let err = service.create(input.clone()).unwrap_err();
        assert!(err.is_not_found());

        input.actions = vec![Action::new(ActionField::Note, "x")];
        input.conditions = vec![Condition::new(ConditionField::Amount, Operator::Contains, "1")];
        assert!(matches!(service.create(input).unwrap_err(), BilleteraError::Rule(_)));
    }

    #[test]
    fn test_suggestion_keeps_explicit_category() {
        let explicit = CategoryId::new();
        let suggested = CategoryId::new();
        let suggestion = RuleSuggestion {
            rule_id: RuleId::new(),
            rule_name: "r".into(),
            category_id: Some(suggested),
            note: Some("tagged".into()),
        };

        let mut movement = draft("x");
        movement.category_id = Some(explicit);
        suggestion.apply_to(&mut movement);
        assert_eq!(movement.category_id, Some(explicit));
        assert_eq!(movement.note, "tagged");
    }
}
