//! Auto-categorization rule model
//!
//! A rule matches a draft movement through a list of conditions and, when it
//! matches, suggests a category and/or a note.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, RuleId};
use super::money::{Currency, Money};
use super::movement::{Movement, MovementKind};

/// How the conditions of a rule are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every condition must hold
    #[default]
    All,
    /// At least one condition must hold
    Any,
}

impl MatchMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "and" => Some(Self::All),
            "any" | "or" => Some(Self::Any),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    Note,
    Amount,
    Account,
    Category,
    Kind,
    Currency,
}

impl ConditionField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "note" | "description" => Some(Self::Note),
            "amount" => Some(Self::Amount),
            "account" => Some(Self::Account),
            "category" => Some(Self::Category),
            "kind" | "type" => Some(Self::Kind),
            "currency" => Some(Self::Currency),
            _ => None,
        }
    }

    /// Operators that make sense for this field
    pub fn allows(&self, operator: Operator) -> bool {
        use Operator::*;
        match self {
            Self::Note => matches!(operator, Contains | Equals | NotEquals | StartsWith | EndsWith),
            Self::Amount => matches!(operator, Equals | NotEquals | GreaterThan | LessThan),
            Self::Account | Self::Category | Self::Kind | Self::Currency => {
                matches!(operator, Equals | NotEquals)
            }
        }
    }
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Note => "note",
            Self::Amount => "amount",
            Self::Account => "account",
            Self::Category => "category",
            Self::Kind => "kind",
            Self::Currency => "currency",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Contains,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contains" => Some(Self::Contains),
            "equals" | "eq" | "=" | "==" => Some(Self::Equals),
            "not_equals" | "ne" | "!=" => Some(Self::NotEquals),
            "starts_with" => Some(Self::StartsWith),
            "ends_with" => Some(Self::EndsWith),
            "greater_than" | "gt" | ">" => Some(Self::GreaterThan),
            "less_than" | "lt" | "<" => Some(Self::LessThan),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
        };
        write!(f, "{}", name)
    }
}

/// A single test against a draft movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: ConditionField,
    pub operator: Operator,
    /// Compared value; account and category conditions hold an ID reference
    pub value: String,
}

impl Condition {
    pub fn new(field: ConditionField, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        match self.field {
            ConditionField::Note => match_text(self.operator, &movement.note, &self.value),
            ConditionField::Amount => match Money::parse(&self.value) {
                Ok(expected) => match self.operator {
                    Operator::Equals => movement.amount == expected,
                    Operator::NotEquals => movement.amount != expected,
                    Operator::GreaterThan => movement.amount > expected,
                    Operator::LessThan => movement.amount < expected,
                    _ => false,
                },
                Err(_) => false,
            },
            ConditionField::Account => {
                match_equality(self.operator, movement.account_id.matches_ref(&self.value))
            }
            ConditionField::Category => match_equality(
                self.operator,
                movement
                    .category_id
                    .is_some_and(|id| id.matches_ref(&self.value)),
            ),
            ConditionField::Kind => match_equality(
                self.operator,
                MovementKind::parse(&self.value) == Some(movement.kind),
            ),
            ConditionField::Currency => match_equality(
                self.operator,
                Currency::parse(&self.value) == Some(movement.currency),
            ),
        }
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if !self.field.allows(self.operator) {
            return Err(RuleValidationError::OperatorNotAllowed {
                field: self.field,
                operator: self.operator,
            });
        }
        let value = self.value.trim();
        if value.is_empty() {
            return Err(RuleValidationError::EmptyValue(self.field));
        }
        let parses = match self.field {
            ConditionField::Amount => Money::parse(value).is_ok(),
            ConditionField::Kind => MovementKind::parse(value).is_some(),
            ConditionField::Currency => Currency::parse(value).is_some(),
            _ => true,
        };
        if !parses {
            return Err(RuleValidationError::InvalidValue {
                field: self.field,
                value: value.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.field, self.operator, self.value)
    }
}

fn match_text(operator: Operator, text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    match operator {
        Operator::Contains => text.contains(&pattern),
        Operator::Equals => text == pattern,
        Operator::NotEquals => text != pattern,
        Operator::StartsWith => text.starts_with(&pattern),
        Operator::EndsWith => text.ends_with(&pattern),
        Operator::GreaterThan | Operator::LessThan => false,
    }
}

fn match_equality(operator: Operator, equal: bool) -> bool {
    match operator {
        Operator::Equals => equal,
        Operator::NotEquals => !equal,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionField {
    /// Set the category (value is the category ID)
    Category,
    /// Replace the note
    Note,
    /// Append to the existing note
    AppendNote,
}

impl ActionField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "category" => Some(Self::Category),
            "note" | "set_note" => Some(Self::Note),
            "append_note" | "append" => Some(Self::AppendNote),
            _ => None,
        }
    }
}

impl fmt::Display for ActionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Note => write!(f, "note"),
            Self::AppendNote => write!(f, "append_note"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub field: ActionField,
    pub value: String,
}

impl Action {
    pub fn new(field: ActionField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub fn set_category(category_id: CategoryId) -> Self {
        Self::new(ActionField::Category, category_id.as_uuid().to_string())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.field, self.value)
    }
}

/// An auto-categorization rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRule {
    pub id: RuleId,
    pub name: String,
    /// Higher runs first
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl AutoRule {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RuleId::new(),
            name: name.into(),
            priority: 0,
            active: true,
            match_mode: MatchMode::All,
            conditions: Vec::new(),
            actions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the rule matches a draft movement
    ///
    /// A rule without conditions never matches.
    pub fn matches(&self, movement: &Movement) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        match self.match_mode {
            MatchMode::All => self.conditions.iter().all(|c| c.matches(movement)),
            MatchMode::Any => self.conditions.iter().any(|c| c.matches(movement)),
        }
    }

    /// Category this rule would assign, if any
    pub fn category_action(&self) -> Option<CategoryId> {
        self.actions
            .iter()
            .filter(|a| a.field == ActionField::Category)
            .find_map(|a| a.value.parse().ok())
    }

    /// Apply the note actions to an existing note, in order
    pub fn apply_note(&self, note: &str) -> Option<String> {
        let mut result: Option<String> = None;
        for action in &self.actions {
            let current = result.as_deref().unwrap_or(note);
            match action.field {
                ActionField::Note => result = Some(action.value.clone()),
                ActionField::AppendNote => {
                    result = Some(if current.is_empty() {
                        action.value.clone()
                    } else {
                        format!("{} {}", current, action.value)
                    })
                }
                ActionField::Category => {}
            }
        }
        result
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.name.trim().is_empty() {
            return Err(RuleValidationError::EmptyName);
        }
        if self.actions.is_empty() {
            return Err(RuleValidationError::NoActions);
        }
        for condition in &self.conditions {
            condition.validate()?;
        }
        for action in &self.actions {
            if action.field == ActionField::Category && action.value.parse::<CategoryId>().is_err() {
                return Err(RuleValidationError::InvalidCategory(action.value.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for AutoRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (priority {})", self.name, self.priority)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    EmptyName,
    NoActions,
    EmptyValue(ConditionField),
    OperatorNotAllowed {
        field: ConditionField,
        operator: Operator,
    },
    InvalidValue {
        field: ConditionField,
        value: String,
    },
    InvalidCategory(String),
}

impl fmt::Display for RuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Rule name cannot be empty"),
            Self::NoActions => write!(f, "Rule needs at least one action"),
            Self::EmptyValue(field) => write!(f, "Condition on {} needs a value", field),
            Self::OperatorNotAllowed { field, operator } => {
                write!(f, "Operator {} cannot be used on {}", operator, field)
            }
            Self::InvalidValue { field, value } => {
                write!(f, "Invalid value for {}: {}", field, value)
            }
            Self::InvalidCategory(value) => write!(f, "Invalid category reference: {}", value),
        }
    }
}

impl std::error::Error for RuleValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountId;
    use chrono::NaiveDate;

    fn draft(note: &str, cents: i64) -> Movement {
        let mut movement = Movement::expense(
            AccountId::new(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            Money::from_cents(cents),
            Currency::Ars,
        );
        movement.note = note.to_string();
        movement
    }

    #[test]
    fn test_text_operators_are_case_insensitive() {
        let movement = draft("Carrefour Express", 1000);
        assert!(Condition::new(ConditionField::Note, Operator::Contains, "carrefour").matches(&movement));
        assert!(Condition::new(ConditionField::Note, Operator::StartsWith, "CARRE").matches(&movement));
        assert!(Condition::new(ConditionField::Note, Operator::EndsWith, "express").matches(&movement));
        assert!(!Condition::new(ConditionField::Note, Operator::Equals, "carrefour").matches(&movement));
    }

    #[test]
    fn test_amount_comparisons() {
        let movement = draft("", 150_000);
        assert!(Condition::new(ConditionField::Amount, Operator::GreaterThan, "1000").matches(&movement));
        assert!(!Condition::new(ConditionField::Amount, Operator::LessThan, "1000").matches(&movement));
        assert!(Condition::new(ConditionField::Amount, Operator::Equals, "1.500,00").matches(&movement));
    }

    #[test]
    fn test_match_modes() {
        let movement = draft("Uber", 2000);
        let mut rule = AutoRule::new("Transporte");
        rule.conditions = vec![
            Condition::new(ConditionField::Note, Operator::Contains, "uber"),
            Condition::new(ConditionField::Currency, Operator::Equals, "USD"),
        ];
        assert!(!rule.matches(&movement));
        rule.match_mode = MatchMode::Any;
        assert!(rule.matches(&movement));
    }

    #[test]
    fn test_rule_without_conditions_never_matches() {
        let rule = AutoRule::new("Empty");
        assert!(!rule.matches(&draft("anything", 1)));
    }

    #[test]
    fn test_operator_validation() {
        let condition = Condition::new(ConditionField::Amount, Operator::Contains, "10");
        assert!(matches!(
            condition.validate(),
            Err(RuleValidationError::OperatorNotAllowed { .. })
        ));
        let condition = Condition::new(ConditionField::Kind, Operator::Equals, "refund");
        assert!(matches!(
            condition.validate(),
            Err(RuleValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_actions() {
        let category = CategoryId::new();
        let mut rule = AutoRule::new("Super");
        rule.actions = vec![
            Action::set_category(category),
            Action::new(ActionField::AppendNote, "#super"),
        ];
        assert!(rule.validate().is_ok());
        assert_eq!(rule.category_action(), Some(category));
        assert_eq!(rule.apply_note("Coto"), Some("Coto #super".to_string()));
        assert_eq!(rule.apply_note(""), Some("#super".to_string()));

        rule.actions = vec![Action::new(ActionField::Category, "not-an-id")];
        assert!(matches!(
            rule.validate(),
            Err(RuleValidationError::InvalidCategory(_))
        ));
    }
}
