//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of write being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Entities that show up in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Account,
    Category,
    Movement,
    StatementPayment,
    Budget,
    Goal,
    Recurring,
    Scheduled,
    Rule,
}

impl EntityType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "account" | "accounts" => Some(Self::Account),
            "category" | "categories" => Some(Self::Category),
            "movement" | "movements" => Some(Self::Movement),
            "statement_payment" | "payment" | "payments" => Some(Self::StatementPayment),
            "budget" | "budgets" => Some(Self::Budget),
            "goal" | "goals" => Some(Self::Goal),
            "recurring" => Some(Self::Recurring),
            "scheduled" => Some(Self::Scheduled),
            "rule" | "rules" => Some(Self::Rule),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Account => "Account",
            EntityType::Category => "Category",
            EntityType::Movement => "Movement",
            EntityType::StatementPayment => "StatementPayment",
            EntityType::Budget => "Budget",
            EntityType::Goal => "Goal",
            EntityType::Recurring => "Recurring",
            EntityType::Scheduled => "Scheduled",
            EntityType::Rule => "Rule",
        };
        write!(f, "{}", name)
    }
}

/// One line of the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Short display form of the entity ID (e.g. `mov-1a2b3c4d`)
    pub entity_id: String,

    /// Human-readable label (account name, movement summary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Snapshot before the change (updates and deletes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    /// Snapshot after the change (creates and updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            entity_name,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        let mut entry = Self::new(Operation::Create, entity_type, entity_id.into(), entity_name);
        entry.after = serde_json::to_value(entity).ok();
        entry
    }

    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Self {
        let mut entry = Self::new(Operation::Update, entity_type, entity_id.into(), entity_name);
        entry.before = serde_json::to_value(before).ok();
        entry.after = serde_json::to_value(after).ok();
        entry.diff_summary = diff_summary;
        entry
    }

    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        let mut entry = Self::new(Operation::Delete, entity_type, entity_id.into(), entity_name);
        entry.before = serde_json::to_value(entity).ok();
        entry
    }

    /// One or two lines for terminal output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_parse() {
        assert_eq!(EntityType::parse("movements"), Some(EntityType::Movement));
        assert_eq!(
            EntityType::parse("statement-payment"),
            Some(EntityType::StatementPayment)
        );
        assert_eq!(EntityType::parse("payee"), None);
    }

    #[test]
    fn test_create_has_only_after() {
        let entry = AuditEntry::create(
            EntityType::Movement,
            "mov-12345678",
            Some("Coto".to_string()),
            &json!({"amount": 150000}),
        );
        assert_eq!(entry.operation, Operation::Create);
        assert!(entry.before.is_none());
        assert_eq!(entry.after.unwrap()["amount"], 150000);
    }

    #[test]
    fn test_update_and_delete_snapshots() {
        let before = json!({"name": "Visa"});
        let after = json!({"name": "Visa Galicia"});
        let entry = AuditEntry::update(
            EntityType::Account,
            "acc-12345678",
            None,
            &before,
            &after,
            Some("name: \"Visa\" -> \"Visa Galicia\"".to_string()),
        );
        assert!(entry.before.is_some() && entry.after.is_some());

        let entry = AuditEntry::delete(EntityType::Rule, "rule-1234abcd", None, &before);
        assert_eq!(entry.operation, Operation::Delete);
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_serialization_uses_snake_case_entity() {
        let entry = AuditEntry::create(EntityType::StatementPayment, "pay-1", None, &json!({}));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["entity_type"], "statement_payment");
        assert_eq!(json["operation"], "create");
        assert!(json.get("before").is_none());
    }

    #[test]
    fn test_human_readable_format() {
        let mut entry = AuditEntry::create(
            EntityType::Budget,
            "bud-12345678",
            Some("Comida".to_string()),
            &json!({}),
        );
        entry.diff_summary = Some("amount: 1 -> 2".to_string());
        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE Budget bud-12345678 (Comida)"));
        assert!(formatted.contains("Changes: amount: 1 -> 2"));
    }
}
