//! Generic JSON-file repository
//!
//! Each entity file holds a single object with one array, e.g.
//! `{ "accounts": [ ... ] }`. The repository keeps the entities in memory
//! behind an `RwLock` and rewrites the whole file on save.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::BilleteraError;
use crate::models::{
    Account, AccountId, AutoRule, Budget, BudgetId, Category, CategoryId, Goal, GoalId,
    RecurringId, RecurringTransaction, RuleId, ScheduledId, ScheduledTransaction,
    StatementPayment, StatementPaymentId,
};

use super::file_io::{read_json, write_json_atomic};

/// An entity stored by a [`JsonRepository`]
pub trait Record: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + Hash + Display;

    /// Name of the array inside the JSON file
    const COLLECTION: &'static str;

    fn id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;

    /// Whether a user-typed reference (short id or full UUID) points here
    fn matches_ref(&self, reference: &str) -> bool;

    /// Name used for lookups by name, if the entity has one
    fn name(&self) -> Option<&str> {
        None
    }
}

macro_rules! impl_record {
    (@base $type:ty, $id:ty, $collection:literal; $($extra:tt)*) => {
        impl Record for $type {
            type Id = $id;
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> $id {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn matches_ref(&self, reference: &str) -> bool {
                self.id.matches_ref(reference)
            }

            $($extra)*
        }
    };
    ($type:ty, $id:ty, $collection:literal) => {
        impl_record!(@base $type, $id, $collection;);
    };
    ($type:ty, $id:ty, $collection:literal, named) => {
        impl_record!(@base $type, $id, $collection;
            fn name(&self) -> Option<&str> {
                Some(&self.name)
            }
        );
    };
}

impl_record!(Account, AccountId, "accounts", named);
impl_record!(Category, CategoryId, "categories", named);
impl_record!(Budget, BudgetId, "budgets", named);
impl_record!(Goal, GoalId, "goals", named);
impl_record!(RecurringTransaction, RecurringId, "recurring", named);
impl_record!(AutoRule, RuleId, "rules", named);
impl_record!(ScheduledTransaction, ScheduledId, "scheduled");
impl_record!(StatementPayment, StatementPaymentId, "statement_payments");

/// In-memory map of entities persisted to one JSON file
pub struct JsonRepository<T: Record> {
    path: PathBuf,
    data: RwLock<HashMap<T::Id, T>>,
}

impl<T: Record> JsonRepository<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<T::Id, T>>, BilleteraError> {
        self.data
            .read()
            .map_err(|e| BilleteraError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<T::Id, T>>, BilleteraError> {
        self.data
            .write()
            .map_err(|e| BilleteraError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load from disk, replacing whatever is in memory
    pub fn load(&self) -> Result<(), BilleteraError> {
        let file: Value = read_json(&self.path)?;
        let items: Vec<T> = match file {
            Value::Null => Vec::new(),
            Value::Object(mut obj) => match obj.remove(T::COLLECTION) {
                Some(list) => serde_json::from_value(list).map_err(|e| {
                    BilleteraError::Storage(format!(
                        "Failed to parse {}: {}",
                        self.path.display(),
                        e
                    ))
                })?,
                None => Vec::new(),
            },
            _ => {
                return Err(BilleteraError::Storage(format!(
                    "Unexpected content in {}",
                    self.path.display()
                )))
            }
        };

        let mut data = self.write()?;
        data.clear();
        for item in items {
            data.insert(item.id(), item);
        }
        Ok(())
    }

    /// Save to disk in creation order
    pub fn save(&self) -> Result<(), BilleteraError> {
        let items = self.get_all()?;
        let mut file = Map::new();
        file.insert(T::COLLECTION.to_string(), serde_json::to_value(items)?);
        write_json_atomic(&self.path, &Value::Object(file))
    }

    pub fn get(&self, id: T::Id) -> Result<Option<T>, BilleteraError> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// All entities, oldest first
    pub fn get_all(&self) -> Result<Vec<T>, BilleteraError> {
        let mut items: Vec<T> = self.read()?.values().cloned().collect();
        items.sort_by_key(|item| item.created_at());
        Ok(items)
    }

    /// Entities matching a predicate, oldest first
    pub fn filter<F>(&self, predicate: F) -> Result<Vec<T>, BilleteraError>
    where
        F: Fn(&T) -> bool,
    {
        let mut items: Vec<T> = self
            .read()?
            .values()
            .filter(|item| predicate(item))
            .cloned()
            .collect();
        items.sort_by_key(|item| item.created_at());
        Ok(items)
    }

    pub fn upsert(&self, item: T) -> Result<(), BilleteraError> {
        self.write()?.insert(item.id(), item);
        Ok(())
    }

    pub fn delete(&self, id: T::Id) -> Result<Option<T>, BilleteraError> {
        Ok(self.write()?.remove(&id))
    }

    pub fn count(&self) -> Result<usize, BilleteraError> {
        Ok(self.read()?.len())
    }

    /// Case-insensitive name lookup
    pub fn get_by_name(&self, name: &str) -> Result<Option<T>, BilleteraError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .read()?
            .values()
            .find(|item| item.name().is_some_and(|n| n.to_lowercase() == wanted))
            .cloned())
    }

    /// Whether another entity already uses this name
    pub fn name_exists(&self, name: &str, exclude: Option<T::Id>) -> Result<bool, BilleteraError> {
        Ok(self
            .get_by_name(name)?
            .is_some_and(|item| Some(item.id()) != exclude))
    }

    /// Resolve a user reference: exact name first, then a unique ID prefix
    pub fn find_by_ref(&self, reference: &str) -> Result<Option<T>, BilleteraError> {
        if let Some(item) = self.get_by_name(reference)? {
            return Ok(Some(item));
        }

        let data = self.read()?;
        let mut matches = data.values().filter(|item| item.matches_ref(reference));
        match (matches.next(), matches.next()) {
            (Some(item), None) => Ok(Some(item.clone())),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(BilleteraError::Validation(format!(
                "Reference '{}' is ambiguous; use more characters",
                reference
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Money, Scope};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, JsonRepository<Budget>) {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonRepository::new(temp_dir.path().join("budgets.json"));
        (temp_dir, repo)
    }

    fn budget(name: &str) -> Budget {
        Budget::new(name, Money::from_cents(100_000), Currency::Ars, Scope::Global)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let first = budget("Comida");
        let id = first.id;
        repo.upsert(first).unwrap();
        repo.upsert(budget("Salidas")).unwrap();
        repo.save().unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join("budgets.json")).unwrap())
                .unwrap();
        assert_eq!(raw["budgets"].as_array().unwrap().len(), 2);

        let reloaded: JsonRepository<Budget> = JsonRepository::new(temp_dir.path().join("budgets.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 2);
        assert_eq!(reloaded.get(id).unwrap().unwrap().name, "Comida");
    }

    #[test]
    fn test_find_by_ref() {
        let (_temp_dir, repo) = create_test_repo();
        let item = budget("Comida");
        let id = item.id;
        repo.upsert(item).unwrap();

        assert_eq!(repo.find_by_ref("comida").unwrap().unwrap().id, id);
        assert_eq!(repo.find_by_ref(&id.to_string()).unwrap().unwrap().id, id);
        assert!(repo.find_by_ref("nothing").unwrap().is_none());
    }

    #[test]
    fn test_name_exists_excludes_self() {
        let (_temp_dir, repo) = create_test_repo();
        let item = budget("Comida");
        let id = item.id;
        repo.upsert(item).unwrap();

        assert!(repo.name_exists("COMIDA", None).unwrap());
        assert!(!repo.name_exists("Comida", Some(id)).unwrap());
    }

    #[test]
    fn test_delete_returns_removed() {
        let (_temp_dir, repo) = create_test_repo();
        let item = budget("Comida");
        let id = item.id;
        repo.upsert(item).unwrap();

        assert!(repo.delete(id).unwrap().is_some());
        assert!(repo.delete(id).unwrap().is_none());
    }
}
