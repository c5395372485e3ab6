//! Movement repository for JSON storage
//!
//! Manages loading and saving movements to movements.json, with indexes by
//! account (both sides of a transfer) and by installment group.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::BilleteraError;
use crate::models::{AccountId, InstallmentGroupId, Movement, MovementId, RecurringId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MovementData {
    movements: Vec<Movement>,
}

#[derive(Default)]
struct Indexes {
    by_account: HashMap<AccountId, Vec<MovementId>>,
    by_group: HashMap<InstallmentGroupId, Vec<MovementId>>,
}

impl Indexes {
    fn insert(&mut self, movement: &Movement) {
        self.by_account
            .entry(movement.account_id)
            .or_default()
            .push(movement.id);
        if let Some(dest) = movement.destination_account_id {
            self.by_account.entry(dest).or_default().push(movement.id);
        }
        if let Some(group) = movement.installment_group {
            self.by_group.entry(group).or_default().push(movement.id);
        }
    }

    fn remove(&mut self, movement: &Movement) {
        let id = movement.id;
        for account in [Some(movement.account_id), movement.destination_account_id]
            .into_iter()
            .flatten()
        {
            if let Some(ids) = self.by_account.get_mut(&account) {
                ids.retain(|&m| m != id);
            }
        }
        if let Some(group) = movement.installment_group {
            if let Some(ids) = self.by_group.get_mut(&group) {
                ids.retain(|&m| m != id);
            }
        }
    }
}

/// Repository for movement persistence with indexing
pub struct MovementRepository {
    path: PathBuf,
    data: RwLock<HashMap<MovementId, Movement>>,
    indexes: RwLock<Indexes>,
}

/// Newest first, then latest created first
fn sort_newest_first(movements: &mut [Movement]) {
    movements.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

impl MovementRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            indexes: RwLock::new(Indexes::default()),
        }
    }

    /// Load movements from disk and build indexes
    pub fn load(&self) -> Result<(), BilleteraError> {
        let file_data: MovementData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut indexes = self.indexes.write().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        *indexes = Indexes::default();

        for movement in file_data.movements {
            indexes.insert(&movement);
            data.insert(movement.id, movement);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), BilleteraError> {
        let mut movements = self.get_all()?;
        sort_newest_first(&mut movements);
        write_json_atomic(&self.path, &MovementData { movements })
    }

    pub fn get(&self, id: MovementId) -> Result<Option<Movement>, BilleteraError> {
        let data = self.data.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// All movements, newest first
    pub fn get_all(&self) -> Result<Vec<Movement>, BilleteraError> {
        let data = self.data.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut movements: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut movements);
        Ok(movements)
    }

    fn get_indexed<F>(&self, lookup: F) -> Result<Vec<Movement>, BilleteraError>
    where
        F: Fn(&Indexes) -> Option<Vec<MovementId>>,
    {
        let data = self.data.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let indexes = self.indexes.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = lookup(&indexes).unwrap_or_default();
        let mut movements: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        sort_newest_first(&mut movements);
        Ok(movements)
    }

    /// Movements touching an account on either side
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Movement>, BilleteraError> {
        self.get_indexed(|idx| idx.by_account.get(&account_id).cloned())
    }

    /// Installments of one purchase, in installment order
    pub fn get_by_group(&self, group: InstallmentGroupId) -> Result<Vec<Movement>, BilleteraError> {
        let mut movements = self.get_indexed(|idx| idx.by_group.get(&group).cloned())?;
        movements.sort_by_key(|m| m.installment.map(|i| i.number).unwrap_or(0));
        Ok(movements)
    }

    /// Movements matching `predicate`, newest first
    pub fn filter<F>(&self, predicate: F) -> Result<Vec<Movement>, BilleteraError>
    where
        F: Fn(&Movement) -> bool,
    {
        let data = self.data.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut movements: Vec<_> = data.values().filter(|m| predicate(m)).cloned().collect();
        sort_newest_first(&mut movements);
        Ok(movements)
    }

    pub fn get_by_recurring(&self, recurring_id: RecurringId) -> Result<Vec<Movement>, BilleteraError> {
        self.filter(|m| m.recurring_id == Some(recurring_id))
    }

    /// Movements dated within `[start, end]`
    pub fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, BilleteraError> {
        self.filter(|m| m.date >= start && m.date <= end)
    }

    /// Resolve a user reference (short ID or UUID prefix)
    pub fn find_by_ref(&self, reference: &str) -> Result<Option<Movement>, BilleteraError> {
        let data = self.data.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut matches = data.values().filter(|m| m.id.matches_ref(reference));
        match (matches.next(), matches.next()) {
            (Some(m), None) => Ok(Some(m.clone())),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(BilleteraError::Validation(format!(
                "Reference '{}' is ambiguous; use more characters",
                reference
            ))),
        }
    }

    /// Insert or update a movement
    pub fn upsert(&self, movement: Movement) -> Result<(), BilleteraError> {
        let mut data = self.data.write().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut indexes = self.indexes.write().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(old) = data.get(&movement.id) {
            indexes.remove(old);
        }
        indexes.insert(&movement);
        data.insert(movement.id, movement);
        Ok(())
    }

    pub fn delete(&self, id: MovementId) -> Result<Option<Movement>, BilleteraError> {
        let mut data = self.data.write().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut indexes = self.indexes.write().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let removed = data.remove(&id);
        if let Some(movement) = &removed {
            indexes.remove(movement);
        }
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize, BilleteraError> {
        let data = self.data.read().map_err(|e| {
            BilleteraError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
