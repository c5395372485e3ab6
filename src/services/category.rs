//! Category service
//!
//! Category CRUD, archiving and picker ordering.

use chrono::Utc;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::events::Topic;
use crate::models::{Category, CategoryId, CategoryKind};
use crate::recency::sort_by_recency;
use crate::storage::Storage;

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, name: &str, kind: CategoryKind, icon: Option<&str>) -> BilleteraResult<Category> {
        let name = name.trim();
        if self.storage.categories.name_exists(name, None)? {
            return Err(BilleteraError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }

        let category = Category::with_icon(name, kind, icon.unwrap_or_default().trim());
        category
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_create(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;
        self.storage.events().emit(Topic::Categories);
        info!(category = %category.id, name = %category.name, "category created");

        Ok(category)
    }

    pub fn get(&self, id: CategoryId) -> BilleteraResult<Option<Category>> {
        self.storage.categories.get(id)
    }

    pub fn find(&self, reference: &str) -> BilleteraResult<Option<Category>> {
        self.storage.categories.find_by_ref(reference)
    }

    pub fn resolve(&self, reference: &str) -> BilleteraResult<Category> {
        self.find(reference)?
            .ok_or_else(|| BilleteraError::category_not_found(reference))
    }

    /// Categories sorted by kind then name, optionally restricted to one kind
    pub fn list(&self, kind: Option<CategoryKind>, include_archived: bool) -> BilleteraResult<Vec<Category>> {
        let mut categories = self.storage.categories.filter(|c| {
            (include_archived || !c.archived) && kind.map_or(true, |k| c.kind == k)
        })?;
        categories.sort_by(|a, b| {
            (a.kind == CategoryKind::Expense)
                .cmp(&(b.kind == CategoryKind::Expense))
                .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(categories)
    }

    /// Active categories of one kind with recently used ones first
    pub fn list_for_picker(&self, kind: CategoryKind, recent: &[CategoryId]) -> BilleteraResult<Vec<Category>> {
        Ok(sort_by_recency(self.list(Some(kind), false)?, recent, |c| c.id))
    }

    pub fn update(&self, id: CategoryId, patch: CategoryPatch) -> BilleteraResult<Category> {
        let mut category = self
            .storage
            .categories
            .get(id)?
            .ok_or_else(|| BilleteraError::category_not_found(id.to_string()))?;
        let before = category.clone();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if self.storage.categories.name_exists(&name, Some(id))? {
                return Err(BilleteraError::Duplicate {
                    entity_type: "Category",
                    identifier: name,
                });
            }
            category.name = name;
        }
        if let Some(icon) = patch.icon {
            category.icon = icon.trim().to_string();
        }

        category
            .validate()
            .map_err(|e| BilleteraError::Validation(e.to_string()))?;
        category.updated_at = Utc::now();

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;
        self.storage.events().emit(Topic::Categories);

        Ok(category)
    }

    pub fn set_archived(&self, id: CategoryId, archived: bool) -> BilleteraResult<Category> {
        let mut category = self
            .storage
            .categories
            .get(id)?
            .ok_or_else(|| BilleteraError::category_not_found(id.to_string()))?;
        let before = category.clone();
        category.archived = archived;
        category.updated_at = Utc::now();

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;
        self.storage.events().emit(Topic::Categories);

        Ok(category)
    }

    /// Delete a category no movement uses
    pub fn delete(&self, id: CategoryId) -> BilleteraResult<Category> {
        let category = self
            .storage
            .categories
            .get(id)?
            .ok_or_else(|| BilleteraError::category_not_found(id.to_string()))?;

        let in_use = self
            .storage
            .movements
            .get_all()?
            .iter()
            .filter(|m| m.category_id == Some(id))
            .count();
        if in_use > 0 {
            return Err(BilleteraError::InvalidState(format!(
                "Category '{}' is used by {} movement(s); archive it instead",
                category.name, in_use
            )));
        }

        self.storage.categories.delete(id)?;
        self.storage.categories.save()?;

        self.storage.log_delete(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;
        self.storage.events().emit(Topic::Categories);
        info!(category = %category.id, "category deleted");

        Ok(category)
    }
}
