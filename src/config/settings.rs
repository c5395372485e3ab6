//! User settings for Billetera
//!
//! Persists the display currency, the static exchange-rate table, per-list
//! sort preferences and the recently used accounts/categories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::paths::BilleteraPaths;
use crate::currency::ExchangeRates;
use crate::error::BilleteraError;
use crate::models::{AccountId, CategoryId, Currency};

/// Maximum number of entries kept in each recency list
pub const RECENT_LIMIT: usize = 10;

/// Field a movement list is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Persisted sort preference for one list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SortPreference {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortPreference {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parse "date", "date:asc", "amount:desc"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let (field, direction) = match s.split_once(':') {
            Some((f, d)) => (f.to_string(), Some(d.to_string())),
            None => (s, None),
        };

        let field = match field.as_str() {
            "date" => SortField::Date,
            "amount" => SortField::Amount,
            _ => return None,
        };

        let direction = match direction.as_deref() {
            None | Some("desc") => SortDirection::Desc,
            Some("asc") => SortDirection::Asc,
            Some(_) => return None,
        };

        Some(Self { field, direction })
    }
}

/// User settings for Billetera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency totals are converted into for display
    #[serde(default)]
    pub display_currency: Currency,

    /// Static rate table used for conversions
    #[serde(default)]
    pub exchange_rates: ExchangeRates,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Sort preference per list key (e.g. "movements")
    #[serde(default)]
    pub sort_preferences: BTreeMap<String, SortPreference>,

    /// Most recently used accounts, newest first
    #[serde(default)]
    pub recent_accounts: Vec<AccountId>,

    /// Most recently used categories, newest first
    #[serde(default)]
    pub recent_categories: Vec<CategoryId>,

    /// Upper bound for installments on a single purchase
    #[serde(default = "default_max_installments")]
    pub max_installments: u32,
}

fn default_schema_version() -> u32 {
    1
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

fn default_max_installments() -> u32 {
    48
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            display_currency: Currency::default(),
            exchange_rates: ExchangeRates::default(),
            date_format: default_date_format(),
            sort_preferences: BTreeMap::new(),
            recent_accounts: Vec::new(),
            recent_categories: Vec::new(),
            max_installments: default_max_installments(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &BilleteraPaths) -> Result<Self, BilleteraError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                BilleteraError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BilleteraError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            if !settings.exchange_rates.is_valid() {
                return Err(BilleteraError::Config(format!(
                    "Invalid exchange rate in {}: ars_per_usd must be a positive number, got {}",
                    settings_path.display(),
                    settings.exchange_rates.ars_per_usd
                )));
            }

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BilleteraPaths) -> Result<(), BilleteraError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            BilleteraError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BilleteraError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Sort preference for a list, falling back to date descending
    pub fn sort_preference(&self, list_key: &str) -> SortPreference {
        self.sort_preferences
            .get(list_key)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_sort_preference(&mut self, list_key: impl Into<String>, pref: SortPreference) {
        self.sort_preferences.insert(list_key.into(), pref);
    }

    /// Move an account to the front of the recency list
    pub fn touch_recent_account(&mut self, id: AccountId) {
        push_recent(&mut self.recent_accounts, id);
    }

    /// Move a category to the front of the recency list
    pub fn touch_recent_category(&mut self, id: CategoryId) {
        push_recent(&mut self.recent_categories, id);
    }
}

fn push_recent<T: PartialEq>(list: &mut Vec<T>, id: T) {
    list.retain(|existing| *existing != id);
    list.insert(0, id);
    list.truncate(RECENT_LIMIT);
}
