//! Path management for Billetera
//!
//! ## Path Resolution Order
//!
//! 1. `BILLETERA_DATA_DIR` environment variable (if set)
//! 2. The platform config directory reported by `directories`
//!    (`~/.config/billetera` on Linux, `~/Library/Application Support/ar.billetera.billetera`
//!    on macOS, `%APPDATA%\billetera\billetera\config` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BilleteraError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "BILLETERA_DATA_DIR";

/// Manages all paths used by Billetera
#[derive(Debug, Clone)]
pub struct BilleteraPaths {
    base_dir: PathBuf,
}

impl BilleteraPaths {
    /// Resolve the base directory from the environment or the platform defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BilleteraError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.data_dir().join("accounts.json")
    }

    pub fn categories_file(&self) -> PathBuf {
        self.data_dir().join("categories.json")
    }

    pub fn movements_file(&self) -> PathBuf {
        self.data_dir().join("movements.json")
    }

    pub fn budgets_file(&self) -> PathBuf {
        self.data_dir().join("budgets.json")
    }

    pub fn goals_file(&self) -> PathBuf {
        self.data_dir().join("goals.json")
    }

    pub fn recurring_file(&self) -> PathBuf {
        self.data_dir().join("recurring.json")
    }

    pub fn scheduled_file(&self) -> PathBuf {
        self.data_dir().join("scheduled.json")
    }

    pub fn rules_file(&self) -> PathBuf {
        self.data_dir().join("rules.json")
    }

    pub fn statement_payments_file(&self) -> PathBuf {
        self.data_dir().join("statement_payments.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), BilleteraError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BilleteraError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| BilleteraError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if Billetera has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, BilleteraError> {
    ProjectDirs::from("ar", "billetera", "billetera")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| BilleteraError::Config("Could not determine home directory".into()))
}
