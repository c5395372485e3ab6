//! Configuration module for Billetera
//!
//! This module provides configuration management including:
//! - Platform path resolution
//! - User settings persistence (display currency, rates, sort preferences)

pub mod paths;
pub mod settings;

pub use paths::BilleteraPaths;
pub use settings::{Settings, SortDirection, SortField, SortPreference};
