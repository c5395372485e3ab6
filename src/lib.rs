//! Billetera - personal finance tracking from the terminal
//!
//! Tracks income, expenses and transfers across peso and dollar accounts,
//! including credit cards with monthly statements and purchases paid in
//! installments.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and user settings
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, movements, budgets, rules, etc.)
//! - `statement`: Credit-card period and installment calculations
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `events`: Change notifications between services and views
//! - `display`: Terminal output formatting
//! - `export`: CSV, JSON and YAML export
//! - `cli`: Command handlers for the `billetera` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use billetera::config::{BilleteraPaths, Settings};
//! use billetera::storage::Storage;
//!
//! let paths = BilleteraPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod currency;
pub mod display;
pub mod error;
pub mod events;
pub mod export;
pub mod models;
pub mod recency;
pub mod services;
pub mod statement;
pub mod storage;

pub use error::{BilleteraError, BilleteraResult};
