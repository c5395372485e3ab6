//! Export module for Billetera
//!
//! - CSV: movements with account and category names resolved
//! - JSON: machine-readable export of every entity
//! - YAML: the same export in a human-readable form

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_movements_csv;
pub use json::{export_full_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_full_yaml;
