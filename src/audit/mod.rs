//! Audit trail for Billetera
//!
//! Every create, update and delete performed through the services is
//! appended to `audit.log` as one JSON object per line, with snapshots of
//! the entity before and after the change and a short summary of what moved.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
