//! Audit log CLI command

use clap::Args;

use crate::audit::EntityType;
use crate::error::{BilleteraError, BilleteraResult};
use crate::storage::Storage;

#[derive(Args)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
    /// Only entries for one entity type (account, movement, rule, ...)
    #[arg(short, long)]
    pub entity: Option<String>,
}

pub fn handle_audit_command(storage: &Storage, args: AuditArgs) -> BilleteraResult<()> {
    let entity = args
        .entity
        .map(|e| {
            EntityType::parse(&e)
                .ok_or_else(|| BilleteraError::Validation(format!("Unknown entity type: '{}'", e)))
        })
        .transpose()?;

    let entries = storage.audit().read_recent(args.limit, entity)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in entries.iter().rev() {
        println!("{}", entry.format_human_readable());
    }

    Ok(())
}
