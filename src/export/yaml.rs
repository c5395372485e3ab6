//! YAML export
//!
//! The same content as the JSON export, with a comment header.

use std::io::Write;

use crate::error::{BilleteraError, BilleteraResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

/// Export the full database to YAML
pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> BilleteraResult<()> {
    let export = FullExport::from_storage(storage)?;
    export.validate().map_err(BilleteraError::Export)?;

    writeln!(writer, "# Billetera full export")?;
    writeln!(writer, "# Generated: {}", export.exported_at)?;
    writeln!(writer, "# App Version: {}", export.app_version)?;
    writeln!(writer)?;

    serde_yaml::to_writer(writer, &export)?;
    Ok(())
}
