//! Offline bulk import of the ticket export
//!
//! Writes straight into the SQLite database; the server never mutates
//! tickets at runtime.

use std::path::Path;

use anyhow::{Context, Result};
use server_lib::TicketStore;

use crate::output::{print_success, print_warning};

pub fn import_tickets(file: &Path, database: &Path) -> Result<()> {
    let store = TicketStore::open(database).context("Failed to open ticket database")?;
    let summary = store
        .import_json_file(file)
        .context("Ticket import failed")?;

    print_success(&format!(
        "Imported {} tickets into {}",
        summary.imported,
        database.display()
    ));
    if summary.skipped > 0 {
        print_warning(&format!(
            "{} rows were skipped as unparseable",
            summary.skipped
        ));
    }
    Ok(())
}
