//! Offline bulk import of the preprocessed ticket export
//!
//! Reads the JSON array the training notebook exports after feature
//! engineering and loads it into the ticket table. Rows that fail to
//! parse are skipped and reported, never fatal; the import is the only
//! write path for tickets.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::{StoreError, TicketStore};
use crate::models::{Ticket, TICKET_TIME_FORMAT};

/// One row of the notebook's export, keyed by the original column names
#[derive(Debug, Clone, Deserialize)]
pub struct TicketImportRecord {
    #[serde(rename = "Number")]
    pub number: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Open Date")]
    pub open_date: String,
    #[serde(rename = "Closed Date", default)]
    pub closed_date: Option<String>,
    #[serde(rename = "Due Date")]
    pub due_date: String,
    #[serde(rename = "Time Left Incl. On Hold")]
    pub time_left_incl_on_hold: f64,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Is SLA Violated")]
    pub is_sla_violated: u8,
    #[serde(rename = "Is Open Date Off")]
    pub is_open_date_off: String,
    #[serde(rename = "Is Due Date Off")]
    pub is_due_date_off: String,
    #[serde(rename = "Days to Due")]
    pub days_to_due: i64,
    #[serde(rename = "Open Month")]
    pub open_month: u32,
    #[serde(rename = "Application Creation Day of Week")]
    pub creation_day_of_week: String,
    #[serde(rename = "Application Creation Hour")]
    pub creation_hour: u32,
    #[serde(rename = "Application SLA Deadline Day of Week")]
    pub deadline_day_of_week: String,
    #[serde(rename = "Application SLA Deadline Hour")]
    pub deadline_hour: u32,
    #[serde(rename = "Resolution Duration")]
    pub resolution_duration: f64,
    #[serde(rename = "Total Tickets Resolved (Wc)")]
    pub total_tickets_resolved_wc: f64,
    #[serde(rename = "SLA Threshold")]
    pub sla_threshold: f64,
    #[serde(rename = "Average Resolution Time (Ac)")]
    pub average_resolution_time_ac: f64,
    #[serde(rename = "SLA to Average Resolution Ratio (Rc)")]
    pub sla_to_average_resolution_ratio_rc: f64,
    #[serde(rename = "Application SLA Compliance Rate")]
    pub compliance_rate: f64,
}

impl TicketImportRecord {
    fn into_ticket(self, imported_at: NaiveDateTime) -> anyhow::Result<Ticket> {
        let open_date = parse_export_dt(&self.open_date).context("Open Date")?;
        let due_date = parse_export_dt(&self.due_date).context("Due Date")?;
        let closed_date = self
            .closed_date
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_export_dt(&raw).context("Closed Date"))
            .transpose()?;

        Ok(Ticket {
            number: self.number,
            priority: self.priority,
            category: self.category,
            item: self.item,
            open_date,
            closed_date,
            due_date,
            time_left_incl_on_hold: self.time_left_incl_on_hold,
            is_sla_violated: self.is_sla_violated != 0,
            is_open_date_off: self.is_open_date_off,
            is_due_date_off: self.is_due_date_off,
            days_to_due: self.days_to_due,
            open_month: self.open_month,
            creation_day_of_week: self.creation_day_of_week,
            creation_hour: self.creation_hour,
            deadline_day_of_week: self.deadline_day_of_week,
            deadline_hour: self.deadline_hour,
            resolution_duration: self.resolution_duration,
            total_tickets_resolved_wc: self.total_tickets_resolved_wc,
            sla_threshold: self.sla_threshold,
            average_resolution_time_ac: self.average_resolution_time_ac,
            sla_to_average_resolution_ratio_rc: self.sla_to_average_resolution_ratio_rc,
            compliance_rate: self.compliance_rate,
            created_at: imported_at,
        })
    }
}

fn parse_export_dt(raw: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TICKET_TIME_FORMAT)
        .with_context(|| format!("timestamp {raw:?} is not {TICKET_TIME_FORMAT}"))
}

/// Result of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

impl TicketStore {
    /// Load the JSON ticket export at `path` in one transaction
    pub fn import_json_file(&self, path: &Path) -> Result<ImportSummary, StoreError> {
        let content = fs::read_to_string(path)?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&content)?;

        let imported_at = Utc::now().naive_utc();
        let mut tickets = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for (index, raw) in rows.into_iter().enumerate() {
            let number = raw
                .get("Number")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let parsed = serde_json::from_value::<TicketImportRecord>(raw)
                .map_err(anyhow::Error::from)
                .and_then(|record| record.into_ticket(imported_at));
            match parsed {
                Ok(ticket) => tickets.push(ticket),
                Err(error) => {
                    warn!(row = index, number = %number, error = %format!("{error:#}"),
                        "skipping unparseable ticket row");
                    skipped += 1;
                }
            }
        }

        self.insert_tickets(&tickets)?;
        info!(imported = tickets.len(), skipped, "ticket import finished");
        Ok(ImportSummary {
            imported: tickets.len(),
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn export_row(number: &str) -> serde_json::Value {
        serde_json::json!({
            "Number": number,
            "Priority": "3 - Medium",
            "Category": "hardware",
            "Open Date": "2024-01-01 09:00:00",
            "Closed Date": "2024-01-03 17:30:00",
            "Due Date": "2024-01-03 17:00:00",
            "Time Left Incl. On Hold": -0.02,
            "Item": "application 84",
            "Is SLA Violated": 1,
            "Is Open Date Off": "Workday",
            "Is Due Date Off": "Workday",
            "Days to Due": 2,
            "Open Month": 1,
            "Application Creation Day of Week": "Monday",
            "Application Creation Hour": 9,
            "Application SLA Deadline Day of Week": "Wednesday",
            "Application SLA Deadline Hour": 17,
            "Resolution Duration": 2.725,
            "Total Tickets Resolved (Wc)": 120.0,
            "SLA Threshold": 3.0,
            "Average Resolution Time (Ac)": 2.1,
            "SLA to Average Resolution Ratio (Rc)": 1.43,
            "Application SLA Compliance Rate": 0.874
        })
    }

    fn write_export(rows: &[serde_json::Value]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(rows).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn imports_every_valid_row() {
        let store = TicketStore::open_in_memory().unwrap();
        let file = write_export(&[export_row("1"), export_row("2")]);

        let summary = store.import_json_file(file.path()).unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 0 });
        assert_eq!(store.ticket_count().unwrap(), 2);

        let ticket = store.get_ticket("1").unwrap().unwrap();
        assert!(ticket.is_sla_violated);
        assert_eq!(ticket.open_month, 1);
        assert!(ticket.closed_date.is_some());
    }

    #[test]
    fn skips_malformed_rows_and_keeps_the_rest() {
        let store = TicketStore::open_in_memory().unwrap();
        let mut bad_date = export_row("2");
        bad_date["Open Date"] = serde_json::json!("01/02/2024");
        let mut missing_field = export_row("3");
        missing_field.as_object_mut().unwrap().remove("Priority");

        let file = write_export(&[export_row("1"), bad_date, missing_field]);
        let summary = store.import_json_file(file.path()).unwrap();
        assert_eq!(summary, ImportSummary { imported: 1, skipped: 2 });
        assert_eq!(store.ticket_count().unwrap(), 1);
    }

    #[test]
    fn empty_closed_date_becomes_none() {
        let store = TicketStore::open_in_memory().unwrap();
        let mut open_ticket = export_row("1");
        open_ticket["Closed Date"] = serde_json::json!("");
        let file = write_export(&[open_ticket]);

        store.import_json_file(file.path()).unwrap();
        let ticket = store.get_ticket("1").unwrap().unwrap();
        assert!(ticket.closed_date.is_none());
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let store = TicketStore::open_in_memory().unwrap();
        let err = store
            .import_json_file(Path::new("/no/such/export.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
