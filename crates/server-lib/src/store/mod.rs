//! SQLite-backed ticket store
//!
//! Tickets are written once by the offline import and read-only through
//! the API; the only runtime write is the append-only prediction audit
//! log. A single connection behind a mutex is enough for that profile:
//! every use is a fast indexed read or a single-row append.

mod ingest;
mod stats;

pub use ingest::{ImportSummary, TicketImportRecord};

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use thiserror::Error;

use crate::models::{PredictionLogEntry, Ticket, TicketPage, TicketView, TICKET_TIME_FORMAT};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to read import file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse import file")]
    Parse(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Lock,
}

/// Listing order for the ticket endpoint; newest first unless the
/// caller asks for `open_date` ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn from_param(raw: &str) -> Self {
        match raw {
            "open_date" => SortOrder::OldestFirst,
            _ => SortOrder::NewestFirst,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "open_date DESC",
            SortOrder::OldestFirst => "open_date ASC",
        }
    }
}

/// Parameters of one ticket-listing call
#[derive(Debug, Clone)]
pub struct TicketQuery {
    /// Partial match on the ticket number
    pub search: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub sort: SortOrder,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

pub struct TicketStore {
    conn: Mutex<Connection>,
}

impl TicketStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tickets (
                number TEXT PRIMARY KEY,
                priority TEXT NOT NULL,
                category TEXT NOT NULL,
                item TEXT NOT NULL,
                open_date TEXT NOT NULL,
                closed_date TEXT,
                due_date TEXT NOT NULL,
                time_left_incl_on_hold REAL NOT NULL,
                is_sla_violated INTEGER NOT NULL,
                is_open_date_off TEXT NOT NULL,
                is_due_date_off TEXT NOT NULL,
                days_to_due INTEGER NOT NULL,
                open_month INTEGER NOT NULL,
                creation_day_of_week TEXT NOT NULL,
                creation_hour INTEGER NOT NULL,
                deadline_day_of_week TEXT NOT NULL,
                deadline_hour INTEGER NOT NULL,
                resolution_duration REAL NOT NULL,
                total_tickets_resolved_wc REAL NOT NULL,
                sla_threshold REAL NOT NULL,
                average_resolution_time_ac REAL NOT NULL,
                sla_to_average_resolution_ratio_rc REAL NOT NULL,
                compliance_rate REAL NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tickets_open_date ON tickets(open_date);
            CREATE INDEX IF NOT EXISTS idx_tickets_priority ON tickets(priority);
            CREATE TABLE IF NOT EXISTS prediction_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                requester TEXT,
                input_data TEXT NOT NULL,
                prediction_result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                client_address TEXT
            );",
        )?;
        Ok(())
    }

    /// Insert or replace one ticket (import path only)
    pub fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let conn = self.conn()?;
        insert_into(&conn, ticket)?;
        Ok(())
    }

    /// Bulk insert in one transaction (import path only)
    pub fn insert_tickets(&self, tickets: &[Ticket]) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for ticket in tickets {
            insert_into(&tx, ticket)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn ticket_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn get_ticket(&self, number: &str) -> Result<Option<Ticket>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE number = ?1"))?;
        let mut rows = stmt.query(params![number])?;
        match rows.next()? {
            Some(row) => Ok(Some(ticket_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// One page of tickets plus the total matching count
    pub fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(search) = &query.search {
            clauses.push("number LIKE ?");
            params.push(Value::from(format!("%{search}%")));
        }
        if let Some(priority) = &query.priority {
            clauses.push("priority = ?");
            params.push(Value::from(priority.clone()));
        }
        if let Some(category) = &query.category {
            clauses.push("category = ?");
            params.push(Value::from(category.clone()));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM tickets{where_sql}"),
            params_from_iter(params.iter().cloned()),
            |row| row.get(0),
        )?;

        let page = query.page.max(1);
        let offset = i64::from(page - 1) * i64::from(query.page_size);
        let mut page_params = params;
        page_params.push(Value::from(i64::from(query.page_size)));
        page_params.push(Value::from(offset));

        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets{where_sql} ORDER BY {} LIMIT ? OFFSET ?",
            query.sort.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(page_params))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(TicketView::from(&ticket_from_row(row)?));
        }

        Ok(TicketPage {
            total: total as u64,
            page,
            page_size: query.page_size,
            results,
        })
    }

    /// Append one audit row for a prediction call
    pub fn log_prediction(&self, entry: &PredictionLogEntry) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO prediction_logs
                (requester, input_data, prediction_result, created_at, client_address)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.requester,
                serde_json::to_string(&entry.input)?,
                serde_json::to_string(&entry.result)?,
                Utc::now().naive_utc().format(TICKET_TIME_FORMAT).to_string(),
                entry.client_address,
            ],
        )?;
        Ok(())
    }

    pub fn prediction_log_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM prediction_logs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

const TICKET_COLUMNS: &str = "number, priority, category, item, open_date, closed_date, due_date,
    time_left_incl_on_hold, is_sla_violated, is_open_date_off, is_due_date_off, days_to_due,
    open_month, creation_day_of_week, creation_hour, deadline_day_of_week, deadline_hour,
    resolution_duration, total_tickets_resolved_wc, sla_threshold, average_resolution_time_ac,
    sla_to_average_resolution_ratio_rc, compliance_rate, created_at";

fn insert_into(conn: &Connection, ticket: &Ticket) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO tickets ({TICKET_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
        ),
        params![
            ticket.number,
            ticket.priority,
            ticket.category,
            ticket.item,
            format_dt(ticket.open_date),
            ticket.closed_date.map(format_dt),
            format_dt(ticket.due_date),
            ticket.time_left_incl_on_hold,
            ticket.is_sla_violated,
            ticket.is_open_date_off,
            ticket.is_due_date_off,
            ticket.days_to_due,
            ticket.open_month,
            ticket.creation_day_of_week,
            ticket.creation_hour,
            ticket.deadline_day_of_week,
            ticket.deadline_hour,
            ticket.resolution_duration,
            ticket.total_tickets_resolved_wc,
            ticket.sla_threshold,
            ticket.average_resolution_time_ac,
            ticket.sla_to_average_resolution_ratio_rc,
            ticket.compliance_rate,
            format_dt(ticket.created_at),
        ],
    )?;
    Ok(())
}

fn format_dt(value: NaiveDateTime) -> String {
    value.format(TICKET_TIME_FORMAT).to_string()
}

fn parse_dt(raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TICKET_TIME_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let open_date: String = row.get("open_date")?;
    let closed_date: Option<String> = row.get("closed_date")?;
    let due_date: String = row.get("due_date")?;
    let created_at: String = row.get("created_at")?;

    Ok(Ticket {
        number: row.get("number")?,
        priority: row.get("priority")?,
        category: row.get("category")?,
        item: row.get("item")?,
        open_date: parse_dt(&open_date)?,
        closed_date: closed_date.as_deref().map(parse_dt).transpose()?,
        due_date: parse_dt(&due_date)?,
        time_left_incl_on_hold: row.get("time_left_incl_on_hold")?,
        is_sla_violated: row.get("is_sla_violated")?,
        is_open_date_off: row.get("is_open_date_off")?,
        is_due_date_off: row.get("is_due_date_off")?,
        days_to_due: row.get("days_to_due")?,
        open_month: row.get("open_month")?,
        creation_day_of_week: row.get("creation_day_of_week")?,
        creation_hour: row.get("creation_hour")?,
        deadline_day_of_week: row.get("deadline_day_of_week")?,
        deadline_hour: row.get("deadline_hour")?,
        resolution_duration: row.get("resolution_duration")?,
        total_tickets_resolved_wc: row.get("total_tickets_resolved_wc")?,
        sla_threshold: row.get("sla_threshold")?,
        average_resolution_time_ac: row.get("average_resolution_time_ac")?,
        sla_to_average_resolution_ratio_rc: row.get("sla_to_average_resolution_ratio_rc")?,
        compliance_rate: row.get("compliance_rate")?,
        created_at: parse_dt(&created_at)?,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::ticket;
    use super::*;

    fn seeded() -> TicketStore {
        let store = TicketStore::open_in_memory().unwrap();
        store
            .insert_tickets(&[
                ticket("3226220", "3 - Medium", "hardware", "2024-01-01 09:00:00", true),
                ticket("3226221", "4 - Low", "transaction", "2024-02-10 14:00:00", false),
                ticket("3226222", "3 - Medium", "hardware", "2024-02-15 08:00:00", false),
                ticket("4000001", "1 - Critical", "cannot access", "2024-03-01 10:00:00", true),
            ])
            .unwrap();
        store
    }

    fn query() -> TicketQuery {
        TicketQuery {
            search: None,
            priority: None,
            category: None,
            sort: SortOrder::default(),
            page: 1,
            page_size: 10,
        }
    }

    #[test]
    fn round_trips_tickets() {
        let store = seeded();
        let loaded = store.get_ticket("3226220").unwrap().unwrap();
        assert_eq!(loaded.priority, "3 - Medium");
        assert!(loaded.is_sla_violated);
        assert_eq!(loaded.open_date.format(TICKET_TIME_FORMAT).to_string(), "2024-01-01 09:00:00");
        assert!(loaded.closed_date.is_some());
        assert!(store.get_ticket("does-not-exist").unwrap().is_none());
    }

    #[test]
    fn lists_newest_first_by_default() {
        let store = seeded();
        let page = store.list_tickets(&query()).unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.results[0].number, "4000001");
        assert_eq!(page.results[3].number, "3226220");
    }

    #[test]
    fn lists_oldest_first_when_asked() {
        let store = seeded();
        let mut q = query();
        q.sort = SortOrder::from_param("open_date");
        let page = store.list_tickets(&q).unwrap();
        assert_eq!(page.results[0].number, "3226220");
    }

    #[test]
    fn paginates_with_stable_totals() {
        let store = seeded();
        let mut q = query();
        q.page_size = 3;
        let first = store.list_tickets(&q).unwrap();
        assert_eq!(first.total, 4);
        assert_eq!(first.results.len(), 3);

        q.page = 2;
        let second = store.list_tickets(&q).unwrap();
        assert_eq!(second.total, 4);
        assert_eq!(second.results.len(), 1);
    }

    #[test]
    fn searches_by_partial_number() {
        let store = seeded();
        let mut q = query();
        q.search = Some("32262".to_string());
        let page = store.list_tickets(&q).unwrap();
        assert_eq!(page.total, 3);
    }

    #[test]
    fn filters_combine() {
        let store = seeded();
        let mut q = query();
        q.priority = Some("3 - Medium".to_string());
        q.category = Some("hardware".to_string());
        let page = store.list_tickets(&q).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn reimport_replaces_instead_of_duplicating() {
        let store = seeded();
        store
            .insert_ticket(&ticket("3226220", "4 - Low", "hardware", "2024-01-01 09:00:00", true))
            .unwrap();
        assert_eq!(store.ticket_count().unwrap(), 4);
        let loaded = store.get_ticket("3226220").unwrap().unwrap();
        assert_eq!(loaded.priority, "4 - Low");
    }

    #[test]
    fn appends_prediction_logs() {
        let store = seeded();
        store
            .log_prediction(&PredictionLogEntry {
                requester: None,
                input: serde_json::json!({"category": "hardware"}),
                result: serde_json::json!({"sla_violated": true}),
                client_address: Some("127.0.0.1".to_string()),
            })
            .unwrap();
        assert_eq!(store.prediction_log_count().unwrap(), 1);
    }
}
