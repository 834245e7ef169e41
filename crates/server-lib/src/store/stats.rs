//! Aggregate statistics over the ticket table
//!
//! Every aggregate honors the same optional filter set, built once into
//! a single WHERE clause so no endpoint can drift from the others.

use std::collections::HashMap;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::{StoreError, TicketStore};
use crate::models::{CategoryViolation, DashboardStats, MonthlyTrendPoint, StatsFilter};

const LOW_PRIORITY: &str = "4 - Low";
const MEDIUM_PRIORITY: &str = "3 - Medium";
const HIGH_PRIORITY: &str = "2 - High";
const CRITICAL_PRIORITY: &str = "1 - Critical";

/// Categories shown on the violation-rate chart; the rest are cut to
/// keep it readable.
const CATEGORY_LIMIT: u32 = 10;

impl TicketStore {
    /// Headline numbers for the dashboard cards
    pub fn dashboard_stats(&self, filter: &StatsFilter) -> Result<DashboardStats, StoreError> {
        let (where_sql, params) = filter_sql(filter);
        let conn = self.conn()?;

        let total = count(&conn, &format!("SELECT COUNT(*) FROM tickets{where_sql}"), &params)?;
        let violated = count(
            &conn,
            &format!(
                "SELECT COUNT(*) FROM tickets{}",
                append_clause(&where_sql, "is_sla_violated = 1")
            ),
            &params,
        )?;
        let compliance_count = total - violated;
        let compliance_rate = if total > 0 {
            round1(compliance_count as f64 / total as f64 * 100.0)
        } else {
            0.0
        };

        let mut by_priority: HashMap<String, u64> = HashMap::new();
        {
            let sql = format!(
                "SELECT priority, COUNT(*) FROM tickets{where_sql} GROUP BY priority"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(params.iter().cloned()))?;
            while let Some(row) = rows.next()? {
                let priority: String = row.get(0)?;
                let n: i64 = row.get(1)?;
                by_priority.insert(priority, n as u64);
            }
        }

        let avg_duration: Option<f64> = conn.query_row(
            &format!("SELECT AVG(resolution_duration) FROM tickets{where_sql}"),
            params_from_iter(params.iter().cloned()),
            |row| row.get(0),
        )?;
        let avg_compliance: Option<f64> = conn.query_row(
            &format!("SELECT AVG(compliance_rate) FROM tickets{where_sql}"),
            params_from_iter(params.iter().cloned()),
            |row| row.get(0),
        )?;

        Ok(DashboardStats {
            total_tickets: total,
            violation_count: violated,
            compliance_count,
            compliance_rate,
            low_priority_count: by_priority.get(LOW_PRIORITY).copied().unwrap_or(0),
            medium_priority_count: by_priority.get(MEDIUM_PRIORITY).copied().unwrap_or(0),
            high_priority_count: by_priority.get(HIGH_PRIORITY).copied().unwrap_or(0),
            critical_priority_count: by_priority.get(CRITICAL_PRIORITY).copied().unwrap_or(0),
            avg_resolution_duration: round2(avg_duration.unwrap_or(0.0)),
            avg_compliance_rate: round1(avg_compliance.unwrap_or(0.0) * 100.0),
        })
    }

    /// Violation rate per category, top categories by ticket volume
    pub fn violation_by_category(
        &self,
        filter: &StatsFilter,
    ) -> Result<Vec<CategoryViolation>, StoreError> {
        let (where_sql, params) = filter_sql(filter);
        let conn = self.conn()?;
        let sql = format!(
            "SELECT category, COUNT(*) AS total,
                    SUM(CASE WHEN is_sla_violated = 1 THEN 1 ELSE 0 END) AS violated
             FROM tickets{where_sql}
             GROUP BY category
             ORDER BY total DESC, category ASC
             LIMIT {CATEGORY_LIMIT}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let total: i64 = row.get(1)?;
            let violated: i64 = row.get(2)?;
            let violation_rate = if total > 0 {
                round2(violated as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            results.push(CategoryViolation {
                category,
                violation_rate,
                total_tickets: total as u64,
            });
        }
        Ok(results)
    }

    /// Total and violated tickets per calendar month of the open date,
    /// in ascending chronological order
    pub fn monthly_trend(
        &self,
        filter: &StatsFilter,
    ) -> Result<Vec<MonthlyTrendPoint>, StoreError> {
        let (where_sql, params) = filter_sql(filter);
        let conn = self.conn()?;
        let sql = format!(
            "SELECT strftime('%Y-%m', open_date) AS month, COUNT(*),
                    SUM(CASE WHEN is_sla_violated = 1 THEN 1 ELSE 0 END)
             FROM tickets{where_sql}
             GROUP BY month
             ORDER BY month ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let month: String = row.get(0)?;
            let total: i64 = row.get(1)?;
            let violated: i64 = row.get(2)?;
            results.push(MonthlyTrendPoint {
                month,
                total_tickets: total as u64,
                violated_tickets: violated as u64,
            });
        }
        Ok(results)
    }
}

fn filter_sql(filter: &StatsFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    if let Some(priority) = &filter.priority {
        clauses.push("priority = ?");
        params.push(Value::from(priority.clone()));
    }
    if let Some(category) = &filter.category {
        clauses.push("category = ?");
        params.push(Value::from(category.clone()));
    }
    if let Some(violated) = filter.is_sla_violated {
        clauses.push("is_sla_violated = ?");
        params.push(Value::from(i64::from(violated)));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, params)
}

fn append_clause(where_sql: &str, clause: &str) -> String {
    if where_sql.is_empty() {
        format!(" WHERE {clause}")
    } else {
        format!("{where_sql} AND {clause}")
    }
}

fn count(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
    let n: i64 = conn.query_row(sql, params_from_iter(params.iter().cloned()), |row| {
        row.get(0)
    })?;
    Ok(n as u64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
