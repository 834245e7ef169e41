//! Core data models for the SLA dashboard

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used for tickets at rest and over the API
pub const TICKET_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A ticket record, immutable after the offline import
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub number: String,
    pub priority: String,
    pub category: String,
    pub item: String,
    pub open_date: NaiveDateTime,
    pub closed_date: Option<NaiveDateTime>,
    pub due_date: NaiveDateTime,
    pub time_left_incl_on_hold: f64,
    pub is_sla_violated: bool,
    pub is_open_date_off: String,
    pub is_due_date_off: String,
    pub days_to_due: i64,
    pub open_month: u32,
    pub creation_day_of_week: String,
    pub creation_hour: u32,
    pub deadline_day_of_week: String,
    pub deadline_hour: u32,
    pub resolution_duration: f64,
    pub total_tickets_resolved_wc: f64,
    pub sla_threshold: f64,
    pub average_resolution_time_ac: f64,
    pub sla_to_average_resolution_ratio_rc: f64,
    pub compliance_rate: f64,
    pub created_at: NaiveDateTime,
}

/// API representation of a ticket, with display extras precomputed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub number: String,
    pub priority: String,
    pub category: String,
    pub item: String,
    pub open_date: String,
    pub closed_date: Option<String>,
    pub due_date: String,
    pub time_left_incl_on_hold: f64,
    pub is_sla_violated: bool,
    pub is_open_date_off: String,
    pub is_due_date_off: String,
    pub days_to_due: i64,
    pub open_month: u32,
    pub creation_day_of_week: String,
    pub creation_hour: u32,
    pub deadline_day_of_week: String,
    pub deadline_hour: u32,
    pub resolution_duration: f64,
    pub total_tickets_resolved_wc: f64,
    pub sla_threshold: f64,
    pub average_resolution_time_ac: f64,
    pub sla_to_average_resolution_ratio_rc: f64,
    pub compliance_rate: f64,
    pub sla_violated_text: String,
    pub resolution_duration_formatted: String,
    pub compliance_rate_percent: String,
}

impl From<&Ticket> for TicketView {
    fn from(t: &Ticket) -> Self {
        Self {
            number: t.number.clone(),
            priority: t.priority.clone(),
            category: t.category.clone(),
            item: t.item.clone(),
            open_date: t.open_date.format(TICKET_TIME_FORMAT).to_string(),
            closed_date: t
                .closed_date
                .map(|d| d.format(TICKET_TIME_FORMAT).to_string()),
            due_date: t.due_date.format(TICKET_TIME_FORMAT).to_string(),
            time_left_incl_on_hold: t.time_left_incl_on_hold,
            is_sla_violated: t.is_sla_violated,
            is_open_date_off: t.is_open_date_off.clone(),
            is_due_date_off: t.is_due_date_off.clone(),
            days_to_due: t.days_to_due,
            open_month: t.open_month,
            creation_day_of_week: t.creation_day_of_week.clone(),
            creation_hour: t.creation_hour,
            deadline_day_of_week: t.deadline_day_of_week.clone(),
            deadline_hour: t.deadline_hour,
            resolution_duration: t.resolution_duration,
            total_tickets_resolved_wc: t.total_tickets_resolved_wc,
            sla_threshold: t.sla_threshold,
            average_resolution_time_ac: t.average_resolution_time_ac,
            sla_to_average_resolution_ratio_rc: t.sla_to_average_resolution_ratio_rc,
            compliance_rate: t.compliance_rate,
            sla_violated_text: if t.is_sla_violated { "Yes" } else { "No" }.to_string(),
            resolution_duration_formatted: format!("{:.2} days", t.resolution_duration),
            compliance_rate_percent: format!("{:.1}%", t.compliance_rate * 100.0),
        }
    }
}

/// One page of the ticket listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPage {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<TicketView>,
}

/// A hypothetical ticket submitted for SLA-violation prediction.
///
/// Unknown fields are rejected at the boundary; `sub_category` may be
/// empty, which the encoder resolves through its sentinel fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionRequest {
    pub open_date: String,
    pub due_date: String,
    pub priority: String,
    pub category: String,
    pub item: String,
    #[serde(default)]
    pub sub_category: String,
}

/// Verdict returned by the prediction endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub sla_violated: bool,
    /// Probability of the violated class, percent, two decimals
    pub confidence: f64,
    pub violation_text: String,
    pub days_to_due: i64,
    pub open_hour: u32,
}

/// Filters shared by every aggregate query. `None` means unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsFilter {
    pub priority: Option<String>,
    pub category: Option<String>,
    pub is_sla_violated: Option<bool>,
}

/// Headline aggregates for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_tickets: u64,
    pub violation_count: u64,
    pub compliance_count: u64,
    /// Percent, one decimal; 0 when there are no tickets
    pub compliance_rate: f64,
    pub low_priority_count: u64,
    pub medium_priority_count: u64,
    pub high_priority_count: u64,
    pub critical_priority_count: u64,
    pub avg_resolution_duration: f64,
    /// Percent, one decimal
    pub avg_compliance_rate: f64,
}

/// Violation rate for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryViolation {
    pub category: String,
    /// Percent, two decimals
    pub violation_rate: f64,
    pub total_tickets: u64,
}

/// Ticket volume for one calendar month of the open date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub total_tickets: u64,
    pub violated_tickets: u64,
}

/// One entry of the offline feature-importance ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// A known categorical value and its display label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub value: String,
    pub label: String,
}

/// Vocabularies backing the prediction form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyResponse {
    pub categories: Vec<VocabularyEntry>,
    pub items: Vec<VocabularyEntry>,
    pub sub_categories: Vec<VocabularyEntry>,
}

/// Descriptive statistics for one cluster from the offline clustering job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: u32,
    pub size: u64,
    /// Mean of each numeric column within the cluster
    pub centroid: std::collections::BTreeMap<String, f64>,
    /// Mode of each categorical column within the cluster
    pub mode: std::collections::BTreeMap<String, String>,
}

/// The full clustering export served by the clusters endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterReport {
    pub num_clusters: u32,
    pub clusters: Vec<ClusterSummary>,
}

impl ClusterReport {
    /// Built-in stand-in served when the clustering export is absent
    pub fn sample() -> Self {
        let entries: [(&str, f64, f64, &str); 4] = [
            ("0", 4.0, 5.74, "4 - Low"),
            ("1", 3.0, 5.48, "4 - Low"),
            ("2", 2.0, 6.58, "3 - Medium"),
            ("3", 4.5, 5.47, "4 - Low"),
        ];
        let clusters = entries
            .iter()
            .map(|(id, days, duration, priority)| {
                let mut centroid = std::collections::BTreeMap::new();
                centroid.insert("Days to Due".to_string(), *days);
                centroid.insert("Resolution Duration".to_string(), *duration);
                let mut mode = std::collections::BTreeMap::new();
                mode.insert("Priority".to_string(), priority.to_string());
                ClusterSummary {
                    cluster_id: id.parse().unwrap_or(0),
                    size: 0,
                    centroid,
                    mode,
                }
            })
            .collect();
        Self {
            num_clusters: 4,
            clusters,
        }
    }
}

/// Audit row appended once per prediction call
#[derive(Debug, Clone)]
pub struct PredictionLogEntry {
    pub requester: Option<String>,
    pub input: serde_json::Value,
    pub result: serde_json::Value,
    pub client_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_ticket() -> Ticket {
        let open = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Ticket {
            number: "3226220".to_string(),
            priority: "3 - Medium".to_string(),
            category: "hardware".to_string(),
            item: "application 84".to_string(),
            open_date: open,
            closed_date: None,
            due_date: open + chrono::Duration::days(2),
            time_left_incl_on_hold: 1.5,
            is_sla_violated: true,
            is_open_date_off: "Workday".to_string(),
            is_due_date_off: "Workday".to_string(),
            days_to_due: 2,
            open_month: 1,
            creation_day_of_week: "Monday".to_string(),
            creation_hour: 9,
            deadline_day_of_week: "Wednesday".to_string(),
            deadline_hour: 9,
            resolution_duration: 2.75,
            total_tickets_resolved_wc: 120.0,
            sla_threshold: 3.0,
            average_resolution_time_ac: 2.1,
            sla_to_average_resolution_ratio_rc: 1.43,
            compliance_rate: 0.874,
            created_at: open,
        }
    }

    #[test]
    fn ticket_view_formats_display_extras() {
        let view = TicketView::from(&sample_ticket());
        assert_eq!(view.open_date, "2024-01-01 09:00:00");
        assert_eq!(view.sla_violated_text, "Yes");
        assert_eq!(view.resolution_duration_formatted, "2.75 days");
        assert_eq!(view.compliance_rate_percent, "87.4%");
        assert_eq!(view.closed_date, None);
    }

    #[test]
    fn prediction_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<PredictionRequest>(
            r#"{"open_date":"2024-01-01T09:00","due_date":"2024-01-03T17:00",
                "priority":"3 - Medium","category":"hardware","item":"application 84",
                "sub_category":"","bogus":1}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn prediction_request_defaults_sub_category() {
        let req: PredictionRequest = serde_json::from_str(
            r#"{"open_date":"2024-01-01T09:00","due_date":"2024-01-03T17:00",
                "priority":"3 - Medium","category":"hardware","item":"application 84"}"#,
        )
        .unwrap();
        assert_eq!(req.sub_category, "");
    }
}
