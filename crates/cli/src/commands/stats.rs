//! Aggregate-statistics commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{with_query, ApiClient};
use crate::output::{
    color_compliance, color_violation_rate, print_json, print_warning, OutputFormat,
};
use server_lib::{CategoryViolation, DashboardStats, MonthlyTrendPoint};

/// Shared filter flags of the stats subcommands
#[derive(Debug, Clone, Default)]
pub struct StatsFilterArgs {
    pub priority: Option<String>,
    pub category: Option<String>,
    pub violated: Option<String>,
}

impl StatsFilterArgs {
    fn query(&self, path: &str) -> String {
        with_query(
            path,
            &[
                ("priority", self.priority.as_deref()),
                ("category", self.category.as_deref()),
                ("is_sla_violated", self.violated.as_deref()),
            ],
        )
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Violation Rate")]
    violation_rate: String,
    #[tabled(rename = "Tickets")]
    tickets: String,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Tickets")]
    tickets: String,
    #[tabled(rename = "Violated")]
    violated: String,
}

/// Show the dashboard headline numbers
pub async fn show_stats(
    client: &ApiClient,
    filter: StatsFilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let stats: DashboardStats = client.get(&filter.query("api/stats")).await?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => {
            let rows = vec![
                MetricRow {
                    metric: "Total tickets".to_string(),
                    value: stats.total_tickets.to_string(),
                },
                MetricRow {
                    metric: "Violations".to_string(),
                    value: stats.violation_count.to_string(),
                },
                MetricRow {
                    metric: "Compliant".to_string(),
                    value: stats.compliance_count.to_string(),
                },
                MetricRow {
                    metric: "Compliance rate".to_string(),
                    value: color_compliance(stats.compliance_rate),
                },
                MetricRow {
                    metric: "Low priority".to_string(),
                    value: stats.low_priority_count.to_string(),
                },
                MetricRow {
                    metric: "Medium priority".to_string(),
                    value: stats.medium_priority_count.to_string(),
                },
                MetricRow {
                    metric: "High priority".to_string(),
                    value: stats.high_priority_count.to_string(),
                },
                MetricRow {
                    metric: "Critical priority".to_string(),
                    value: stats.critical_priority_count.to_string(),
                },
                MetricRow {
                    metric: "Avg resolution (days)".to_string(),
                    value: format!("{:.2}", stats.avg_resolution_duration),
                },
                MetricRow {
                    metric: "Avg compliance rate".to_string(),
                    value: color_compliance(stats.avg_compliance_rate),
                },
            ];
            print_rounded_table(rows);
        }
    }

    Ok(())
}

/// Show the violation rate per category
pub async fn show_categories(
    client: &ApiClient,
    filter: StatsFilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let results: Vec<CategoryViolation> = client
        .get(&filter.query("api/stats/violation-by-category"))
        .await?;

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => {
            if results.is_empty() {
                print_warning("No tickets found");
                return Ok(());
            }
            let rows: Vec<CategoryRow> = results
                .iter()
                .map(|r| CategoryRow {
                    category: r.category.clone(),
                    violation_rate: color_violation_rate(r.violation_rate),
                    tickets: r.total_tickets.to_string(),
                })
                .collect();
            print_rounded_table(rows);
        }
    }

    Ok(())
}

/// Show the monthly ticket/violation trend
pub async fn show_monthly(
    client: &ApiClient,
    filter: StatsFilterArgs,
    format: OutputFormat,
) -> Result<()> {
    let results: Vec<MonthlyTrendPoint> = client
        .get(&filter.query("api/stats/monthly-trend"))
        .await?;

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => {
            if results.is_empty() {
                print_warning("No tickets found");
                return Ok(());
            }
            let rows: Vec<MonthRow> = results
                .iter()
                .map(|p| MonthRow {
                    month: p.month.clone(),
                    tickets: p.total_tickets.to_string(),
                    violated: p.violated_tickets.to_string(),
                })
                .collect();
            print_rounded_table(rows);
        }
    }

    Ok(())
}

fn print_rounded_table<T: Tabled>(rows: Vec<T>) {
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}
