//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
#[allow(dead_code)]
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a percentage with one decimal
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Color a Yes/No violation verdict
pub fn color_verdict(violated: bool) -> String {
    if violated {
        "Yes".red().bold().to_string()
    } else {
        "No".green().to_string()
    }
}

/// Color a compliance rate: the higher the better
pub fn color_compliance(rate: f64) -> String {
    let formatted = format_percent(rate);
    if rate >= 90.0 {
        formatted.green().to_string()
    } else if rate >= 75.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a violation rate: the lower the better
pub fn color_violation_rate(rate: f64) -> String {
    let formatted = format!("{rate:.2}%");
    if rate <= 10.0 {
        formatted.green().to_string()
    } else if rate <= 25.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(87.456), "87.5%");
        assert_eq!(format_percent(0.0), "0.0%");
    }
}
