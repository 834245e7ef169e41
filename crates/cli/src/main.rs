//! SLA Dashboard CLI
//!
//! A command-line tool for querying tickets and aggregate statistics,
//! requesting SLA-violation predictions, and running the offline ticket
//! import.

mod client;
mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use server_lib::PredictionRequest;

use commands::stats::StatsFilterArgs;
use commands::tickets::ListArgs;
use commands::{import, predict, stats, tickets};

/// SLA Dashboard CLI
#[derive(Parser)]
#[command(name = "slactl")]
#[command(author, version, about = "CLI for the SLA compliance dashboard", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SLA_API_URL env var)
    #[arg(long, env = "SLA_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse tickets
    #[command(subcommand)]
    Tickets(TicketCommands),

    /// Aggregate statistics
    #[command(subcommand)]
    Stats(StatsCommands),

    /// Predict SLA violation for a hypothetical ticket
    Predict {
        /// Open timestamp, YYYY-MM-DDTHH:MM
        #[arg(long)]
        open_date: String,

        /// Due timestamp, YYYY-MM-DDTHH:MM
        #[arg(long)]
        due_date: String,

        /// Priority label, e.g. "3 - Medium"
        #[arg(long)]
        priority: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        item: String,

        /// Optional sub category
        #[arg(long, default_value = "")]
        sub_category: String,
    },

    /// Show the known category/item/sub-category values
    Values,

    /// Import the notebook's JSON ticket export into the database
    Import {
        /// Path to the JSON export
        #[arg(long)]
        file: PathBuf,

        /// Path to the SQLite database
        #[arg(long, default_value = "data/tickets.db")]
        database: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum TicketCommands {
    /// List tickets
    List {
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(long)]
        page_size: Option<u32>,

        /// Partial match on the ticket number
        #[arg(long, short)]
        search: Option<String>,

        /// Filter by priority ("all" for none)
        #[arg(long)]
        priority: Option<String>,

        /// Filter by category ("all" for none)
        #[arg(long)]
        category: Option<String>,

        /// Sort order: open_date or -open_date
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show one ticket
    Show {
        /// Ticket number
        number: String,
    },
}

#[derive(Subcommand)]
pub enum StatsCommands {
    /// Dashboard headline numbers
    Show {
        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Filter by violation flag: true, false or all
        #[arg(long)]
        violated: Option<String>,
    },

    /// Violation rate per category
    Categories {
        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        violated: Option<String>,
    },

    /// Monthly ticket/violation trend
    Monthly {
        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        violated: Option<String>,
    },
}

const DEFAULT_API_URL: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flag/env wins, then the config file, then the default
    let api_url = match cli.api_url {
        Some(url) => url,
        None => config::Config::load()
            .unwrap_or_default()
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
    };

    // The import runs offline against the database file directly
    if let Commands::Import { file, database } = &cli.command {
        return import::import_tickets(file, database);
    }

    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Tickets(ticket_cmd) => match ticket_cmd {
            TicketCommands::List {
                page,
                page_size,
                search,
                priority,
                category,
                sort,
            } => {
                let args = ListArgs {
                    page,
                    page_size,
                    search,
                    priority,
                    category,
                    sort,
                };
                tickets::list_tickets(&client, args, cli.format).await?;
            }
            TicketCommands::Show { number } => {
                tickets::show_ticket(&client, &number, cli.format).await?;
            }
        },
        Commands::Stats(stats_cmd) => match stats_cmd {
            StatsCommands::Show {
                priority,
                category,
                violated,
            } => {
                let filter = StatsFilterArgs {
                    priority,
                    category,
                    violated,
                };
                stats::show_stats(&client, filter, cli.format).await?;
            }
            StatsCommands::Categories {
                priority,
                category,
                violated,
            } => {
                let filter = StatsFilterArgs {
                    priority,
                    category,
                    violated,
                };
                stats::show_categories(&client, filter, cli.format).await?;
            }
            StatsCommands::Monthly {
                priority,
                category,
                violated,
            } => {
                let filter = StatsFilterArgs {
                    priority,
                    category,
                    violated,
                };
                stats::show_monthly(&client, filter, cli.format).await?;
            }
        },
        Commands::Predict {
            open_date,
            due_date,
            priority,
            category,
            item,
            sub_category,
        } => {
            let request = PredictionRequest {
                open_date,
                due_date,
                priority,
                category,
                item,
                sub_category,
            };
            predict::predict(&client, request, cli.format).await?;
        }
        Commands::Values => {
            predict::show_values(&client, cli.format).await?;
        }
        Commands::Import { .. } => unreachable!("handled before client construction"),
    }

    Ok(())
}
