//! Ticket listing and detail commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{with_query, ApiClient};
use crate::output::{print_json, print_warning, OutputFormat};
use server_lib::{TicketPage, TicketView};

#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Opened")]
    opened: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Violated")]
    violated: String,
}

/// Parameters of the ticket listing
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

pub async fn list_tickets(client: &ApiClient, args: ListArgs, format: OutputFormat) -> Result<()> {
    let page = args.page.map(|p| p.to_string());
    let page_size = args.page_size.map(|p| p.to_string());
    let path = with_query(
        "api/tickets",
        &[
            ("page", page.as_deref()),
            ("page_size", page_size.as_deref()),
            ("search", args.search.as_deref()),
            ("priority", args.priority.as_deref()),
            ("category", args.category.as_deref()),
            ("sort", args.sort.as_deref()),
        ],
    );

    let result: TicketPage = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.results.is_empty() {
                print_warning("No tickets found");
                return Ok(());
            }
            let rows: Vec<TicketRow> = result.results.iter().map(ticket_row).collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!(
                "\nPage {} ({} per page), {} tickets total",
                result.page, result.page_size, result.total
            );
        }
    }

    Ok(())
}

pub async fn show_ticket(client: &ApiClient, number: &str, format: OutputFormat) -> Result<()> {
    let ticket: TicketView = client.get(&format!("api/tickets/{number}")).await?;

    match format {
        OutputFormat::Json => print_json(&ticket)?,
        OutputFormat::Table => {
            println!("Ticket {}", ticket.number);
            println!("  Priority:        {}", ticket.priority);
            println!("  Category:        {}", ticket.category);
            println!("  Item:            {}", ticket.item);
            println!("  Opened:          {}", ticket.open_date);
            println!("  Due:             {}", ticket.due_date);
            println!(
                "  Closed:          {}",
                ticket.closed_date.as_deref().unwrap_or("-")
            );
            println!("  SLA violated:    {}", ticket.sla_violated_text);
            println!("  Resolution:      {}", ticket.resolution_duration_formatted);
            println!("  Compliance rate: {}", ticket.compliance_rate_percent);
        }
    }

    Ok(())
}

fn ticket_row(ticket: &TicketView) -> TicketRow {
    TicketRow {
        number: ticket.number.clone(),
        priority: ticket.priority.clone(),
        category: ticket.category.clone(),
        item: ticket.item.clone(),
        opened: ticket.open_date.clone(),
        due: ticket.due_date.clone(),
        violated: ticket.sla_violated_text.clone(),
    }
}
