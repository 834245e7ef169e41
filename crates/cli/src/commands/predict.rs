//! Prediction and vocabulary commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_verdict, print_json, OutputFormat};
use server_lib::{PredictionRequest, PredictionResponse, VocabularyEntry, VocabularyResponse};

pub async fn predict(
    client: &ApiClient,
    request: PredictionRequest,
    format: OutputFormat,
) -> Result<()> {
    let result: PredictionResponse = client.post("api/predict", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("SLA violation: {}", color_verdict(result.sla_violated));
            println!("Confidence:    {:.2}%", result.confidence);
            println!("Days to due:   {}", result.days_to_due);
            println!("Open hour:     {}", result.open_hour);
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Label")]
    label: String,
}

pub async fn show_values(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let vocab: VocabularyResponse = client.get("api/unique-values").await?;

    match format {
        OutputFormat::Json => print_json(&vocab)?,
        OutputFormat::Table => {
            print_group("Categories", &vocab.categories);
            print_group("Items", &vocab.items);
            print_group("Sub categories", &vocab.sub_categories);
        }
    }

    Ok(())
}

fn print_group(title: &str, entries: &[VocabularyEntry]) {
    println!("{title}:");
    let rows: Vec<ValueRow> = entries
        .iter()
        .map(|e| ValueRow {
            value: e.value.clone(),
            label: e.label.clone(),
        })
        .collect();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}\n", table);
}
