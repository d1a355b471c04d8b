use super::ui;
use crate::core::{Currency, QuoteService};
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;

pub async fn run(service: &QuoteService, currencies: &[Currency]) -> Result<()> {
    if currencies.is_empty() {
        println!("No currencies to display rates for.");
        return Ok(());
    }

    let pb = ui::new_spinner("Fetching rates...");
    let results = service.rates(currencies).await;
    pb.finish_and_clear();

    let now = Utc::now();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Sell (per USDT)"),
        ui::header_cell("Buy (per USDT)"),
        ui::header_cell("Age (s)"),
    ]);

    let mut errors = Vec::new();
    for (currency, result) in &results {
        match result {
            Ok(rate) => table.add_row(vec![
                Cell::new(ui::currency_label(currency)),
                ui::amount_cell(ui::format_decimal(rate.sell_rate, 4)),
                ui::amount_cell(ui::format_decimal(rate.buy_rate, 4)),
                ui::amount_cell(rate.age(now).num_seconds().to_string()),
            ]),
            Err(e) => {
                errors.push(e.to_string());
                table.add_row(vec![
                    Cell::new(ui::currency_label(currency)),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                ])
            }
        };
    }

    println!("{table}");
    for error in &errors {
        println!("{}", ui::style_text(error, ui::StyleType::Error));
    }

    if errors.len() == results.len() {
        anyhow::bail!("No rates could be fetched");
    }
    Ok(())
}
