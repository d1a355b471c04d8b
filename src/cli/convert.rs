use super::ui;
use crate::core::conversion::{MONEY_DP, USDT_DP};
use crate::core::{ConversionRequest, ConversionResult, FeePolicy, QuoteService};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl ConversionResult {
    /// Renders the itemized breakdown, rounded for display.
    pub fn display_as_table(&self) -> String {
        let from = &self.from_currency;
        let to = &self.to_currency;
        let money = |v| ui::format_decimal(v, MONEY_DP);
        let usdt = |v| ui::format_decimal(v, USDT_DP);

        let mut output = format!(
            "{} ➔ {}\n\n",
            ui::style_text(&ui::currency_label(from), ui::StyleType::Title),
            ui::style_text(&ui::currency_label(to), ui::StyleType::Title)
        );

        if let Some(steps) = &self.steps {
            let rates = &steps.exchange_rate_used;
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Stage"),
                ui::header_cell("Amount"),
                ui::header_cell("Unit"),
            ]);

            let rows = vec![
                (
                    "Amount sent".to_string(),
                    ui::amount_cell(money(self.original_amount)),
                    from.code(),
                ),
                (
                    format!("Bank fee ({})", ui::format_percentage(rates.bank_fee_rate)),
                    ui::fee_cell(money(steps.bank_fee)),
                    from.code(),
                ),
                (
                    "Net after bank fee".to_string(),
                    ui::amount_cell(money(steps.net_after_bank)),
                    from.code(),
                ),
                (
                    format!("USDT acquired @ {} {from}", money(rates.from)),
                    ui::amount_cell(usdt(steps.usdt_acquired)),
                    "USDT",
                ),
                (
                    format!("Platform fee ({})", ui::format_percentage(rates.usdt)),
                    ui::fee_cell(usdt(steps.platform_fee)),
                    "USDT",
                ),
                (
                    "Net USDT".to_string(),
                    ui::amount_cell(usdt(steps.net_usdt)),
                    "USDT",
                ),
                (
                    format!("Spread ({})", ui::format_percentage(rates.spread_rate)),
                    ui::fee_cell(usdt(steps.spread)),
                    "USDT",
                ),
                (
                    "Final USDT".to_string(),
                    ui::amount_cell(usdt(steps.final_usdt)),
                    "USDT",
                ),
                (
                    format!("Delivered @ {} {to}", money(rates.to)),
                    ui::total_cell(money(self.final_amount)),
                    to.code(),
                ),
            ];
            for (label, amount, unit) in rows {
                table.add_row(vec![Cell::new(label), amount, Cell::new(unit)]);
            }

            output.push_str(&table.to_string());
            output.push('\n');
            if let Ok(policy) = FeePolicy::new(rates.bank_fee_rate, rates.usdt, rates.spread_rate) {
                output.push_str(&ui::style_text(
                    &format!(
                        "Combined fees: {}",
                        ui::format_percentage(policy.effective_rate())
                    ),
                    ui::StyleType::Subtle,
                ));
                output.push('\n');
            }
            output.push('\n');
        } else {
            output.push_str(&ui::style_text(
                "Same currency, no fees applied.\n\n",
                ui::StyleType::Subtle,
            ));
        }

        output.push_str(&format!(
            "{}: {} {} ➔ {} {}",
            ui::style_text("Total", ui::StyleType::TotalLabel),
            money(self.original_amount),
            from,
            ui::style_text(&money(self.final_amount), ui::StyleType::TotalValue),
            to
        ));
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "Effective rate: 1 {from} = {} {to}",
                    self.effective_rate()
                        .map_or_else(|| "N/A".to_string(), usdt)
                ),
                ui::StyleType::Subtle
            )
        ));

        output
    }
}

pub async fn run(service: &QuoteService, request: &ConversionRequest, json: bool) -> Result<()> {
    let pb = (!json).then(|| ui::new_spinner("Fetching rates..."));
    let outcome = service.quote(request).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            let kind = e.kind();
            return Err(e).with_context(|| format!("Conversion failed ({kind})"));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.display_as_table());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Converter, Currency, FeePolicy, Rate};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sample() -> ConversionResult {
        let now = Utc::now();
        let from = Rate::new(Currency::new("BRL").unwrap(), dec!(5), dec!(5), now).unwrap();
        let to = Rate::new(Currency::new("BOB").unwrap(), dec!(7), dec!(7), now).unwrap();
        Converter::new(FeePolicy::default())
            .convert(
                &ConversionRequest::parse("1000", "BRL", "BOB").unwrap(),
                &from,
                &to,
                now,
            )
            .unwrap()
    }

    #[test]
    fn test_display_as_table() {
        console::set_colors_enabled(false);
        let output = sample().display_as_table();

        assert!(output.contains("🇧🇷 BRL (Real) ➔ 🇧🇴 BOB (Boliviano)"));
        assert!(output.contains("Bank fee (2.00%)"));
        assert!(output.contains("-20.00"));
        assert!(output.contains("196.000000"));
        assert!(output.contains("Platform fee (1.95%)"));
        assert!(output.contains("-3.822000"));
        assert!(output.contains("Total: 1,000.00 BRL ➔ 1,331.79 BOB"));
        // 1 - 0.98 * 0.9805 * 0.99 = 0.0487189
        assert!(output.contains("Combined fees: 4.87%"));
        assert!(output.contains("Effective rate: 1 BRL = 1.331794 BOB"));
    }

    #[test]
    fn test_display_same_currency() {
        console::set_colors_enabled(false);
        let now = Utc::now();
        let rate = Rate::new(Currency::new("BRL").unwrap(), dec!(1), dec!(1), now).unwrap();
        let result = Converter::default()
            .convert(
                &ConversionRequest::parse("10", "BRL", "BRL").unwrap(),
                &rate,
                &rate,
                now,
            )
            .unwrap();

        let output = result.display_as_table();
        assert!(output.contains("Same currency, no fees applied."));
        assert!(output.contains("Total: 10.00 BRL ➔ 10.00 BRL"));
        assert!(!output.contains("Combined fees"));
    }

    #[test]
    fn test_effective_rate_of_zero_amount() {
        console::set_colors_enabled(false);
        let mut result = sample();
        result.original_amount = Decimal::ZERO;

        assert_eq!(result.effective_rate(), None);
        assert!(result.display_as_table().contains("Effective rate: 1 BRL = N/A BOB"));
    }
}
