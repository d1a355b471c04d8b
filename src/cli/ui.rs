use crate::core::Currency;
use crate::core::conversion::round;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Display name and flag for a currency code.
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "BRL", name: "Real", flag: "🇧🇷" },
    CurrencyInfo { code: "BOB", name: "Boliviano", flag: "🇧🇴" },
    CurrencyInfo { code: "ARS", name: "Peso argentino", flag: "🇦🇷" },
    CurrencyInfo { code: "CLP", name: "Peso chileno", flag: "🇨🇱" },
    CurrencyInfo { code: "COP", name: "Peso colombiano", flag: "🇨🇴" },
    CurrencyInfo { code: "MXN", name: "Peso mexicano", flag: "🇲🇽" },
    CurrencyInfo { code: "PEN", name: "Sol", flag: "🇵🇪" },
    CurrencyInfo { code: "PYG", name: "Guaraní", flag: "🇵🇾" },
    CurrencyInfo { code: "UYU", name: "Peso uruguayo", flag: "🇺🇾" },
    CurrencyInfo { code: "USD", name: "US Dollar", flag: "🇺🇸" },
    CurrencyInfo { code: "EUR", name: "Euro", flag: "🇪🇺" },
];

pub fn currency_info(currency: &Currency) -> Option<&'static CurrencyInfo> {
    CURRENCIES.iter().find(|info| info.code == currency.code())
}

/// `🇧🇷 BRL (Real)`, or just the code for currencies without an entry.
pub fn currency_label(currency: &Currency) -> String {
    match currency_info(currency) {
        Some(info) => format!("{} {} ({})", info.flag, info.code, info.name),
        None => currency.code().to_string(),
    }
}

/// Formats `value` at `dp` decimals with thousands separators.
pub fn format_decimal(value: Decimal, dp: u32) -> String {
    let rounded = format!("{:.*}", dp as usize, round(value, dp));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Formats a fraction such as `0.0195` as `1.95%`.
pub fn format_percentage(fraction: Decimal) -> String {
    format!("{}%", format_decimal(fraction * Decimal::ONE_HUNDRED, 2))
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn amount_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Right-aligned red cell for an amount taken as a fee.
pub fn fee_cell(text: String) -> Cell {
    Cell::new(format!("-{text}"))
        .fg(Color::Red)
        .set_alignment(CellAlignment::Right)
}

pub fn total_cell(text: String) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Creates a cell for "N/A" values, with error-specific styling.
pub fn na_cell(has_error: bool) -> Cell {
    let color = if has_error {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new("N/A").fg(color)
}

/// Spinner shown while rates are being fetched.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(dec!(1331.79354), 2), "1,331.79");
        assert_eq!(format_decimal(dec!(1234567.005), 2), "1,234,567.01");
        assert_eq!(format_decimal(dec!(999), 2), "999.00");
        assert_eq!(format_decimal(dec!(-1000.5), 0), "-1,001");
        assert_eq!(format_decimal(dec!(190.25622), 6), "190.256220");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(dec!(0.0195)), "1.95%");
        assert_eq!(format_percentage(dec!(0.02)), "2.00%");
    }

    #[test]
    fn test_currency_label() {
        assert_eq!(
            currency_label(&Currency::new("brl").unwrap()),
            "🇧🇷 BRL (Real)"
        );
        assert_eq!(currency_label(&Currency::new("XYZ").unwrap()), "XYZ");
    }
}
