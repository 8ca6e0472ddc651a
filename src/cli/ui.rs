use crate::core::holding::Category;
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

pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Right-aligned amount with two decimals.
pub fn amount_cell(value: Decimal) -> Cell {
    Cell::new(format_amount(value)).set_alignment(CellAlignment::Right)
}

/// Amount colored by sign, for net figures.
pub fn signed_amount_cell(value: Decimal) -> Cell {
    let color = if value.is_sign_negative() {
        Color::Red
    } else {
        Color::Green
    };
    amount_cell(value).fg(color).add_attribute(Attribute::Bold)
}

/// Conversion rate as used, without trailing zeros. Identity conversions show `1`.
pub fn rate_cell(rate: Decimal) -> Cell {
    Cell::new(rate.normalize().to_string()).set_alignment(CellAlignment::Right)
}

/// Display name of a category.
pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Cash => "Cash",
        Category::Equity => "Stocks",
        Category::Crypto => "Crypto",
        Category::RealEstate => "Real Estate",
        Category::Bond => "Bonds",
        Category::Gold => "Gold",
        Category::Silver => "Silver",
        Category::OtherAsset => "Other Assets",
        Category::CreditCard => "Credit Cards",
        Category::Loan => "Loans",
        Category::Mortgage => "Mortgages",
        Category::LineOfCredit => "Lines of Credit",
        Category::OtherLiability => "Other Liabilities",
    }
}

/// Spinner shown while a request is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
