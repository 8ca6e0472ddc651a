use super::ui;
use crate::core::currency::SUPPORTED_CURRENCIES;
use crate::core::holding::Category;
use comfy_table::Cell;

pub fn render() -> String {
    let mut currencies = ui::new_styled_table();
    currencies.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell("Symbol"),
    ]);
    for (code, name, symbol) in SUPPORTED_CURRENCIES {
        currencies.add_row(vec![Cell::new(code), Cell::new(name), Cell::new(symbol)]);
    }

    let mut categories = ui::new_styled_table();
    categories.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Side"),
        ui::header_cell("Market data"),
    ]);
    for (side, list) in [
        ("asset", Category::ASSETS.as_slice()),
        ("liability", Category::LIABILITIES.as_slice()),
    ] {
        for category in list {
            let tracked = match (category.asset_class(), category.pricing_currency()) {
                (Some(class), Some(currency)) => format!("{class} ({currency})"),
                _ => "-".to_string(),
            };
            categories.add_row(vec![
                Cell::new(format!("{} [{}]", ui::category_label(*category), category)),
                Cell::new(side),
                Cell::new(tracked),
            ]);
        }
    }

    format!(
        "{}\n{}\n\n{}\n{}",
        ui::style_text("Supported currencies", ui::StyleType::Title),
        currencies,
        ui::style_text("Categories", ui::StyleType::Title),
        categories
    )
}

pub fn run() {
    println!("{}", render());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_lists_currencies_and_categories() {
        let output = console::strip_ansi_codes(&render()).to_string();
        for code in ["USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CNY"] {
            assert!(output.contains(code), "missing {code}");
        }
        assert!(output.contains("line_of_credit"));
        assert!(output.contains("commodity (USD)"));
    }
}
