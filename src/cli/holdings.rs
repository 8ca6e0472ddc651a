use super::summary::render_failures;
use super::ui;
use crate::core::portfolio::{GroupedHoldings, HoldingGroup, PortfolioAggregator};
use crate::core::valuation::ValueSource;
use anyhow::{Context, Result};
use comfy_table::Cell;

fn source_label(source: ValueSource) -> &'static str {
    match source {
        ValueSource::LivePrice => "live",
        ValueSource::LastRefresh => "last refresh",
        ValueSource::Entry => "entered",
    }
}

fn render_group(group: &HoldingGroup, base_currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Holding"),
        ui::header_cell("Native value"),
        ui::header_cell("Source"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Value ({base_currency})")),
    ]);
    for item in &group.holdings {
        let name = match (&item.holding.tracking_symbol, item.holding.tracking_quantity) {
            (Some(symbol), Some(quantity)) if item.holding.is_market_tracked => {
                format!("{} ({} x {})", item.holding.name, quantity.normalize(), symbol)
            }
            _ => item.holding.name.clone(),
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!(
                "{} {}",
                ui::format_amount(item.native_amount),
                item.native_currency
            )),
            Cell::new(source_label(item.valuation.source)),
            ui::rate_cell(item.conversion_rate),
            ui::amount_cell(item.converted_amount),
        ]);
    }

    format!(
        "{} ({} holding(s), {} {})\n{}",
        ui::style_text(ui::category_label(group.category), ui::StyleType::Title),
        group.count,
        ui::format_amount(group.total),
        base_currency,
        table
    )
}

impl GroupedHoldings {
    pub fn display_as_table(&self) -> String {
        let mut sections = Vec::new();
        for (label, groups) in [("Assets", &self.assets), ("Liabilities", &self.liabilities)] {
            if groups.is_empty() {
                continue;
            }
            sections.push(ui::style_text(label, ui::StyleType::TotalLabel));
            for group in groups {
                sections.push(render_group(group, &self.base_currency));
            }
        }
        if sections.is_empty() {
            sections.push(ui::style_text("No holdings yet.", ui::StyleType::Subtle));
        }
        let mut output = sections.join("\n\n");
        output.push_str(&render_failures(&self.failures));
        output
    }
}

pub async fn run(aggregator: &PortfolioAggregator, owner: &str, currency: &str) -> Result<()> {
    let pb = ui::new_spinner("Valuing holdings...");
    let grouped = aggregator.group_holdings(owner, currency).await;
    pb.finish_and_clear();

    let grouped = grouped.context("Failed to value holdings")?;
    println!("{}", grouped.display_as_table());
    Ok(())
}
