use super::ui;
use crate::core::portfolio::{CategoryBreakdown, PortfolioAggregator, PortfolioSummary, ValuationFailure};
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

fn breakdown_table(title: &str, rows: &[CategoryBreakdown], currency: &str) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(title),
        ui::header_cell("Holdings"),
        ui::header_cell(&format!("Total ({currency})")),
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(ui::category_label(row.category)),
            Cell::new(row.count),
            ui::amount_cell(row.total),
        ]);
    }
    table
}

/// Lists holdings left out of the totals.
pub fn render_failures(failures: &[ValuationFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let mut output = format!(
        "\n\n{}\n",
        ui::style_text(
            &format!("{} holding(s) could not be valued:", failures.len()),
            ui::StyleType::Error
        )
    );
    for failure in failures {
        output.push_str(&format!(
            "  {} ({}, {}): {}\n",
            failure.name,
            ui::category_label(failure.category),
            ui::style_text(&failure.holding_id.to_string(), ui::StyleType::Subtle),
            failure.error
        ));
    }
    output
}

impl PortfolioSummary {
    pub fn display_as_table(&self) -> String {
        let currency = &self.base_currency;
        let mut output = format!(
            "{}\n\n",
            ui::style_text(&format!("Net worth in {currency}"), ui::StyleType::Title)
        );

        if !self.assets.is_empty() {
            output.push_str(&breakdown_table("Assets", &self.assets, currency).to_string());
            output.push('\n');
        }
        if !self.liabilities.is_empty() {
            output.push_str(&breakdown_table("Liabilities", &self.liabilities, currency).to_string());
            output.push('\n');
        }

        let mut totals = ui::new_styled_table();
        totals.add_row(vec![
            Cell::new(ui::style_text("Total assets", ui::StyleType::TotalLabel)),
            ui::amount_cell(self.total_assets),
        ]);
        totals.add_row(vec![
            Cell::new(ui::style_text("Total liabilities", ui::StyleType::TotalLabel)),
            ui::amount_cell(self.total_liabilities),
        ]);
        totals.add_row(vec![
            Cell::new(ui::style_text("Net worth", ui::StyleType::TotalLabel)),
            ui::signed_amount_cell(self.net_worth),
        ]);
        output.push_str(&totals.to_string());

        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Computed at {}", self.computed_at.format("%Y-%m-%d %H:%M:%S UTC")),
                ui::StyleType::Subtle
            )
        ));
        output.push_str(&render_failures(&self.failures));
        output
    }
}

pub async fn run(aggregator: &PortfolioAggregator, owner: &str, currency: &str) -> Result<()> {
    let pb = ui::new_spinner("Valuing holdings...");
    let summary = aggregator.summarize(owner, currency).await;
    pb.finish_and_clear();

    let summary = summary.context("Failed to compute portfolio summary")?;
    println!("{}", summary.display_as_table());
    Ok(())
}
