use super::ui;
use crate::core::refresh::{RefreshCoordinator, RefreshReport};
use anyhow::{Context, Result};
use uuid::Uuid;

impl RefreshReport {
    pub fn display(&self) -> String {
        let mut output = format!(
            "Updated {} holding(s)",
            ui::style_text(&self.updated_count.to_string(), ui::StyleType::TotalValue)
        );
        for (label, ids, style) in [
            ("Failed", &self.failed_ids, ui::StyleType::Error),
            ("Skipped", &self.skipped_ids, ui::StyleType::Subtle),
        ] {
            if ids.is_empty() {
                continue;
            }
            output.push_str(&format!("\n{} ({}):", ui::style_text(label, style), ids.len()));
            for id in ids {
                output.push_str(&format!("\n  {id}"));
            }
        }
        output
    }
}

pub async fn run(refresher: &RefreshCoordinator, owner: &str, ids: &[Uuid]) -> Result<RefreshReport> {
    let pb = ui::new_spinner("Refreshing market prices...");
    let requested = (!ids.is_empty()).then_some(ids);
    let report = refresher.refresh_prices(owner, requested).await;
    pb.finish_and_clear();

    let report = report.context("Failed to refresh prices")?;
    println!("{}", report.display());
    Ok(report)
}
