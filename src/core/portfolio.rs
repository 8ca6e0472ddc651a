//! Portfolio totals per category and net worth in a base currency.
use crate::core::currency::validate_currency_code;
use crate::core::error::ValuationError;
use crate::core::holding::{Category, Holding, HoldingKind};
use crate::core::store::HoldingStore;
use crate::core::valuation::{Valuation, ValuationEngine};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub total: Decimal,
    pub count: usize,
}

/// A holding left out of the totals and the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationFailure {
    pub holding_id: Uuid,
    pub name: String,
    pub category: Category,
    #[serde(serialize_with = "serialize_error")]
    pub error: ValuationError,
}

fn serialize_error<S: serde::Serializer>(e: &ValuationError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub base_currency: String,
    /// In order of the first holding seen for each category.
    pub assets: Vec<CategoryBreakdown>,
    pub liabilities: Vec<CategoryBreakdown>,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
    pub computed_at: DateTime<Utc>,
    pub failures: Vec<ValuationFailure>,
}

/// A holding together with its value in the requested base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedHolding {
    pub holding: Holding,
    pub native_amount: Decimal,
    pub native_currency: String,
    pub converted_amount: Decimal,
    pub conversion_rate: Decimal,
    pub valuation: Valuation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingGroup {
    pub category: Category,
    pub holdings: Vec<ValuedHolding>,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedHoldings {
    pub base_currency: String,
    pub assets: Vec<HoldingGroup>,
    pub liabilities: Vec<HoldingGroup>,
    pub failures: Vec<ValuationFailure>,
}

pub struct PortfolioAggregator {
    store: Arc<dyn HoldingStore>,
    engine: Arc<ValuationEngine>,
    max_concurrent: usize,
}

impl PortfolioAggregator {
    pub fn new(
        store: Arc<dyn HoldingStore>,
        engine: Arc<ValuationEngine>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            engine,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Sums converted values per category and computes net worth.
    ///
    /// A holding that cannot be valued is excluded from every total and
    /// reported in `failures`; it never fails the summary.
    #[instrument(name = "Summarize", skip(self))]
    pub async fn summarize(
        &self,
        owner: &str,
        base_currency: &str,
    ) -> Result<PortfolioSummary, ValuationError> {
        let (valued, failures) = self.valuate_all(owner, base_currency).await?;

        let mut assets: Vec<CategoryBreakdown> = Vec::new();
        let mut liabilities: Vec<CategoryBreakdown> = Vec::new();
        for (holding, valuation) in &valued {
            let side = match holding.kind() {
                HoldingKind::Asset => &mut assets,
                HoldingKind::Liability => &mut liabilities,
            };
            match side.iter_mut().find(|b| b.category == holding.category) {
                Some(breakdown) => {
                    breakdown.total += valuation.converted_amount;
                    breakdown.count += 1;
                }
                None => side.push(CategoryBreakdown {
                    category: holding.category,
                    total: valuation.converted_amount,
                    count: 1,
                }),
            }
        }

        let total_assets: Decimal = assets.iter().map(|b| b.total).sum();
        let total_liabilities: Decimal = liabilities.iter().map(|b| b.total).sum();
        let net_worth = total_assets - total_liabilities;
        info!(
            holdings = valued.len(),
            failed = failures.len(),
            %net_worth,
            "Computed portfolio summary"
        );

        Ok(PortfolioSummary {
            base_currency: base_currency.to_string(),
            assets,
            liabilities,
            total_assets,
            total_liabilities,
            net_worth,
            computed_at: Utc::now(),
            failures,
        })
    }

    /// Holdings grouped by category, each with its converted amount and rate.
    #[instrument(name = "GroupHoldings", skip(self))]
    pub async fn group_holdings(
        &self,
        owner: &str,
        base_currency: &str,
    ) -> Result<GroupedHoldings, ValuationError> {
        let (valued, failures) = self.valuate_all(owner, base_currency).await?;

        let mut assets: Vec<HoldingGroup> = Vec::new();
        let mut liabilities: Vec<HoldingGroup> = Vec::new();
        for (holding, valuation) in valued {
            let side = match holding.kind() {
                HoldingKind::Asset => &mut assets,
                HoldingKind::Liability => &mut liabilities,
            };
            let category = holding.category;
            let item = ValuedHolding {
                native_amount: valuation.native_amount,
                native_currency: valuation.native_currency.clone(),
                converted_amount: valuation.converted_amount,
                conversion_rate: valuation.rate_used,
                holding,
                valuation,
            };
            match side.iter_mut().find(|g| g.category == category) {
                Some(group) => {
                    group.total += item.converted_amount;
                    group.count += 1;
                    group.holdings.push(item);
                }
                None => side.push(HoldingGroup {
                    category,
                    total: item.converted_amount,
                    count: 1,
                    holdings: vec![item],
                }),
            }
        }

        Ok(GroupedHoldings {
            base_currency: base_currency.to_string(),
            assets,
            liabilities,
            failures,
        })
    }

    async fn valuate_all(
        &self,
        owner: &str,
        base_currency: &str,
    ) -> Result<(Vec<(Holding, Valuation)>, Vec<ValuationFailure>), ValuationError> {
        validate_currency_code(base_currency)?;
        let holdings = self.store.load_holdings(owner).await?;

        // `buffered` keeps load order so category order is stable.
        let results: Vec<(Holding, Result<Valuation, ValuationError>)> =
            stream::iter(holdings)
                .map(|holding| async move {
                    let result = self.engine.valuate(&holding, base_currency).await;
                    (holding, result)
                })
                .buffered(self.max_concurrent)
                .collect()
                .await;

        let mut valued = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (holding, result) in results {
            match result {
                Ok(valuation) => valued.push((holding, valuation)),
                Err(error) => {
                    warn!(holding = %holding.id, %error, "Excluding holding from totals");
                    failures.push(ValuationFailure {
                        holding_id: holding.id,
                        name: holding.name,
                        category: holding.category,
                        error,
                    });
                }
            }
        }
        Ok((valued, failures))
    }
}
