//! Market price refresh of tracked holdings.
use crate::core::error::ValuationError;
use crate::core::holding::{Holding, RefreshedValue};
use crate::core::price::PriceProvider;
use crate::core::store::HoldingStore;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Outcome of one refresh run. Not atomic: updated holdings stay updated even
/// when others fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub updated_count: usize,
    pub failed_ids: Vec<Uuid>,
    pub skipped_ids: Vec<Uuid>,
}

enum Outcome {
    Updated,
    Failed(Uuid),
    Skipped(Uuid),
}

pub struct RefreshCoordinator {
    store: Arc<dyn HoldingStore>,
    prices: Arc<dyn PriceProvider>,
    max_concurrent: usize,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn HoldingStore>,
        prices: Arc<dyn PriceProvider>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            prices,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetches fresh prices and stores `quantity * price` as the refreshed
    /// value of each tracked holding.
    ///
    /// With `ids`, only those holdings are considered, and any id that is not
    /// a market-tracked holding of `owner` is reported as skipped. Without
    /// `ids`, every tracked holding of the owner is refreshed.
    #[instrument(name = "RefreshPrices", skip(self, ids), fields(requested = ids.map(|i| i.len())))]
    pub async fn refresh_prices(
        &self,
        owner: &str,
        ids: Option<&[Uuid]>,
    ) -> Result<RefreshReport, ValuationError> {
        let holdings = self.store.load_holdings(owner).await?;
        let mut report = RefreshReport::default();

        let targets: Vec<Holding> = match ids {
            Some(ids) => {
                let mut seen = HashSet::new();
                let mut targets = Vec::new();
                for id in ids.iter().filter(|id| seen.insert(**id)) {
                    match holdings.iter().find(|h| h.id == *id) {
                        Some(h) if h.is_market_tracked => targets.push(h.clone()),
                        Some(_) => {
                            debug!(holding = %id, "Not market-tracked, skipping");
                            report.skipped_ids.push(*id);
                        }
                        None => {
                            debug!(holding = %id, "Not a holding of this owner, skipping");
                            report.skipped_ids.push(*id);
                        }
                    }
                }
                targets
            }
            None => holdings.into_iter().filter(|h| h.is_market_tracked).collect(),
        };

        let outcomes: Vec<Outcome> = stream::iter(targets)
            .map(|holding| async move { self.refresh_one(&holding).await })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Updated => report.updated_count += 1,
                Outcome::Failed(id) => report.failed_ids.push(id),
                Outcome::Skipped(id) => report.skipped_ids.push(id),
            }
        }

        info!(
            updated = report.updated_count,
            failed = report.failed_ids.len(),
            skipped = report.skipped_ids.len(),
            "Refresh finished"
        );
        Ok(report)
    }

    async fn refresh_one(&self, holding: &Holding) -> Outcome {
        let (symbol, quantity) = match holding.tracking() {
            Ok(Some(tracking)) => tracking,
            Ok(None) => return Outcome::Skipped(holding.id),
            Err(e) => {
                debug!(holding = %holding.id, error = %e, "Incomplete tracking fields, skipping");
                return Outcome::Skipped(holding.id);
            }
        };
        if let Err(e) = holding.validate() {
            warn!(holding = %holding.id, error = %e, "Invalid holding, not refreshing");
            return Outcome::Failed(holding.id);
        }

        let quote = match self.prices.get_price(symbol, holding.category).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(holding = %holding.id, symbol, error = %e, "Price refresh failed");
                return Outcome::Failed(holding.id);
            }
        };

        let refreshed = RefreshedValue {
            value: quantity * quote.price,
            currency: quote.currency,
            refreshed_at: Utc::now(),
        };
        match self
            .store
            .update_refresh_fields(holding.id, symbol, quantity, refreshed)
            .await
        {
            Ok(()) => Outcome::Updated,
            Err(e) => {
                warn!(holding = %holding.id, error = %e, "Could not store refreshed value");
                Outcome::Failed(holding.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::holding::Category;
    use crate::core::test_support::{FakePrices, GaugedPrices};
    use std::time::Duration;
    use crate::store::memory::MemoryHoldingStore;
    use rust_decimal_macros::dec;

    fn coordinator(
        holdings: Vec<Holding>,
        prices: FakePrices,
    ) -> (RefreshCoordinator, Arc<MemoryHoldingStore>) {
        let store = Arc::new(MemoryHoldingStore::with_holdings(holdings));
        (
            RefreshCoordinator::new(store.clone(), Arc::new(prices), 2),
            store,
        )
    }

    #[tokio::test]
    async fn test_refresh_writes_only_refresh_fields() {
        let apple = Holding::new("dev", "Apple", Category::Equity, dec!(1234.5), "EUR")
            .with_tracking("AAPL", dec!(10));
        let before = apple.clone();
        let (coordinator, store) =
            coordinator(vec![apple], FakePrices::new().with("AAPL", dec!(150)));

        let report = coordinator.refresh_prices("dev", None).await.unwrap();

        assert_eq!(report.updated_count, 1);
        let after = &store.load_holdings("dev").await.unwrap()[0];
        assert_eq!(after.entry_amount, before.entry_amount);
        assert_eq!(after.entry_currency, before.entry_currency);
        assert_eq!(after.name, before.name);
        let refreshed = after.refreshed.as_ref().unwrap();
        assert_eq!(refreshed.value, dec!(1500));
        assert_eq!(refreshed.currency, "USD");
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_not_rolled_back() {
        let ok = Holding::new("dev", "Bitcoin", Category::Crypto, dec!(1), "USD")
            .with_tracking("BTC", dec!(0.5));
        let bad = Holding::new("dev", "Delisted", Category::Equity, dec!(1), "USD")
            .with_tracking("GONE", dec!(1));
        let mut broken = Holding::new("dev", "Broken", Category::Equity, dec!(1), "USD");
        broken.is_market_tracked = true;
        let cash = Holding::new("dev", "Cash", Category::Cash, dec!(1), "USD");
        let (bad_id, broken_id) = (bad.id, broken.id);
        let (coordinator, store) = coordinator(
            vec![ok, bad, broken, cash],
            FakePrices::new().with("BTC", dec!(60000)),
        );

        let report = coordinator.refresh_prices("dev", None).await.unwrap();

        assert_eq!(report.updated_count, 1);
        assert_eq!(report.failed_ids, vec![bad_id]);
        assert_eq!(report.skipped_ids, vec![broken_id]);
        let holdings = store.load_holdings("dev").await.unwrap();
        assert_eq!(holdings[0].current_native_value(), Some(dec!(30000)));
        assert!(holdings[1].refreshed.is_none());
    }

    #[tokio::test]
    async fn test_requested_ids_outside_scope_are_skipped() {
        let apple = Holding::new("dev", "Apple", Category::Equity, dec!(1), "USD")
            .with_tracking("AAPL", dec!(2));
        let cash = Holding::new("dev", "Cash", Category::Cash, dec!(1), "USD");
        let foreign = Holding::new("other", "Theirs", Category::Equity, dec!(1), "USD")
            .with_tracking("AAPL", dec!(2));
        let (apple_id, cash_id, foreign_id) = (apple.id, cash.id, foreign.id);
        let unknown = Uuid::new_v4();
        let prices = FakePrices::new().with("AAPL", dec!(150));
        let (coordinator, store) = coordinator(vec![apple, cash, foreign], prices);

        let report = coordinator
            .refresh_prices("dev", Some(&[apple_id, cash_id, foreign_id, unknown, apple_id]))
            .await
            .unwrap();

        assert_eq!(report.updated_count, 1);
        assert_eq!(report.skipped_ids, vec![cash_id, foreign_id, unknown]);
        let theirs = store.load_holdings("other").await.unwrap();
        assert!(theirs[0].refreshed.is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_tracked_holdings_calls_nothing() {
        let prices = Arc::new(FakePrices::new());
        let store = Arc::new(MemoryHoldingStore::with_holdings(vec![Holding::new(
            "dev",
            "House",
            Category::RealEstate,
            dec!(300000),
            "USD",
        )]));
        let coordinator = RefreshCoordinator::new(store, prices.clone(), 4);

        let report = coordinator.refresh_prices("dev", None).await.unwrap();

        assert_eq!(report, RefreshReport::default());
        assert_eq!(prices.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_tracked_holdings_are_failed_not_skipped() {
        let lowercase = Holding::new("dev", "Apple", Category::Equity, dec!(1), "usd")
            .with_tracking("AAPL", dec!(1));
        let empty = Holding::new("dev", "Sold", Category::Equity, dec!(1), "USD")
            .with_tracking("MSFT", dec!(0));
        let house = Holding::new("dev", "House", Category::RealEstate, dec!(1), "USD")
            .with_tracking("HOUSE", dec!(1));
        let ids = vec![lowercase.id, empty.id, house.id];
        let prices = FakePrices::new()
            .with("AAPL", dec!(150))
            .with("MSFT", dec!(400));
        let (coordinator, _store) = coordinator(vec![lowercase, empty, house], prices);

        let report = coordinator.refresh_prices("dev", None).await.unwrap();

        assert_eq!(report.updated_count, 0);
        assert_eq!(report.failed_ids, ids);
        assert!(report.skipped_ids.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_respects_max_concurrent() {
        let holdings: Vec<Holding> = (0..8)
            .map(|i| {
                Holding::new("dev", format!("Coin {i}"), Category::Crypto, dec!(1), "USD")
                    .with_tracking(format!("C{i}"), dec!(1))
            })
            .collect();
        let prices = Arc::new(GaugedPrices::new(Duration::from_millis(50)));
        let store = Arc::new(MemoryHoldingStore::with_holdings(holdings));
        let coordinator = RefreshCoordinator::new(store, prices.clone(), 2);

        let report = coordinator.refresh_prices("dev", None).await.unwrap();

        assert_eq!(report.updated_count, 8);
        assert_eq!(prices.peak(), 2);
    }
}
