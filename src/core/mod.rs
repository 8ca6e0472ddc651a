//! Valuation core: domain types, provider abstractions and the engine

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod holding;
pub mod log;
pub mod portfolio;
pub mod price;
pub mod refresh;
pub mod store;
pub mod valuation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for cleaner imports
pub use cache::{Quote, QuoteCache, QuoteKey};
pub use currency::{FxProvider, FxSource};
pub use error::ValuationError;
pub use holding::{
    AssetClass, Category, EntryUpdate, Holding, HoldingKind, RefreshedValue, TrackingUpdate,
};
pub use portfolio::{GroupedHoldings, PortfolioAggregator, PortfolioSummary};
pub use price::{MarketDataSource, PriceProvider, PriceQuote};
pub use refresh::{RefreshCoordinator, RefreshReport};
pub use store::HoldingStore;
pub use valuation::{Valuation, ValuationEngine, ValueSource};
