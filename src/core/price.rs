//! Pricing abstractions and core types

use crate::core::error::ValuationError;
use crate::core::holding::Category;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spot price of one unit of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Decimal,
    /// Pricing currency fixed by the holding category.
    pub currency: String,
}

/// Spot price lookup used by the valuation engine and the refresh coordinator.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn get_price(&self, symbol: &str, category: Category)
    -> Result<PriceQuote, ValuationError>;
}

/// Raw external market data source with one call per asset class.
///
/// Every call receives the currency the price must be quoted in and returns
/// the price of a single unit.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn equity_quote(&self, symbol: &str, currency: &str) -> Result<Decimal, ValuationError>;

    async fn crypto_quote(&self, symbol: &str, currency: &str) -> Result<Decimal, ValuationError>;

    /// Precious metals, priced per troy ounce.
    async fn commodity_quote(&self, symbol: &str, currency: &str)
    -> Result<Decimal, ValuationError>;
}
