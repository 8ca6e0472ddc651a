//! In-process fakes for the provider traits.
use crate::core::currency::FxProvider;
use crate::core::error::ValuationError;
use crate::core::holding::{AssetClass, Category};
use crate::core::price::{PriceProvider, PriceQuote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct FakePrices {
    quotes: HashMap<String, Decimal>,
    down: bool,
    pub calls: AtomicUsize,
}

impl FakePrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, price: Decimal) -> Self {
        self.quotes.insert(symbol.to_string(), price);
        self
    }

    /// Every lookup fails as if the source were unreachable.
    pub fn unreachable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for FakePrices {
    async fn get_price(
        &self,
        symbol: &str,
        category: Category,
    ) -> Result<PriceQuote, ValuationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let currency = category
            .pricing_currency()
            .ok_or(ValuationError::UnsupportedCategory(category))?;
        if self.down {
            return Err(ValuationError::unavailable("fake", "connection refused"));
        }
        match self.quotes.get(symbol) {
            Some(price) => Ok(PriceQuote {
                price: *price,
                currency: currency.to_string(),
            }),
            None => Err(ValuationError::UnknownSymbol {
                symbol: symbol.to_string(),
                class: category
                    .asset_class()
                    .map_or("unknown".to_string(), |c: AssetClass| c.to_string()),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeFx {
    rates: HashMap<(String, String), Decimal>,
    pub calls: AtomicUsize,
}

impl FakeFx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, from: &str, to: &str, rate: Decimal) -> Self {
        self.rates.insert((from.to_string(), to.to_string()), rate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FxProvider for FakeFx {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, ValuationError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rates
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .ok_or_else(|| ValuationError::unavailable("fake fx", format!("no rate {from}->{to}")))
    }
}

/// Prices every symbol at 1 USD after a delay, recording how many lookups
/// were in flight at once.
pub struct GaugedPrices {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugedPrices {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for GaugedPrices {
    async fn get_price(
        &self,
        _symbol: &str,
        _category: Category,
    ) -> Result<PriceQuote, ValuationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(PriceQuote {
            price: Decimal::ONE,
            currency: "USD".to_string(),
        })
    }
}
