//! Per-holding valuation: native value by priority, then one conversion.
use crate::core::currency::{FxProvider, validate_currency_code};
use crate::core::error::ValuationError;
use crate::core::holding::Holding;
use crate::core::price::{PriceProvider, PriceQuote};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Where the native amount of a valuation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Quantity times a price fetched for this request.
    LivePrice,
    /// The value stored by the last successful refresh.
    LastRefresh,
    /// The amount the owner entered.
    Entry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub native_amount: Decimal,
    pub native_currency: String,
    pub base_currency: String,
    pub converted_amount: Decimal,
    pub rate_used: Decimal,
    pub source: ValueSource,
    /// Unit price when the native amount came from a live quote.
    pub price: Option<PriceQuote>,
}

#[derive(Debug, Clone, PartialEq)]
struct NativeValue {
    amount: Decimal,
    currency: String,
    source: ValueSource,
    price: Option<PriceQuote>,
}

/// Values one holding at a time. Nothing it computes is ever written back.
pub struct ValuationEngine {
    prices: Arc<dyn PriceProvider>,
    fx: Arc<dyn FxProvider>,
}

impl ValuationEngine {
    pub fn new(prices: Arc<dyn PriceProvider>, fx: Arc<dyn FxProvider>) -> Self {
        Self { prices, fx }
    }

    /// Values `holding` in `base_currency`.
    ///
    /// Fails when the holding is malformed or when the native value has to be
    /// converted and no rate can be obtained. A failed price lookup is not an
    /// error here: the last refreshed value or the entry amount is used instead.
    #[instrument(
        name = "Valuate",
        skip(self, holding),
        fields(holding = %holding.id, category = %holding.category)
    )]
    pub async fn valuate(
        &self,
        holding: &Holding,
        base_currency: &str,
    ) -> Result<Valuation, ValuationError> {
        validate_currency_code(base_currency)?;
        holding.validate()?;

        let native = self.native_value(holding).await?;

        let rate = if native.currency == base_currency {
            Decimal::ONE
        } else {
            self.fx.get_rate(&native.currency, base_currency).await?
        };
        let converted_amount = native.amount * rate;
        debug!(
            native = %native.amount,
            native_currency = %native.currency,
            %rate,
            %converted_amount,
            "Valued holding"
        );

        Ok(Valuation {
            native_amount: native.amount,
            native_currency: native.currency,
            base_currency: base_currency.to_string(),
            converted_amount,
            rate_used: rate,
            source: native.source,
            price: native.price,
        })
    }

    async fn native_value(&self, holding: &Holding) -> Result<NativeValue, ValuationError> {
        if let Some((symbol, quantity)) = holding.tracking()? {
            match self.prices.get_price(symbol, holding.category).await {
                Ok(quote) => {
                    return Ok(NativeValue {
                        amount: quantity * quote.price,
                        currency: quote.currency.clone(),
                        source: ValueSource::LivePrice,
                        price: Some(quote),
                    });
                }
                Err(e) => warn!(
                    symbol,
                    error = %e,
                    "Live price unavailable, falling back to stored value"
                ),
            }
        }

        if let Some(refreshed) = &holding.refreshed {
            return Ok(NativeValue {
                amount: refreshed.value,
                currency: refreshed.currency.clone(),
                source: ValueSource::LastRefresh,
                price: None,
            });
        }

        Ok(NativeValue {
            amount: holding.entry_amount,
            currency: holding.entry_currency.clone(),
            source: ValueSource::Entry,
            price: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::holding::{Category, RefreshedValue};
    use crate::core::test_support::{FakeFx, FakePrices};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn engine(prices: FakePrices, fx: FakeFx) -> (ValuationEngine, Arc<FakePrices>, Arc<FakeFx>) {
        let prices = Arc::new(prices);
        let fx = Arc::new(fx);
        (ValuationEngine::new(prices.clone(), fx.clone()), prices, fx)
    }

    fn refreshed(value: Decimal, currency: &str) -> Option<RefreshedValue> {
        Some(RefreshedValue {
            value,
            currency: currency.to_string(),
            refreshed_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_untracked_holding_converted_once() {
        let (engine, _, fx) = engine(FakePrices::new(), FakeFx::new().with("USD", "CNY", dec!(7.0)));
        let holding = Holding::new("dev", "Checking", Category::Cash, dec!(1000), "USD");

        let v = engine.valuate(&holding, "CNY").await.unwrap();

        assert_eq!(v.native_amount, dec!(1000));
        assert_eq!(v.native_currency, "USD");
        assert_eq!(v.converted_amount, dec!(7000));
        assert_eq!(v.rate_used, dec!(7.0));
        assert_eq!(v.source, ValueSource::Entry);
        assert_eq!(fx.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tracked_crypto_uses_live_price() {
        let (engine, _, fx) = engine(FakePrices::new().with("BTC", dec!(60000)), FakeFx::new());
        let holding = Holding::new("dev", "Bitcoin", Category::Crypto, dec!(1), "USD")
            .with_tracking("BTC", dec!(0.5));

        let v = engine.valuate(&holding, "USD").await.unwrap();

        assert_eq!(v.native_amount, dec!(30000));
        assert_eq!(v.converted_amount, dec!(30000));
        assert_eq!(v.rate_used, Decimal::ONE);
        assert_eq!(v.source, ValueSource::LivePrice);
        assert_eq!(fx.call_count(), 0);
    }

    #[tokio::test]
    async fn test_live_price_wins_over_stale_entry() {
        let (engine, _, _) = engine(FakePrices::new().with("AAPL", dec!(150)), FakeFx::new());
        let mut holding = Holding::new("dev", "Apple", Category::Equity, dec!(99999), "USD")
            .with_tracking("AAPL", dec!(10));
        holding.refreshed = refreshed(dec!(1200), "USD");

        let v = engine.valuate(&holding, "USD").await.unwrap();

        assert_eq!(v.native_amount, dec!(1500));
        assert_eq!(v.price.unwrap().price, dec!(150));
    }

    #[tokio::test]
    async fn test_price_failure_falls_back_to_last_refresh() {
        let (engine, prices, _) = engine(FakePrices::unreachable(), FakeFx::new());
        let mut holding = Holding::new("dev", "Apple", Category::Equity, dec!(500), "USD")
            .with_tracking("AAPL", dec!(10));
        holding.refreshed = refreshed(dec!(1000), "USD");

        let v = engine.valuate(&holding, "USD").await.unwrap();

        assert_eq!(prices.call_count(), 1);
        assert_eq!(v.native_amount, dec!(1000));
        assert_eq!(v.source, ValueSource::LastRefresh);
    }

    #[tokio::test]
    async fn test_price_failure_without_refresh_uses_entry() {
        let (engine, _, _) = engine(FakePrices::new(), FakeFx::new());
        let holding = Holding::new("dev", "Mystery", Category::Equity, dec!(250), "USD")
            .with_tracking("NOPE", dec!(3));

        let v = engine.valuate(&holding, "USD").await.unwrap();

        assert_eq!(v.native_amount, dec!(250));
        assert_eq!(v.source, ValueSource::Entry);
    }

    #[tokio::test]
    async fn test_fallback_uses_stored_refresh_currency() {
        // Gold entered in EUR but last refreshed in USD.
        let (engine, _, _) = engine(
            FakePrices::unreachable(),
            FakeFx::new().with("USD", "EUR", dec!(0.9)),
        );
        let mut holding = Holding::new("dev", "Gold bar", Category::Gold, dec!(1800), "EUR")
            .with_tracking("XAU", dec!(1));
        holding.refreshed = refreshed(dec!(2000), "USD");

        let v = engine.valuate(&holding, "EUR").await.unwrap();

        assert_eq!(v.native_currency, "USD");
        assert_eq!(v.converted_amount, dec!(1800.0));
        assert_eq!(v.rate_used, dec!(0.9));
    }

    #[tokio::test]
    async fn test_native_amount_independent_of_base_currency() {
        let (engine, _, _) = engine(
            FakePrices::new().with("AAPL", dec!(150)),
            FakeFx::new()
                .with("USD", "EUR", dec!(0.9))
                .with("USD", "JPY", dec!(150)),
        );
        let holdings = vec![
            Holding::new("dev", "Apple", Category::Equity, dec!(1), "USD")
                .with_tracking("AAPL", dec!(10)),
            Holding::new("dev", "Savings", Category::Cash, dec!(1000), "USD"),
        ];

        for holding in &holdings {
            let direct_eur = engine.valuate(holding, "EUR").await.unwrap();
            let jpy = engine.valuate(holding, "JPY").await.unwrap();
            let eur = engine.valuate(holding, "EUR").await.unwrap();
            assert_eq!(jpy.native_amount, direct_eur.native_amount);
            assert_eq!(eur, direct_eur);
            assert_eq!(jpy.converted_amount, jpy.native_amount * dec!(150));
        }
    }

    #[tokio::test]
    async fn test_identity_conversion_never_calls_fx() {
        let (engine, _, fx) = engine(FakePrices::new(), FakeFx::new());
        let holding = Holding::new("dev", "Yen", Category::Cash, dec!(12345.67), "JPY");

        let v = engine.valuate(&holding, "JPY").await.unwrap();

        assert_eq!(v.rate_used, Decimal::ONE);
        assert_eq!(v.converted_amount, v.native_amount);
        assert_eq!(fx.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fx_failure_is_surfaced() {
        let (engine, _, _) = engine(FakePrices::new(), FakeFx::new());
        let holding = Holding::new("dev", "Pounds", Category::Cash, dec!(10), "GBP");

        let err = engine.valuate(&holding, "CNY").await.unwrap_err();

        assert!(matches!(err, ValuationError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_holding_is_rejected() {
        let (engine, prices, _) = engine(FakePrices::new().with("AAPL", dec!(150)), FakeFx::new());
        let mut holding = Holding::new("dev", "Apple", Category::Equity, dec!(10), "USD");
        holding.is_market_tracked = true;

        let err = engine.valuate(&holding, "USD").await.unwrap_err();

        assert!(matches!(err, ValuationError::Validation(_)));
        assert_eq!(prices.call_count(), 0);

        let holding = Holding::new("dev", "Cash", Category::Cash, dec!(10), "USD");
        assert!(engine.valuate(&holding, "usd").await.is_err());
    }
}
