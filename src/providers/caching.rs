use crate::core::cache::{Quote, QuoteCache, QuoteKey};
use crate::core::config::{CacheConfig, FetchConfig};
use crate::core::currency::{FxProvider, FxSource, validate_currency_code};
use crate::core::error::ValuationError;
use crate::core::holding::{AssetClass, Category};
use crate::core::price::{MarketDataSource, PriceProvider, PriceQuote};
use crate::providers::util::{with_retry, with_timeout};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// How external calls are bounded and retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub retries: usize,
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Cache lifetimes per kind of quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteTtls {
    pub price: Duration,
    pub crypto: Duration,
    pub fx: Duration,
}

impl Default for QuoteTtls {
    fn default() -> Self {
        Self {
            price: Duration::from_secs(300),
            crypto: Duration::from_secs(60),
            fx: Duration::from_secs(3600),
        }
    }
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            retries: config.retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl From<&CacheConfig> for QuoteTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            price: Duration::from_secs(config.price_ttl_secs),
            crypto: Duration::from_secs(config.crypto_ttl_secs),
            fx: Duration::from_secs(config.fx_ttl_secs),
        }
    }
}

impl QuoteTtls {
    fn for_class(&self, class: AssetClass) -> Duration {
        match class {
            AssetClass::Crypto => self.crypto,
            AssetClass::Equity | AssetClass::Commodity => self.price,
        }
    }
}

/// Cache-first price lookup in front of a market data source.
///
/// Only successful quotes are cached.
pub struct CachedPriceProvider {
    source: Arc<dyn MarketDataSource>,
    cache: Arc<dyn QuoteCache>,
    ttls: QuoteTtls,
    policy: FetchPolicy,
}

impl CachedPriceProvider {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        cache: Arc<dyn QuoteCache>,
        ttls: QuoteTtls,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            source,
            cache,
            ttls,
            policy,
        }
    }
}

async fn fetch_from_source(
    source: &dyn MarketDataSource,
    class: AssetClass,
    symbol: &str,
    currency: &str,
) -> Result<Decimal, ValuationError> {
    match class {
        AssetClass::Equity => source.equity_quote(symbol, currency).await,
        AssetClass::Crypto => source.crypto_quote(symbol, currency).await,
        AssetClass::Commodity => source.commodity_quote(symbol, currency).await,
    }
}

#[async_trait]
impl PriceProvider for CachedPriceProvider {
    #[instrument(name = "GetPrice", skip(self), fields(provider = self.source.name()))]
    async fn get_price(
        &self,
        symbol: &str,
        category: Category,
    ) -> Result<PriceQuote, ValuationError> {
        let (Some(class), Some(currency)) = (category.asset_class(), category.pricing_currency())
        else {
            return Err(ValuationError::UnsupportedCategory(category));
        };
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValuationError::Validation("empty tracking symbol".into()));
        }

        let key = QuoteKey::price(class, &symbol, currency);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for price: {}", key);
            return Ok(PriceQuote {
                price: cached.value,
                currency: currency.to_string(),
            });
        }

        debug!("Cache miss for price: {}", key);
        let source = self.source.as_ref();
        let name = source.name();
        let policy = self.policy;
        let symbol_ref = symbol.as_str();
        let price = with_retry(
            move || {
                with_timeout(
                    name,
                    policy.timeout,
                    fetch_from_source(source, class, symbol_ref, currency),
                )
            },
            policy.retries,
            policy.retry_delay,
        )
        .await?;

        self.cache
            .set(key, Quote::now(price), self.ttls.for_class(class))
            .await;
        Ok(PriceQuote {
            price,
            currency: currency.to_string(),
        })
    }
}

/// Cache-first exchange rates in front of an FX source.
pub struct CachedFxProvider {
    source: Arc<dyn FxSource>,
    cache: Arc<dyn QuoteCache>,
    ttl: Duration,
    policy: FetchPolicy,
}

impl CachedFxProvider {
    pub fn new(
        source: Arc<dyn FxSource>,
        cache: Arc<dyn QuoteCache>,
        ttl: Duration,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            source,
            cache,
            ttl,
            policy,
        }
    }

    async fn cached_rate(&self, from: &str, to: &str) -> Option<Decimal> {
        let key = QuoteKey::rate(from, to);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for currency rate: {}", key);
            return Some(cached.value);
        }
        let reverse = self.cache.get(&QuoteKey::rate(to, from)).await?;
        if reverse.value.is_zero() {
            return None;
        }
        debug!("Inverting cached rate {}->{}", to, from);
        Decimal::ONE.checked_div(reverse.value)
    }
}

#[async_trait]
impl FxProvider for CachedFxProvider {
    #[instrument(name = "GetRate", skip(self), fields(provider = self.source.name()))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, ValuationError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        validate_currency_code(from)?;
        validate_currency_code(to)?;

        if let Some(rate) = self.cached_rate(from, to).await {
            return Ok(rate);
        }

        debug!("Cache miss for currency rate: {}->{}", from, to);
        let source = self.source.as_ref();
        let name = source.name();
        let policy = self.policy;
        let rate = with_retry(
            move || with_timeout(name, policy.timeout, source.exchange_rate(from, to)),
            policy.retries,
            policy.retry_delay,
        )
        .await?;

        self.cache
            .set(QuoteKey::rate(from, to), Quote::now(rate), self.ttl)
            .await;
        Ok(rate)
    }
}
