use crate::core::holding::AssetClass;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

/// Identifies a cached market price or exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteKey {
    Price {
        class: AssetClass,
        symbol: String,
        currency: String,
    },
    Rate {
        from: String,
        to: String,
    },
}

impl QuoteKey {
    pub fn price(class: AssetClass, symbol: &str, currency: &str) -> Self {
        QuoteKey::Price {
            class,
            symbol: symbol.to_uppercase(),
            currency: currency.to_uppercase(),
        }
    }

    pub fn rate(from: &str, to: &str) -> Self {
        QuoteKey::Rate {
            from: from.to_uppercase(),
            to: to.to_uppercase(),
        }
    }
}

impl Display for QuoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteKey::Price {
                class,
                symbol,
                currency,
            } => write!(f, "price:{class}:{symbol}:{currency}"),
            QuoteKey::Rate { from, to } => write!(f, "fx:{from}:{to}"),
        }
    }
}

/// A cached price or rate and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub value: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    pub fn now(value: Decimal) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
        }
    }
}

/// TTL key-value store for quotes, shared by concurrent requests.
///
/// A miss, an expired entry and an unreachable backend all look the same to
/// the caller: `None`. Writes never fail from the caller's point of view.
#[async_trait]
pub trait QuoteCache: Send + Sync {
    async fn get(&self, key: &QuoteKey) -> Option<Quote>;

    async fn set(&self, key: QuoteKey, quote: Quote, ttl: Duration);
}
