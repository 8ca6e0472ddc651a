//! Typed failures of the valuation core.
use crate::core::holding::Category;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by providers, stores and the valuation engine.
///
/// Cache backends never produce one of these: a cache that cannot be read
/// behaves like an empty cache.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValuationError {
    /// The external source could not be reached, timed out, rate limited us
    /// or answered with something we could not parse.
    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// The external source does not know the symbol.
    #[error("Unknown {class} symbol: {symbol}")]
    UnknownSymbol { symbol: String, class: String },

    /// The category has no market data source.
    #[error("No market data source for category: {0}")]
    UnsupportedCategory(Category),

    /// Malformed holding or request (missing tracking fields, bad currency code).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Holding not found: {0}")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ValuationError {
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ValuationError::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// A refreshed value priced for a market link the holding no longer has.
    pub fn stale_refresh(id: Uuid, symbol: &str) -> Self {
        ValuationError::Validation(format!(
            "holding {id} changed while {symbol} was being priced"
        ))
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ValuationError::ProviderUnavailable { .. })
    }
}

impl From<reqwest::Error> for ValuationError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest includes the full URL, and the query carries the API key.
        let msg = e.to_string();
        let sanitized = match msg.find('?') {
            Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
            None => msg,
        };
        ValuationError::unavailable("http", sanitized)
    }
}

impl From<fjall::Error> for ValuationError {
    fn from(e: fjall::Error) -> Self {
        ValuationError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::Storage(e.to_string())
    }
}
