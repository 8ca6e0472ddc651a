use crate::core::cache::{Quote, QuoteCache, QuoteKey};
use crate::core::error::ValuationError;
use crate::core::holding::{EntryUpdate, Holding, RefreshedValue};
use crate::core::store::HoldingStore;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

struct CacheValue {
    quote: Quote,
    // None when the ttl reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// In-memory quote cache, a mutex-guarded map with per-entry expiry
#[derive(Default)]
pub struct MemoryQuoteCache {
    inner: Arc<Mutex<HashMap<QuoteKey, CacheValue>>>,
}

impl MemoryQuoteCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuoteCache for MemoryQuoteCache {
    async fn get(&self, key: &QuoteKey) -> Option<Quote> {
        let mut cache = self.inner.lock().await;
        if let Some(entry) = cache.get(key) {
            if entry.expires_at.is_some_and(|at| at <= Instant::now()) {
                debug!("Cache entry expired for key: {}", key);
                cache.remove(key);
                return None;
            }
            debug!("Cache HIT for key: {}", key);
            return Some(entry.quote.clone());
        }
        debug!("Cache MISS for key: {}", key);
        None
    }

    async fn set(&self, key: QuoteKey, quote: Quote, ttl: Duration) {
        let expires_at = Instant::now().checked_add(ttl);
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", key);
        cache.insert(key, CacheValue { quote, expires_at });
    }
}

/// Holdings kept in insertion order, for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryHoldingStore {
    holdings: RwLock<Vec<Holding>>,
}

impl MemoryHoldingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holdings(holdings: Vec<Holding>) -> Self {
        Self {
            holdings: RwLock::new(holdings),
        }
    }
}

#[async_trait]
impl HoldingStore for MemoryHoldingStore {
    async fn load_holdings(&self, owner: &str) -> Result<Vec<Holding>, ValuationError> {
        let holdings = self.holdings.read().await;
        Ok(holdings.iter().filter(|h| h.owner == owner).cloned().collect())
    }

    async fn insert_holding(&self, holding: Holding) -> Result<(), ValuationError> {
        holding.validate()?;
        self.holdings.write().await.push(holding);
        Ok(())
    }

    async fn update_refresh_fields(
        &self,
        id: Uuid,
        symbol: &str,
        quantity: Decimal,
        refreshed: RefreshedValue,
    ) -> Result<(), ValuationError> {
        let mut holdings = self.holdings.write().await;
        let holding = holdings
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(ValuationError::NotFound(id))?;
        if !holding.tracks(symbol, quantity) {
            return Err(ValuationError::stale_refresh(id, symbol));
        }
        holding.refreshed = Some(refreshed);
        Ok(())
    }

    async fn update_entry(
        &self,
        owner: &str,
        id: Uuid,
        update: &EntryUpdate,
    ) -> Result<Holding, ValuationError> {
        let mut holdings = self.holdings.write().await;
        let holding = holdings
            .iter_mut()
            .find(|h| h.id == id && h.owner == owner)
            .ok_or(ValuationError::NotFound(id))?;
        let mut updated = holding.clone();
        update.apply_to(&mut updated);
        updated.validate()?;
        *holding = updated.clone();
        Ok(updated)
    }

    async fn delete_holding(&self, owner: &str, id: Uuid) -> Result<(), ValuationError> {
        let mut holdings = self.holdings.write().await;
        let before = holdings.len();
        holdings.retain(|h| !(h.id == id && h.owner == owner));
        if holdings.len() == before {
            return Err(ValuationError::NotFound(id));
        }
        Ok(())
    }
}
