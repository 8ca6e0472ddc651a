use crate::core::cache::{Quote, QuoteCache, QuoteKey};
use crate::core::error::ValuationError;
use crate::core::holding::{EntryUpdate, Holding, RefreshedValue};
use crate::core::store::HoldingStore;
use async_trait::async_trait;
use rust_decimal::Decimal;
use chrono::{DateTime, Utc};
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    quote: Quote,
    // None for a ttl too large to express as a timestamp.
    expires_at: Option<DateTime<Utc>>,
}

/// Quote cache in a fjall partition, surviving restarts.
///
/// Every storage or decoding failure is logged and reported as a miss.
pub struct DiskQuoteCache {
    partition: PartitionHandle,
}

impl DiskQuoteCache {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }

    fn read(&self, key: &QuoteKey) -> Result<Option<Quote>, ValuationError> {
        let raw_key = key.to_string();
        let Some(value) = self.partition.get(raw_key.as_str())? else {
            debug!("Cache MISS for key: {}", key);
            return Ok(None);
        };
        let entry: CacheEntry = serde_json::from_slice(&value)?;
        if entry.expires_at.is_some_and(|at| at <= Utc::now()) {
            debug!("Cache entry expired for key: {}", key);
            self.partition.remove(raw_key.as_str())?;
            return Ok(None);
        }
        debug!("Cache HIT for key: {}", key);
        Ok(Some(entry.quote))
    }

    fn write(&self, key: &QuoteKey, quote: Quote, ttl: Duration) -> Result<(), ValuationError> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        let entry = CacheEntry { quote, expires_at };
        let raw_key = key.to_string();
        self.partition
            .insert(raw_key.as_str(), serde_json::to_vec(&entry)?)?;
        debug!("Cache PUT for key: {}", key);
        Ok(())
    }
}

#[async_trait]
impl QuoteCache for DiskQuoteCache {
    async fn get(&self, key: &QuoteKey) -> Option<Quote> {
        self.read(key).unwrap_or_else(|e| {
            warn!("Quote cache read failed for {}: {}", key, e);
            None
        })
    }

    async fn set(&self, key: QuoteKey, quote: Quote, ttl: Duration) {
        if let Err(e) = self.write(&key, quote, ttl) {
            warn!("Quote cache write failed for {}: {}", key, e);
        }
    }
}

/// Holdings as JSON values keyed by id in a fjall partition.
pub struct DiskHoldingStore {
    partition: PartitionHandle,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl DiskHoldingStore {
    pub fn new(partition: PartitionHandle) -> Self {
        Self {
            partition,
            write_lock: Mutex::new(()),
        }
    }

    fn read(&self, id: Uuid) -> Result<Option<Holding>, ValuationError> {
        let raw_key = id.to_string();
        match self.partition.get(raw_key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn write(&self, holding: &Holding) -> Result<(), ValuationError> {
        let raw_key = holding.id.to_string();
        self.partition
            .insert(raw_key.as_str(), serde_json::to_vec(holding)?)?;
        Ok(())
    }
}

#[async_trait]
impl HoldingStore for DiskHoldingStore {
    async fn load_holdings(&self, owner: &str) -> Result<Vec<Holding>, ValuationError> {
        let mut holdings = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            let holding: Holding = serde_json::from_slice(&value)?;
            if holding.owner == owner {
                holdings.push(holding);
            }
        }
        holdings.sort_by_key(|h| h.created_at);
        debug!(owner, count = holdings.len(), "Loaded holdings");
        Ok(holdings)
    }

    async fn insert_holding(&self, holding: Holding) -> Result<(), ValuationError> {
        holding.validate()?;
        let _guard = self.write_lock.lock().await;
        self.write(&holding)
    }

    async fn update_refresh_fields(
        &self,
        id: Uuid,
        symbol: &str,
        quantity: Decimal,
        refreshed: RefreshedValue,
    ) -> Result<(), ValuationError> {
        let _guard = self.write_lock.lock().await;
        let mut holding = self.read(id)?.ok_or(ValuationError::NotFound(id))?;
        if !holding.tracks(symbol, quantity) {
            return Err(ValuationError::stale_refresh(id, symbol));
        }
        holding.refreshed = Some(refreshed);
        self.write(&holding)
    }

    async fn update_entry(
        &self,
        owner: &str,
        id: Uuid,
        update: &EntryUpdate,
    ) -> Result<Holding, ValuationError> {
        let _guard = self.write_lock.lock().await;
        let mut holding = self
            .read(id)?
            .filter(|h| h.owner == owner)
            .ok_or(ValuationError::NotFound(id))?;
        update.apply_to(&mut holding);
        holding.validate()?;
        self.write(&holding)?;
        Ok(holding)
    }

    async fn delete_holding(&self, owner: &str, id: Uuid) -> Result<(), ValuationError> {
        let _guard = self.write_lock.lock().await;
        if self.read(id)?.filter(|h| h.owner == owner).is_none() {
            return Err(ValuationError::NotFound(id));
        }
        let raw_key = id.to_string();
        self.partition.remove(raw_key.as_str())?;
        Ok(())
    }
}
