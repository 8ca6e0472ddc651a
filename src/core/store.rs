//! Persistence boundary for holdings.
use crate::core::error::ValuationError;
use crate::core::holding::{EntryUpdate, Holding, RefreshedValue};
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Durable storage of holdings.
///
/// The valuation core only ever calls `load_holdings` and
/// `update_refresh_fields`. Entry edits go through `update_entry` and are
/// reserved for owner-initiated changes.
#[async_trait]
pub trait HoldingStore: Send + Sync {
    /// All holdings of an owner, oldest first.
    async fn load_holdings(&self, owner: &str) -> Result<Vec<Holding>, ValuationError>;

    async fn insert_holding(&self, holding: Holding) -> Result<(), ValuationError>;

    /// Writes the refresh fields of a holding and nothing else.
    ///
    /// The value was priced for `symbol` and `quantity`. If an edit changed
    /// either since, nothing is written and a validation error is returned.
    async fn update_refresh_fields(
        &self,
        id: Uuid,
        symbol: &str,
        quantity: Decimal,
        refreshed: RefreshedValue,
    ) -> Result<(), ValuationError>;

    async fn update_entry(
        &self,
        owner: &str,
        id: Uuid,
        update: &EntryUpdate,
    ) -> Result<Holding, ValuationError>;

    async fn delete_holding(&self, owner: &str, id: Uuid) -> Result<(), ValuationError>;
}
