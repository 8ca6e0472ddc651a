//! Owner-initiated changes to holdings.
use super::ui;
use crate::core::currency::normalize_currency_code;
use crate::core::holding::{Category, EntryUpdate, Holding, TrackingUpdate};
use crate::core::store::HoldingStore;
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Input for a new holding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHolding {
    pub name: String,
    pub category: Category,
    pub amount: Decimal,
    pub currency: String,
    pub symbol: Option<String>,
    pub quantity: Option<Decimal>,
    pub notes: Option<String>,
}

impl NewHolding {
    pub fn into_holding(self, owner: &str) -> Result<Holding> {
        let currency = normalize_currency_code(&self.currency)?;
        let mut holding = Holding::new(owner, self.name, self.category, self.amount, currency);
        holding.notes = self.notes;
        match (self.symbol, self.quantity) {
            (Some(symbol), Some(quantity)) => {
                holding = holding.with_tracking(symbol.trim().to_uppercase(), quantity);
            }
            (None, None) => {}
            _ => bail!("A tracked holding needs both a symbol and a quantity"),
        }
        holding.validate()?;
        Ok(holding)
    }
}

pub async fn add(store: &dyn HoldingStore, owner: &str, new: NewHolding) -> Result<Holding> {
    let holding = new.into_holding(owner)?;
    store
        .insert_holding(holding.clone())
        .await
        .context("Failed to save holding")?;
    println!(
        "Added {} {}",
        holding.name,
        ui::style_text(&holding.id.to_string(), ui::StyleType::Subtle)
    );
    Ok(holding)
}

pub async fn edit(
    store: &dyn HoldingStore,
    owner: &str,
    id: Uuid,
    mut update: EntryUpdate,
) -> Result<Holding> {
    if update.is_empty() {
        bail!("Nothing to change");
    }
    if let Some(currency) = &update.entry_currency {
        update.entry_currency = Some(normalize_currency_code(currency)?);
    }
    if let Some(TrackingUpdate::Track { symbol, quantity }) = &update.tracking {
        update.tracking = Some(TrackingUpdate::Track {
            symbol: symbol.trim().to_uppercase(),
            quantity: *quantity,
        });
    }
    let holding = store
        .update_entry(owner, id, &update)
        .await
        .with_context(|| format!("Failed to update holding {id}"))?;
    println!("Updated {}", holding.name);
    Ok(holding)
}

pub async fn remove(store: &dyn HoldingStore, owner: &str, id: Uuid) -> Result<()> {
    store
        .delete_holding(owner, id)
        .await
        .with_context(|| format!("Failed to delete holding {id}"))?;
    println!("Deleted {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryHoldingStore;
    use rust_decimal_macros::dec;

    fn gold() -> NewHolding {
        NewHolding {
            name: "Gold coins".into(),
            category: Category::Gold,
            amount: dec!(1800),
            currency: " eur ".into(),
            symbol: Some("gold".into()),
            quantity: Some(dec!(1)),
            notes: None,
        }
    }

    #[test]
    fn test_new_holding_is_normalized() {
        let holding = gold().into_holding("dev").unwrap();
        assert_eq!(holding.entry_currency, "EUR");
        assert_eq!(holding.tracking_symbol.as_deref(), Some("GOLD"));
        assert!(holding.is_market_tracked);
    }

    #[test]
    fn test_new_holding_rules() {
        let half_tracked = NewHolding {
            quantity: None,
            ..gold()
        };
        assert!(half_tracked.into_holding("dev").is_err());

        let tracked_house = NewHolding {
            category: Category::RealEstate,
            ..gold()
        };
        assert!(tracked_house.into_holding("dev").is_err());

        let negative = NewHolding {
            quantity: Some(dec!(-1)),
            ..gold()
        };
        assert!(negative.into_holding("dev").is_err());
    }

    #[tokio::test]
    async fn test_edit_and_remove() -> Result<()> {
        let store = MemoryHoldingStore::new();
        let holding = add(&store, "dev", gold()).await?;

        assert!(edit(&store, "dev", holding.id, EntryUpdate::default()).await.is_err());

        let edited = edit(
            &store,
            "dev",
            holding.id,
            EntryUpdate {
                entry_currency: Some("usd".into()),
                tracking: Some(TrackingUpdate::Untrack),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(edited.entry_currency, "USD");
        assert!(!edited.is_market_tracked);

        assert!(remove(&store, "intruder", holding.id).await.is_err());
        remove(&store, "dev", holding.id).await?;
        assert!(store.load_holdings("dev").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_cannot_track_non_market_categories() -> Result<()> {
        let store = MemoryHoldingStore::new();
        let apple = add(
            &store,
            "dev",
            NewHolding {
                name: "Apple".into(),
                category: Category::Equity,
                amount: dec!(1400),
                currency: "USD".into(),
                symbol: Some("AAPL".into()),
                quantity: Some(dec!(10)),
                notes: None,
            },
        )
        .await?;
        let house = add(
            &store,
            "dev",
            NewHolding {
                name: "House".into(),
                category: Category::RealEstate,
                amount: dec!(300000),
                currency: "USD".into(),
                symbol: None,
                quantity: None,
                notes: None,
            },
        )
        .await?;

        let to_cash = EntryUpdate {
            category: Some(Category::Cash),
            ..Default::default()
        };
        assert!(edit(&store, "dev", apple.id, to_cash).await.is_err());

        let track_house = EntryUpdate {
            tracking: Some(TrackingUpdate::Track {
                symbol: "HOUSE".into(),
                quantity: dec!(1),
            }),
            ..Default::default()
        };
        assert!(edit(&store, "dev", house.id, track_house).await.is_err());

        let stored = store.load_holdings("dev").await?;
        assert_eq!(stored[0].category, Category::Equity);
        assert!(stored[0].is_market_tracked);
        assert!(!stored[1].is_market_tracked);

        // Untracking and recategorizing in one edit is fine.
        let to_cash = EntryUpdate {
            category: Some(Category::Cash),
            tracking: Some(TrackingUpdate::Untrack),
            ..Default::default()
        };
        let edited = edit(&store, "dev", apple.id, to_cash).await?;
        assert_eq!(edited.category, Category::Cash);
        assert!(!edited.is_market_tracked);
        Ok(())
    }
}
