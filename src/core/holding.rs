//! Holdings: the single current position of an asset or a liability.
use crate::core::currency::validate_currency_code;
use crate::core::error::ValuationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Currency every market quote in this system is requested in.
pub const MARKET_PRICING_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cash,
    #[serde(alias = "stock")]
    Equity,
    Crypto,
    RealEstate,
    Bond,
    Gold,
    Silver,
    OtherAsset,
    CreditCard,
    Loan,
    Mortgage,
    LineOfCredit,
    OtherLiability,
}

/// Which side of the balance sheet a category sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingKind {
    Asset,
    Liability,
}

/// Market data family used to price a tracked holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Crypto,
    Commodity,
}

impl Category {
    pub const ASSETS: [Category; 8] = [
        Category::Cash,
        Category::Equity,
        Category::Crypto,
        Category::RealEstate,
        Category::Bond,
        Category::Gold,
        Category::Silver,
        Category::OtherAsset,
    ];

    pub const LIABILITIES: [Category; 5] = [
        Category::CreditCard,
        Category::Loan,
        Category::Mortgage,
        Category::LineOfCredit,
        Category::OtherLiability,
    ];

    pub fn kind(&self) -> HoldingKind {
        match self {
            Category::CreditCard
            | Category::Loan
            | Category::Mortgage
            | Category::LineOfCredit
            | Category::OtherLiability => HoldingKind::Liability,
            _ => HoldingKind::Asset,
        }
    }

    /// The market data family for categories that can be market-tracked.
    pub fn asset_class(&self) -> Option<AssetClass> {
        match self {
            Category::Equity => Some(AssetClass::Equity),
            Category::Crypto => Some(AssetClass::Crypto),
            Category::Gold | Category::Silver => Some(AssetClass::Commodity),
            _ => None,
        }
    }

    /// Currency the market price of this category is quoted in.
    ///
    /// This is authoritative for tracked holdings: a gold holding entered in
    /// EUR is still priced in USD.
    pub fn pricing_currency(&self) -> Option<&'static str> {
        self.asset_class().map(|_| MARKET_PRICING_CURRENCY)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cash => "cash",
            Category::Equity => "equity",
            Category::Crypto => "crypto",
            Category::RealEstate => "real_estate",
            Category::Bond => "bond",
            Category::Gold => "gold",
            Category::Silver => "silver",
            Category::OtherAsset => "other_asset",
            Category::CreditCard => "credit_card",
            Category::Loan => "loan",
            Category::Mortgage => "mortgage",
            Category::LineOfCredit => "line_of_credit",
            Category::OtherLiability => "other_liability",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "stock" => return Ok(Category::Equity),
            "commodity_gold" => return Ok(Category::Gold),
            "commodity_silver" => return Ok(Category::Silver),
            _ => {}
        }
        Category::ASSETS
            .iter()
            .chain(Category::LIABILITIES.iter())
            .find(|c| c.as_str() == normalized)
            .copied()
            .ok_or_else(|| ValuationError::Validation(format!("Unknown category: {s}")))
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetClass::Equity => "equity",
                AssetClass::Crypto => "crypto",
                AssetClass::Commodity => "commodity",
            }
        )
    }
}

/// Result of the last successful market refresh of a holding.
///
/// The pricing currency is stored next to the value so a later fallback
/// never has to guess it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshedValue {
    pub value: Decimal,
    pub currency: String,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub category: Category,
    /// User-entered value. Never written by refresh or valuation.
    pub entry_amount: Decimal,
    pub entry_currency: String,
    #[serde(default)]
    pub is_market_tracked: bool,
    #[serde(default)]
    pub tracking_symbol: Option<String>,
    #[serde(default)]
    pub tracking_quantity: Option<Decimal>,
    /// Written only by the refresh path.
    #[serde(default)]
    pub refreshed: Option<RefreshedValue>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Holding {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        entry_amount: Decimal,
        entry_currency: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            category,
            entry_amount,
            entry_currency: entry_currency.into(),
            is_market_tracked: false,
            tracking_symbol: None,
            tracking_quantity: None,
            refreshed: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Marks the holding as market-tracked with the given symbol and quantity.
    pub fn with_tracking(mut self, symbol: impl Into<String>, quantity: Decimal) -> Self {
        self.is_market_tracked = true;
        self.tracking_symbol = Some(symbol.into());
        self.tracking_quantity = Some(quantity);
        self
    }

    pub fn kind(&self) -> HoldingKind {
        self.category.kind()
    }

    /// Whether the holding is still tracked with exactly this symbol and quantity.
    pub fn tracks(&self, symbol: &str, quantity: Decimal) -> bool {
        self.is_market_tracked
            && self.tracking_symbol.as_deref() == Some(symbol)
            && self.tracking_quantity == Some(quantity)
    }

    pub fn current_native_value(&self) -> Option<Decimal> {
        self.refreshed.as_ref().map(|r| r.value)
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed.as_ref().map(|r| r.refreshed_at)
    }

    /// Symbol and quantity of a tracked holding.
    ///
    /// `Ok(None)` for untracked holdings, an error for a tracked holding that
    /// lacks either field.
    pub fn tracking(&self) -> Result<Option<(&str, Decimal)>, ValuationError> {
        if !self.is_market_tracked {
            return Ok(None);
        }
        match (self.tracking_symbol.as_deref(), self.tracking_quantity) {
            (Some(symbol), Some(quantity)) if !symbol.trim().is_empty() => {
                Ok(Some((symbol, quantity)))
            }
            _ => Err(ValuationError::Validation(format!(
                "holding {} is market-tracked but has no tracking symbol or quantity",
                self.id
            ))),
        }
    }

    /// Checks the shape rules a holding must satisfy before it can be valued.
    pub fn validate(&self) -> Result<(), ValuationError> {
        validate_currency_code(&self.entry_currency)?;
        if let Some((_, quantity)) = self.tracking()? {
            if self.category.asset_class().is_none() {
                return Err(ValuationError::Validation(format!(
                    "{} holdings cannot be market-tracked",
                    self.category
                )));
            }
            if quantity <= Decimal::ZERO {
                return Err(ValuationError::Validation(format!(
                    "holding {} has non-positive tracking quantity {quantity}",
                    self.id
                )));
            }
        }
        if let Some(refreshed) = &self.refreshed {
            validate_currency_code(&refreshed.currency)?;
        }
        Ok(())
    }
}

/// How a tracked holding's market link changes in an entry edit.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingUpdate {
    Track { symbol: String, quantity: Decimal },
    Untrack,
}

/// Owner-initiated edit of a holding's entry fields.
///
/// It has no way to express the refresh fields, and `RefreshedValue` has no
/// way to express entry fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryUpdate {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub entry_amount: Option<Decimal>,
    pub entry_currency: Option<String>,
    pub tracking: Option<TrackingUpdate>,
    pub notes: Option<String>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        *self == EntryUpdate::default()
    }

    /// Applies the edit. A change of category or market link discards the
    /// last refreshed value, which no longer describes the position.
    pub fn apply_to(&self, holding: &mut Holding) {
        if let Some(name) = &self.name {
            holding.name = name.clone();
        }
        if let Some(amount) = self.entry_amount {
            holding.entry_amount = amount;
        }
        if let Some(currency) = &self.entry_currency {
            holding.entry_currency = currency.clone();
        }
        if let Some(notes) = &self.notes {
            holding.notes = Some(notes.clone());
        }
        if let Some(category) = self.category {
            if category != holding.category {
                holding.category = category;
                holding.refreshed = None;
            }
        }
        match &self.tracking {
            Some(TrackingUpdate::Track { symbol, quantity }) => {
                holding.is_market_tracked = true;
                holding.tracking_symbol = Some(symbol.clone());
                holding.tracking_quantity = Some(*quantity);
                holding.refreshed = None;
            }
            Some(TrackingUpdate::Untrack) => {
                holding.is_market_tracked = false;
                holding.tracking_symbol = None;
                holding.tracking_quantity = None;
                holding.refreshed = None;
            }
            None => {}
        }
    }
}
