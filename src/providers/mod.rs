pub mod alpha_vantage;
pub mod caching;
pub mod util;

pub use alpha_vantage::AlphaVantageClient;
pub use caching::{CachedFxProvider, CachedPriceProvider, FetchPolicy, QuoteTtls};
