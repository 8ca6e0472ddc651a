pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::manage::NewHolding;
use crate::core::config::AppConfig;
use crate::core::currency::{FxProvider, normalize_currency_code};
use crate::core::holding::EntryUpdate;
use crate::core::price::PriceProvider;
use crate::core::{
    HoldingStore, PortfolioAggregator, QuoteCache, RefreshCoordinator, ValuationEngine,
};
use crate::providers::{
    AlphaVantageClient, CachedFxProvider, CachedPriceProvider, FetchPolicy, QuoteTtls,
};
use crate::store::disk::{DiskHoldingStore, DiskQuoteCache};
use crate::store::memory::MemoryQuoteCache;
use anyhow::{Context, Result};
use fjall::{Keyspace, PersistMode};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub enum AppCommand {
    Summary { currency: Option<String> },
    Holdings { currency: Option<String> },
    Refresh { ids: Vec<Uuid> },
    Add(NewHolding),
    Edit { id: Uuid, update: EntryUpdate },
    Remove { id: Uuid },
}

/// Everything a command needs, wired from one configuration.
pub struct App {
    config: AppConfig,
    keyspace: Keyspace,
    store: Arc<dyn HoldingStore>,
    aggregator: PortfolioAggregator,
    refresher: RefreshCoordinator,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        let keyspace = store::open_keyspace(&data_path.join("db"))
            .with_context(|| format!("Failed to open data store at {}", data_path.display()))?;

        let holdings: Arc<dyn HoldingStore> = Arc::new(DiskHoldingStore::new(
            store::open_partition(&keyspace, store::HOLDINGS_PARTITION)?,
        ));
        let cache: Arc<dyn QuoteCache> = if config.cache.persist {
            Arc::new(DiskQuoteCache::new(store::open_partition(
                &keyspace,
                store::QUOTES_PARTITION,
            )?))
        } else {
            Arc::new(MemoryQuoteCache::new())
        };

        let alphavantage = &config.providers.alphavantage;
        let api_key = alphavantage.resolved_api_key().unwrap_or_else(|| {
            warn!(
                "No Alpha Vantage API key configured, set {}",
                crate::core::config::API_KEY_ENV
            );
            String::new()
        });
        let client = Arc::new(AlphaVantageClient::new(&alphavantage.base_url, &api_key)?);

        let policy = FetchPolicy::from(&config.fetch);
        let ttls = QuoteTtls::from(&config.cache);
        let prices: Arc<dyn PriceProvider> = Arc::new(CachedPriceProvider::new(
            client.clone(),
            cache.clone(),
            ttls,
            policy,
        ));
        let fx: Arc<dyn FxProvider> =
            Arc::new(CachedFxProvider::new(client, cache, ttls.fx, policy));

        let engine = Arc::new(ValuationEngine::new(prices.clone(), fx));
        let aggregator =
            PortfolioAggregator::new(holdings.clone(), engine, config.fetch.max_concurrent);
        let refresher =
            RefreshCoordinator::new(holdings.clone(), prices, config.fetch.max_concurrent);

        Ok(Self {
            config,
            keyspace,
            store: holdings,
            aggregator,
            refresher,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn HoldingStore> {
        self.store.clone()
    }

    pub fn aggregator(&self) -> &PortfolioAggregator {
        &self.aggregator
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    fn base_currency(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(code) => Ok(normalize_currency_code(code)?),
            None => Ok(self.config.currency.clone()),
        }
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush data store")
    }

    pub async fn execute(&self, command: AppCommand) -> Result<()> {
        let owner = self.config.owner.as_str();
        match command {
            AppCommand::Summary { currency } => {
                let base = self.base_currency(currency.as_deref())?;
                cli::summary::run(&self.aggregator, owner, &base).await
            }
            AppCommand::Holdings { currency } => {
                let base = self.base_currency(currency.as_deref())?;
                cli::holdings::run(&self.aggregator, owner, &base).await
            }
            AppCommand::Refresh { ids } => {
                cli::refresh::run(&self.refresher, owner, &ids).await?;
                self.persist()
            }
            AppCommand::Add(new) => {
                cli::manage::add(self.store.as_ref(), owner, new).await?;
                self.persist()
            }
            AppCommand::Edit { id, update } => {
                cli::manage::edit(self.store.as_ref(), owner, id, update).await?;
                self.persist()
            }
            AppCommand::Remove { id } => {
                cli::manage::remove(self.store.as_ref(), owner, id).await?;
                self.persist()
            }
        }
    }
}

pub async fn run_command(
    cmd: AppCommand,
    config_path: Option<&str>,
    owner: Option<&str>,
) -> Result<()> {
    info!("networth starting...");

    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    if let Some(owner) = owner {
        config.owner = owner.to_string();
    }
    debug!(owner = %config.owner, currency = %config.currency, "Loaded config");

    App::new(config)?.execute(cmd).await
}
