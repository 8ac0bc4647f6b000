//! Command execution for marketdash
//!
//! Wires the cache backend, transport, resolver and catalog together and maps
//! each CLI command onto one or more resolved queries.

use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::cache::{CacheStore, FetchOptions, FileStore, KeyValueStore, MemoryStore};
use crate::cli::{Command, Settings};
use crate::error::FetchError;
use crate::market::{Catalog, SimplePrice};
use crate::refresh::{RefreshConfig, RefreshHandle};
use crate::resolver::Resolver;
use crate::source::Query;
use crate::transport::HttpTransport;
use crate::trend::{linear_trend, portfolio_value, summarize};

/// Gas prices are reused for at most this many seconds
pub const GAS_MAX_AGE_SECS: u64 = 30;

/// Main application struct
pub struct App {
    resolver: Resolver,
    catalog: Catalog,
    options: FetchOptions,
}

impl App {
    pub fn new(resolver: Resolver, catalog: Catalog, options: FetchOptions) -> Self {
        Self {
            resolver,
            catalog,
            options,
        }
    }

    /// Builds the app from CLI settings
    ///
    /// Uses `--cache-dir` if given, else the XDG cache dir, else an in-memory
    /// cache when no home directory exists.
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let backend: Arc<dyn KeyValueStore> = match &settings.cache_dir {
            Some(dir) => Arc::new(FileStore::with_dir(dir.clone())),
            None => match FileStore::new() {
                Some(store) => Arc::new(store),
                None => {
                    warn!("no cache directory available, caching in memory only");
                    Arc::new(MemoryStore::new())
                }
            },
        };
        let transport = HttpTransport::new(settings.timeout)?;
        let resolver = Resolver::new(CacheStore::new(backend), Arc::new(transport));
        let mut catalog = Catalog::new();
        if let Some(key) = &settings.etherscan_key {
            catalog = catalog.with_etherscan_key(key.clone());
        }
        Ok(Self::new(resolver, catalog, settings.fetch))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Queries a command would resolve, in execution order
    pub fn queries(&self, command: &Command) -> Vec<Query> {
        match command {
            Command::Coins { limit } => vec![self.catalog.coins(*limit)],
            Command::Price { ids } => ids.iter().map(|id| self.catalog.simple_price(id)).collect(),
            Command::Chart { id, days, .. } => vec![self.catalog.market_chart(id, *days)],
            Command::Global => vec![self.catalog.global()],
            Command::Gas => vec![self.catalog.gas()],
            Command::Value { holdings } => holdings
                .iter()
                .map(|(id, _)| self.catalog.simple_price(id))
                .collect(),
            Command::Watch { id, .. } => vec![self.catalog.simple_price(id)],
        }
    }

    /// Describes the sources of every query a command would resolve
    pub fn explain(&self, command: &Command) -> Value {
        let queries: Vec<_> = self.queries(command).iter().map(Query::describe).collect();
        json!(queries)
    }

    /// Runs a command once and returns its JSON output
    ///
    /// `Watch` runs a single cycle here; use `watch` for the periodic form.
    pub async fn run(&self, command: &Command) -> Result<Value, FetchError> {
        match command {
            Command::Coins { limit } => {
                let data = self.resolver.resolve(&self.catalog.coins(*limit), &self.options).await?;
                let mut coins = data.into_coins().ok_or(FetchError::Exhausted)?;
                coins.truncate(*limit);
                Ok(serde_json::to_value(coins)?)
            }
            Command::Price { ids } => {
                let prices = self.prices(ids).await?;
                Ok(serde_json::to_value(prices)?)
            }
            Command::Chart { id, days, trend } => {
                let data = self
                    .resolver
                    .resolve(&self.catalog.market_chart(id, *days), &self.options)
                    .await?;
                let chart = data.into_market_chart().ok_or(FetchError::Exhausted)?;
                if *trend {
                    Ok(json!({
                        "id": id,
                        "days": days,
                        "trend": summarize(&chart),
                        "fitted": linear_trend(&chart.price_series()),
                    }))
                } else {
                    Ok(serde_json::to_value(chart)?)
                }
            }
            Command::Global => {
                let data = self.resolver.resolve(&self.catalog.global(), &self.options).await?;
                Ok(data.to_json())
            }
            Command::Gas => {
                let options = self
                    .options
                    .with_max_age(self.options.max_age_secs.min(GAS_MAX_AGE_SECS));
                let data = self.resolver.resolve(&self.catalog.gas(), &options).await?;
                Ok(data.to_json())
            }
            Command::Value { holdings } => {
                let ids: Vec<String> = holdings.iter().map(|(id, _)| id.clone()).collect();
                let prices = self.prices(&ids).await?;
                Ok(serde_json::to_value(portfolio_value(holdings, &prices))?)
            }
            Command::Watch { id, .. } => {
                let prices = self.prices(std::slice::from_ref(id)).await?;
                Ok(serde_json::to_value(prices)?)
            }
        }
    }

    /// Starts periodic price refreshes for one coin
    ///
    /// Cached prices are reused only while younger than the interval.
    pub fn watch(&self, id: &str, interval: Duration) -> RefreshHandle {
        let options = self
            .options
            .with_max_age(self.options.max_age_secs.min(interval.as_secs()));
        RefreshHandle::spawn(
            self.resolver.clone(),
            self.catalog.simple_price(id),
            options,
            RefreshConfig {
                interval,
                enabled: true,
            },
        )
    }

    /// Resolves prices for several coins concurrently and merges them
    ///
    /// Coins that fail are logged and left out; the call fails only if no
    /// coin resolved.
    async fn prices(&self, ids: &[String]) -> Result<SimplePrice, FetchError> {
        let queries: Vec<Query> = ids.iter().map(|id| self.catalog.simple_price(id)).collect();
        let results = join_all(
            queries
                .iter()
                .map(|query| self.resolver.resolve(query, &self.options)),
        )
        .await;

        let mut merged = SimplePrice::new();
        let mut last_error = None;
        for (id, result) in ids.iter().zip(results) {
            match result.map(|data| data.into_simple_price()) {
                Ok(Some(prices)) => merged.extend(prices),
                Ok(None) => last_error = Some(FetchError::Exhausted),
                Err(e) => {
                    warn!(coin = %id, error = %e, "no price available");
                    last_error = Some(e);
                }
            }
        }

        match (merged.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            (true, None) => Err(FetchError::Exhausted),
            (false, _) => Ok(merged),
        }
    }
}
