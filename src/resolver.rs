//! Multi-source resolver
//!
//! Resolves a `Query` by trying its sources strictly in order, each through
//! the cache store, and returning the first non-empty normalized result.
//! Per-source failures are logged and skipped; the caller only sees an error
//! once every source has been tried.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, FetchOptions};
use crate::error::FetchError;
use crate::market::{MarketData, Normalizers};
use crate::source::{Query, SourceDescriptor};
use crate::transport::Transport;

/// Resolves queries against the cache and the live providers
///
/// Cloning is cheap; clones share the cache backend and transport.
#[derive(Clone)]
pub struct Resolver {
    cache: CacheStore,
    transport: Arc<dyn Transport>,
    normalizers: Arc<Normalizers>,
}

impl Resolver {
    /// Creates a resolver with the built-in provider normalizers
    pub fn new(cache: CacheStore, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache,
            transport,
            normalizers: Arc::new(Normalizers::default()),
        }
    }

    /// Replaces the normalizer table
    pub fn with_normalizers(mut self, normalizers: Normalizers) -> Self {
        self.normalizers = Arc::new(normalizers);
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Resolves `query` to canonical data
    ///
    /// # Returns
    /// * `Ok(MarketData)` from the first source that yields non-empty data
    /// * `Err` with the last source's error if all sources failed or were empty,
    ///   or `FetchError::Exhausted` if none failed outright
    pub async fn resolve(
        &self,
        query: &Query,
        options: &FetchOptions,
    ) -> Result<MarketData, FetchError> {
        let mut last_error = None;

        for source in query {
            match self.attempt(source, options).await {
                Ok(Some(data)) => {
                    info!(
                        provider = %source.provider,
                        shape = %source.shape,
                        key = source.cache_key(),
                        "resolved"
                    );
                    return Ok(data);
                }
                Ok(None) => {
                    debug!(provider = %source.provider, shape = %source.shape, "empty result, trying next source");
                }
                Err(e) => {
                    warn!(provider = %source.provider, shape = %source.shape, error = %e, "source failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::Exhausted))
    }

    /// One cache-or-fetch attempt; `Ok(None)` means the data was empty
    ///
    /// A live payload is normalized before it is cached, so bodies that fail
    /// normalization (rejections, schema changes) are never stored.
    async fn attempt(
        &self,
        source: &SourceDescriptor,
        options: &FetchOptions,
    ) -> Result<Option<MarketData>, FetchError> {
        let cache = self.cache.clone();
        let transport = Arc::clone(&self.transport);
        let normalizers = Arc::clone(&self.normalizers);
        let key = source.cache_key().to_string();
        let url = source.endpoint.clone();
        let provider = source.provider.clone();
        let shape = source.shape;
        let options = *options;

        // Spawned so a fetch outlives an abandoned resolve and still gets cached.
        let data = tokio::spawn(async move {
            let validator = Arc::clone(&normalizers);
            let fetched_from = provider.clone();
            let payload = cache
                .get(
                    &key,
                    || async move {
                        let payload = transport.get_json(&url).await?;
                        validator.normalize(&fetched_from, shape, &payload)?;
                        Ok::<_, FetchError>(payload)
                    },
                    &options,
                )
                .await?;
            normalizers.normalize(&provider, shape, &payload)
        })
        .await
        .map_err(|e| FetchError::Transport(format!("fetch task failed: {e}")))??;

        Ok((!data.is_empty()).then_some(data))
    }
}
