//! Source descriptors and queries
//!
//! A `Query` is an ordered list of alternative sources for one logical
//! request, most trusted first. Inapplicable sources are dropped when the
//! query is built, so the resolver only ever sees usable descriptors.

use serde::Serialize;

use crate::market::{ProviderKind, ResponseShape};

/// One way of fetching a logical request from one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// URL to GET
    pub endpoint: String,
    /// Cache key; the endpoint is used when absent
    pub cache_key: Option<String>,
    /// Canonical shape the response is normalized into
    pub shape: ResponseShape,
    /// Provider whose schema the response follows
    pub provider: ProviderKind,
}

impl SourceDescriptor {
    pub fn new(endpoint: impl Into<String>, shape: ResponseShape, provider: ProviderKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            cache_key: None,
            shape,
            provider,
        }
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Key into the cache store
    pub fn cache_key(&self) -> &str {
        self.cache_key.as_deref().unwrap_or(&self.endpoint)
    }
}

/// Ordered alternatives for one logical request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    sources: Vec<SourceDescriptor>,
}

impl Query {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self { sources }
    }

    /// Builds a query from optional candidates, keeping order and dropping `None`s
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Option<SourceDescriptor>>,
    {
        Self {
            sources: candidates.into_iter().flatten().collect(),
        }
    }

    /// Primary source plus one backup cached under `<cache_key>_backup`
    pub fn primary_with_backup(
        primary_url: impl Into<String>,
        backup_url: impl Into<String>,
        cache_key: &str,
        shape: ResponseShape,
        backup_provider: ProviderKind,
    ) -> Self {
        Self::new(vec![
            SourceDescriptor::new(primary_url, shape, ProviderKind::CoinGecko)
                .with_cache_key(cache_key),
            SourceDescriptor::new(backup_url, shape, backup_provider)
                .with_cache_key(format!("{cache_key}_backup")),
        ])
    }

    /// Appends a lower-priority source
    pub fn then(mut self, source: SourceDescriptor) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceDescriptor> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Shape of the first source
    pub fn shape(&self) -> Option<ResponseShape> {
        self.sources.first().map(|s| s.shape)
    }

    /// Human-readable summary of the sources, in order
    pub fn describe(&self) -> Vec<SourceSummary> {
        self.sources
            .iter()
            .map(|s| SourceSummary {
                provider: s.provider.to_string(),
                shape: s.shape,
                endpoint: s.endpoint.clone(),
                cache_key: s.cache_key().to_string(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = &'a SourceDescriptor;
    type IntoIter = std::slice::Iter<'a, SourceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

/// Serializable view of a source, for `--explain` output
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub provider: String,
    pub shape: ResponseShape,
    pub endpoint: String,
    pub cache_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gecko(url: &str) -> SourceDescriptor {
        SourceDescriptor::new(url, ResponseShape::Global, ProviderKind::CoinGecko)
    }

    #[test]
    fn test_cache_key_defaults_to_endpoint() {
        let source = gecko("https://api.example.com/global");
        assert_eq!(source.cache_key(), "https://api.example.com/global");

        let source = source.with_cache_key("global_stats");
        assert_eq!(source.cache_key(), "global_stats");
    }

    #[test]
    fn test_from_candidates_drops_missing_sources_in_order() {
        let query = Query::from_candidates([
            Some(gecko("https://a")),
            None,
            Some(gecko("https://b")),
            None,
        ]);

        let endpoints: Vec<&str> = query.iter().map(|s| s.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_primary_with_backup_keys() {
        let query = Query::primary_with_backup(
            "https://primary/coins",
            "https://backup/assets",
            "top_coins",
            ResponseShape::Coins,
            ProviderKind::CoinCap,
        );

        assert_eq!(query.len(), 2);
        assert_eq!(query.sources()[0].provider, ProviderKind::CoinGecko);
        assert_eq!(query.sources()[0].cache_key(), "top_coins");
        assert_eq!(query.sources()[1].provider, ProviderKind::CoinCap);
        assert_eq!(query.sources()[1].cache_key(), "top_coins_backup");
        assert_eq!(query.shape(), Some(ResponseShape::Coins));
    }

    #[test]
    fn test_empty_query() {
        let query = Query::from_candidates(Vec::<Option<SourceDescriptor>>::new());
        assert!(query.is_empty());
        assert!(query.shape().is_none());
    }

    #[test]
    fn test_describe_lists_sources() {
        let query = Query::new(vec![gecko("https://a")]).then(
            SourceDescriptor::new("https://b", ResponseShape::Global, ProviderKind::CoinCap)
                .with_cache_key("global_coincap"),
        );

        let summary = query.describe();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].provider, "coincap");
        assert_eq!(summary[1].cache_key, "global_coincap");
    }
}
