//! marketdash library
//!
//! Multi-provider crypto market data with a durable response cache. The
//! `Resolver` tries each source of a `Query` in order through the
//! `CacheStore`, normalizing every provider's schema into the canonical
//! shapes in `market`.

pub mod app;
pub mod cache;
pub mod cli;
pub mod error;
pub mod market;
pub mod refresh;
pub mod resolver;
pub mod source;
pub mod transport;
pub mod trend;

pub use cache::{CacheStore, FetchOptions};
pub use error::FetchError;
pub use market::{MarketData, ProviderKind, ResponseShape};
pub use resolver::Resolver;
pub use source::{Query, SourceDescriptor};
