//! Market news search for ridewatch.
//!
//! Five [`SearchProvider`] adapters sit behind [`MultiSearch`], which tries
//! them in priority order and returns the first non-empty answer. The
//! [`NewsScraper`] service enriches results with keyword tables and persists
//! them, deduplicated by a digest of the normalised URL.

pub mod aggregate;
pub mod config;
pub mod enrich;
pub mod error;
pub mod provider;
pub mod providers;
pub mod result;
pub mod scraper;

pub use aggregate::{MultiSearch, ProviderInfo, ProviderStatus};
pub use config::{NewsConfig, SearchConfig};
pub use error::{Error, Result};
pub use provider::SearchProvider;
pub use result::SearchResult;
pub use scraper::{MarketScan, NewsQuery, NewsScraper};
