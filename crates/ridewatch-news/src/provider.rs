//! The `SearchProvider` trait.

use async_trait::async_trait;

use crate::{Result, SearchResult};

/// Adapter over one external search or AI backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
  /// Display name; also what callers pass to prefer a provider.
  fn name(&self) -> &'static str;

  /// Lower is tried first.
  fn priority(&self) -> u8;

  fn is_configured(&self) -> bool;

  async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}
