//! [`NewsScraper`] — search, enrich, deduplicate and persist market news.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{Datelike, Utc};
use ridewatch_core::{
  model::{Insertion, NewNewsItem, NewsItem},
  store::IntelStore,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
  Error, MultiSearch, NewsConfig, Result, SearchResult,
  enrich::{
    MARKET_QUERIES, category_query_terms, competitor_by_slug, detect_category,
    detect_competitors, detect_sentiment, detect_topics, site_filter,
  },
  result::truncate_chars,
};

const MAX_TITLE_CHARS: usize = 500;

fn default_language() -> String { "es".to_owned() }

/// A dashboard news search.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsQuery {
  pub query:        String,
  #[serde(default)]
  pub competitors:  Vec<String>,
  #[serde(default = "default_language")]
  pub language:     String,
  /// Provider to try first.
  #[serde(default)]
  pub provider:     Option<String>,
  /// Overrides the configured Peruvian-outlet restriction.
  #[serde(default)]
  pub peru_sources: Option<bool>,
}

impl NewsQuery {
  pub fn new(query: impl Into<String>) -> Self {
    Self {
      query:        query.into(),
      competitors:  Vec::new(),
      language:     default_language(),
      provider:     None,
      peru_sources: None,
    }
  }
}

/// Summary of a market scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketScan {
  pub total_items:   usize,
  pub by_competitor: BTreeMap<String, usize>,
  pub by_topic:      BTreeMap<String, usize>,
  pub items:         Vec<NewsItem>,
}

pub struct NewsScraper<S> {
  store:  Arc<S>,
  search: Arc<MultiSearch>,
  config: NewsConfig,
}

impl<S> NewsScraper<S>
where
  S: IntelStore,
{
  pub fn new(store: Arc<S>, search: Arc<MultiSearch>, config: NewsConfig) -> Self {
    Self { store, search, config }
  }

  pub fn providers(&self) -> &MultiSearch { &self.search }

  /// The user query plus competitor, region and recency qualifiers, and the
  /// site filter when searches are restricted to Peruvian outlets.
  pub fn enhance_query(&self, query: &NewsQuery, year: i32) -> String {
    let mut parts = vec![query.query.trim().to_owned()];
    if !query.competitors.is_empty() {
      parts.push(format!("Competitors: {}", query.competitors.join(", ")));
    }
    if !self.config.region_qualifier.is_empty() {
      parts.push(self.config.region_qualifier.clone());
    }
    parts.push(if query.language == "es" {
      format!("últimas noticias {year}")
    } else {
      format!("latest news {year}")
    });
    if query.peru_sources.unwrap_or(self.config.peru_sources)
      && let Some(filter) = site_filter(&self.config.sources)
    {
      parts.push(filter);
    }
    parts.join(" ")
  }

  /// Search, then persist every result not seen before. Returns only the
  /// newly stored items.
  pub async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>> {
    let enhanced = self.enhance_query(query, Utc::now().year());
    info!(query = %query.query, enhanced = %enhanced, "searching news");

    let results = self
      .search
      .search(&enhanced, self.config.max_results, query.provider.as_deref())
      .await;

    let mut saved = Vec::new();
    let mut skipped = 0usize;
    for result in results {
      if result.url.trim().is_empty() {
        skipped += 1;
        continue;
      }
      if self
        .store
        .news_item_exists(&result.unique_id)
        .await
        .map_err(|e| Error::Store(Box::new(e)))?
      {
        debug!(url = %result.url, "skipping known news item");
        skipped += 1;
        continue;
      }

      let input = to_news_item(&query.query, result);
      match self
        .store
        .insert_news_item(input)
        .await
        .map_err(|e| Error::Store(Box::new(e)))?
      {
        Insertion::Inserted(item) => saved.push(item),
        Insertion::Duplicate => skipped += 1,
      }
    }

    info!(query = %query.query, saved = saved.len(), skipped, "news search finished");
    Ok(saved)
  }

  /// News about one competitor, optionally narrowed by a category slug.
  pub async fn search_competitor_news(
    &self,
    slug: &str,
    category: Option<&str>,
  ) -> Result<Vec<NewsItem>> {
    let stored = self
      .store
      .find_competitor_by_slug(slug)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    let name = match (stored, competitor_by_slug(slug)) {
      (Some(c), _) => c.name,
      (None, Some(known)) => known.name.to_owned(),
      (None, None) => {
        warn!(slug, "unknown competitor, no news search");
        return Ok(Vec::new());
      }
    };

    let mut text = format!("{name} Peru noticias {}", Utc::now().year());
    if let Some(terms) = category.and_then(category_query_terms) {
      text.push(' ');
      text.push_str(&terms.join(" "));
    }

    let mut query = NewsQuery::new(text);
    query.competitors = vec![name];
    self.search(&query).await
  }

  /// Run every market query; one failing query is logged and skipped.
  pub async fn run_market_scan(&self) -> MarketScan {
    let year = Utc::now().year().to_string();
    let mut scan = MarketScan::default();

    for template in MARKET_QUERIES {
      let text = template.replace("{year}", &year);
      match self.search(&NewsQuery::new(text.as_str())).await {
        Ok(items) => {
          for item in &items {
            for slug in &item.competitors_mentioned {
              *scan.by_competitor.entry(slug.clone()).or_default() += 1;
            }
            for topic in &item.topics {
              *scan.by_topic.entry(topic.clone()).or_default() += 1;
            }
          }
          scan.total_items += items.len();
          scan.items.extend(items);
        }
        Err(e) => error!(query = %text, error = %e, "market scan query failed"),
      }
    }

    info!(total = scan.total_items, "market scan completed");
    scan
  }
}

/// Enrich a search hit into a storable news item.
fn to_news_item(search_query: &str, result: SearchResult) -> NewNewsItem {
  let text = format!("{} {}", result.title, result.snippet);
  let title = match result.title.trim() {
    "" => "Untitled".to_owned(),
    t => truncate_chars(t, MAX_TITLE_CHARS).to_owned(),
  };

  NewNewsItem {
    published_date:        result.published_date(),
    competitors_mentioned: detect_competitors(&text),
    topics:                detect_topics(&text),
    category:              detect_category(&text).to_owned(),
    sentiment:             detect_sentiment(&text),
    unique_id:             result.unique_id,
    search_query:          search_query.to_owned(),
    title,
    summary:               Some(result.snippet).filter(|s| !s.trim().is_empty()),
    source_url:            result.url,
    source_name:           result.source,
    provider:              result.provider.to_owned(),
    relevance_score:       result.score,
  }
}
