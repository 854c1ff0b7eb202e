//! Review and release classification.
//!
//! [`AiClassifier`] asks a [`TextGenerator`] for a JSON verdict and falls back
//! to [`RuleClassifier`] on any failure, so callers never see an error.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ridewatch_core::model::{Sentiment, Significance, UserRole};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
  AiConfig, Error, Result,
  generate::{GeminiClient, ResponseFormat, TextGenerator, strip_code_fence},
};

/// Longest text (in characters) sent to the model.
const MAX_PROMPT_TEXT: usize = 1000;
const TEMPERATURE: f32 = 0.1;

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewClassification {
  #[serde(default)]
  pub role:       UserRole,
  #[serde(default)]
  pub sentiment:  Sentiment,
  #[serde(default)]
  pub categories: Vec<String>,
  #[serde(default)]
  pub key_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseClassification {
  #[serde(default)]
  pub categories:   Vec<String>,
  #[serde(default)]
  pub significance: Significance,
  #[serde(default)]
  pub summary:      Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Labels reviews and release notes. Infallible by contract.
#[async_trait]
pub trait Classifier: Send + Sync {
  async fn classify_review(&self, text: &str, rating: u8) -> ReviewClassification;

  async fn classify_release(&self, text: &str) -> ReleaseClassification;
}

/// Pick the classifier once, from configuration: AI when an API key is set,
/// rules otherwise.
pub fn build_classifier(config: &AiConfig) -> Arc<dyn Classifier> {
  let Some(key) = config.api_key() else {
    warn!("no google api key configured, using rule-based classification");
    return Arc::new(RuleClassifier);
  };

  match GeminiClient::new(key, &config.model, config.timeout())
    .map(|c| c.with_base_url(&config.base_url))
  {
    Ok(client) => {
      info!(model = %config.model, "gemini classifier initialised");
      Arc::new(
        AiClassifier::new(client, config.timeout())
          .with_summary_language(&config.summary_language),
      )
    }
    Err(e) => {
      warn!(error = %e, "failed to build gemini client, using rule-based classification");
      Arc::new(RuleClassifier)
    }
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

const DRIVER_CUES: &[&str] =
  &["conductor", "conducir", "ganancia", "comisión", "mis pasajeros"];
const RIDER_CUES: &[&str] = &["pasajero", "viaje", "espera", "llegó", "me cobr"];

const MAJOR_CUES: &[&str] = &["new", "nuevo", "feature", "función"];
const BUGFIX_CUES: &[&str] = &["fix", "bug", "error", "crash"];

pub const FALLBACK_SUMMARY: &str = "App update";

/// Keyword classifier for Spanish-language store content.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
  pub fn review(&self, text: &str, rating: u8) -> ReviewClassification {
    let lower = text.to_lowercase();
    let role = if DRIVER_CUES.iter().any(|kw| lower.contains(kw)) {
      UserRole::Driver
    } else if RIDER_CUES.iter().any(|kw| lower.contains(kw)) {
      UserRole::Rider
    } else {
      UserRole::Unknown
    };

    ReviewClassification {
      role,
      sentiment: sentiment_from_rating(rating),
      categories: vec!["other".to_owned()],
      key_topics: Vec::new(),
    }
  }

  pub fn release(&self, text: &str) -> ReleaseClassification {
    let lower = text.to_lowercase();
    let significance = if MAJOR_CUES.iter().any(|kw| lower.contains(kw)) {
      Significance::Major
    } else if BUGFIX_CUES.iter().any(|kw| lower.contains(kw)) {
      Significance::Bugfix
    } else {
      Significance::Minor
    };

    ReleaseClassification {
      categories: vec!["other".to_owned()],
      significance,
      summary: Some(FALLBACK_SUMMARY.to_owned()),
    }
  }
}

/// ≥4 stars positive, ≤2 negative, 3 neutral.
pub fn sentiment_from_rating(rating: u8) -> Sentiment {
  match rating {
    4.. => Sentiment::Positive,
    ..=2 => Sentiment::Negative,
    _ => Sentiment::Neutral,
  }
}

#[async_trait]
impl Classifier for RuleClassifier {
  async fn classify_review(&self, text: &str, rating: u8) -> ReviewClassification {
    self.review(text, rating)
  }

  async fn classify_release(&self, text: &str) -> ReleaseClassification {
    self.release(text)
  }
}

// ─── AI ──────────────────────────────────────────────────────────────────────

/// Classifier backed by a [`TextGenerator`], with rule fallback.
pub struct AiClassifier<G> {
  generator:        G,
  timeout:          Duration,
  summary_language: String,
  rules:            RuleClassifier,
}

impl<G: TextGenerator> AiClassifier<G> {
  pub fn new(generator: G, timeout: Duration) -> Self {
    Self {
      generator,
      timeout,
      summary_language: "English".to_owned(),
      rules: RuleClassifier,
    }
  }

  pub fn with_summary_language(mut self, language: impl Into<String>) -> Self {
    self.summary_language = language.into();
    self
  }

  async fn ask<T: for<'de> Deserialize<'de>>(&self, prompt: &str) -> Result<T> {
    let raw = tokio::time::timeout(
      self.timeout,
      self.generator.generate(prompt, ResponseFormat::Json, TEMPERATURE),
    )
    .await
    .map_err(|_| Error::Timeout(self.timeout.as_secs()))??;
    Ok(serde_json::from_str(strip_code_fence(&raw))?)
  }

  fn review_prompt(text: &str, rating: u8) -> String {
    format!(
      r#"You classify ride-hailing app store reviews from Peru.

Return ONLY a JSON object with these fields:
- role: "driver" | "rider" | "unknown"
- categories: array drawn from ["pricing", "ux_ui", "safety", "driver_exp", "rider_exp", "promo", "support", "wait_time", "payment", "other"]
- sentiment: "positive" | "neutral" | "negative"
- key_topics: 1-3 main topics, English, lowercase

The author is a driver when they talk about driving, earnings, commission or
"mis pasajeros"; a rider when they request trips or wait for a car; unknown
otherwise.

Review text: "{}"
Rating: {rating}/5
Language: Spanish (Peru)

Respond with JSON only, no markdown."#,
      truncate(text)
    )
  }

  fn release_prompt(&self, text: &str) -> String {
    format!(
      r#"Classify these release notes of a ride-hailing app.

Release notes: "{}"

Return ONLY a JSON object with:
- categories: array drawn from ["pricing", "ux_ui", "safety", "driver_exp", "rider_exp", "promo", "other"]
- summary: one sentence in {}, at most 100 characters
- significance: "major" (new features, significant UX or safety changes) | "minor" (improvements, small changes) | "bugfix" (fixes, stability, generic updates)

Respond with JSON only, no markdown."#,
      truncate(text),
      self.summary_language
    )
  }
}

fn truncate(text: &str) -> &str {
  match text.char_indices().nth(MAX_PROMPT_TEXT) {
    Some((end, _)) => &text[..end],
    None => text,
  }
}

#[async_trait]
impl<G: TextGenerator> Classifier for AiClassifier<G> {
  async fn classify_review(&self, text: &str, rating: u8) -> ReviewClassification {
    match self.ask(&Self::review_prompt(text, rating)).await {
      Ok(c) => c,
      Err(e) => {
        warn!(error = %e, "review classification failed, using rules");
        self.rules.review(text, rating)
      }
    }
  }

  async fn classify_release(&self, text: &str) -> ReleaseClassification {
    match self.ask(&self.release_prompt(text)).await {
      Ok(c) => c,
      Err(e) => {
        warn!(error = %e, "release classification failed, using rules");
        self.rules.release(text)
      }
    }
  }
}
