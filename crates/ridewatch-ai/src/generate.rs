//! LLM text generation.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, config::DEFAULT_GEMINI_BASE_URL};

/// Shape the model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
  Json,
  Text,
}

/// A hosted text-generation model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn generate(
    &self,
    prompt: &str,
    format: ResponseFormat,
    temperature: f32,
  ) -> Result<String>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
  async fn generate(
    &self,
    prompt: &str,
    format: ResponseFormat,
    temperature: f32,
  ) -> Result<String> {
    (**self).generate(prompt, format, temperature).await
  }
}

/// Strip a surrounding markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fence(response: &str) -> &str {
  response
    .trim()
    .trim_start_matches("```json")
    .trim_start_matches("```")
    .trim_end_matches("```")
    .trim()
}

// ─── Gemini ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
  contents:          [Content<'a>; 1],
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
  parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature:        f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

impl GenerateResponse {
  /// Concatenated text parts of the first candidate.
  fn into_text(self) -> Result<String> {
    let text: String = self
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();
    if text.trim().is_empty() {
      return Err(Error::EmptyResponse);
    }
    Ok(text)
  }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
  api_key:  String,
  model:    String,
  base_url: String,
  http:     reqwest::Client,
}

impl GeminiClient {
  pub fn new(
    api_key: impl Into<String>,
    model: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    Ok(Self {
      api_key:  api_key.into(),
      model:    model.into(),
      base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
      http:     reqwest::Client::builder().timeout(timeout).build()?,
    })
  }

  pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
    self.base_url = url.into().trim_end_matches('/').to_owned();
    self
  }
}

#[async_trait]
impl TextGenerator for GeminiClient {
  async fn generate(
    &self,
    prompt: &str,
    format: ResponseFormat,
    temperature: f32,
  ) -> Result<String> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let body = GenerateRequest {
      contents:          [Content { parts: [Part { text: prompt }] }],
      generation_config: GenerationConfig {
        temperature,
        response_mime_type: match format {
          ResponseFormat::Json => Some("application/json"),
          ResponseFormat::Text => None,
        },
      },
    };

    debug!(model = %self.model, "gemini generateContent request");

    let response = self
      .http
      .post(&url)
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Api { status, body });
    }

    response.json::<GenerateResponse>().await?.into_text()
  }
}
