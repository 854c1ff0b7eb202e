//! AI text generation and review/release classification.
//!
//! [`TextGenerator`] abstracts a hosted LLM; [`GeminiClient`] talks to the
//! Gemini `generateContent` REST endpoint. [`Classifier`] labels reviews and
//! release notes, either through a generator ([`AiClassifier`]) or with
//! Spanish keyword rules ([`RuleClassifier`]). The AI path never fails: any
//! error falls back to the rules.

pub mod classify;
pub mod config;
pub mod error;
pub mod generate;

pub use classify::{
  AiClassifier, Classifier, ReleaseClassification, ReviewClassification,
  RuleClassifier, build_classifier,
};
pub use config::AiConfig;
pub use error::{Error, Result};
pub use generate::{GeminiClient, ResponseFormat, TextGenerator, strip_code_fence};
