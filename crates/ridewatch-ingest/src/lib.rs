//! Webhook ingestion for ridewatch.
//!
//! A scraper posts one batch per task run. [`WebhookProcessor`] routes the
//! batch by its task name, coerces the loose records into typed rows, and
//! writes them through an [`IntelStore`]. Every invocation leaves exactly one
//! collection log behind.
//!
//! [`IntelStore`]: ridewatch_core::store::IntelStore

pub mod config;
pub mod error;
pub mod processor;
pub mod records;

pub use config::IngestConfig;
pub use error::{Error, Result};
pub use processor::{ProcessOutcome, WebhookPayload, WebhookProcessor};
