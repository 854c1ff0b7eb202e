use ridewatch_core::parse::DateFormats;
use serde::Deserialize;

/// `[ingest]` section of the server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  /// Tried in order when reading scraped dates.
  pub date_formats: DateFormats,
}
