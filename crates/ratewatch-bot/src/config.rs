//! Application configuration.

use crate::error::{AppError, AppResult};
use ratewatch_feed::ExtractorSpec;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
///
/// The set of feeds and providers is fixed at startup; there is no runtime
/// reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Polled network resources.
    pub feeds: Vec<FeedConfig>,
    /// Value providers referencing feeds by id.
    pub providers: Vec<ProviderConfig>,
}

/// One polled network resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Identifier used by providers to reference this feed. Several
    /// providers may share one feed.
    pub id: String,
    /// Resource URL.
    pub url: String,
    /// Poll interval in milliseconds, must be > 0.
    pub interval_ms: u64,
}

/// One value provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Quantity name in snake_case (e.g. "btc_usd"). An unknown name is a
    /// configuration defect and aborts startup.
    pub quantity: String,
    /// Feed id this provider observes.
    pub feed: String,
    /// How to extract the value from the feed's payload.
    pub extractor: ExtractorSpec,
}

/// Aggregator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Debounce window in milliseconds. Default: 100.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Interval between poll statistics summaries (seconds). Default: 3600.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_stats_interval_secs() -> u64 {
    3600
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
