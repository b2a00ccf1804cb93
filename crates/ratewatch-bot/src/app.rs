//! Main application orchestration.
//!
//! Builds the feed/provider/aggregator graph from configuration, attaches
//! statistics listeners, and runs until shutdown.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use ratewatch_core::Quantity;
use ratewatch_feed::{Aggregator, ConsoleSink, DataFeed, OutputSink, ValueProvider};
use ratewatch_telemetry::PollStats;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Sink wrapper counting emitted lines.
struct CountingSink {
    inner: Arc<dyn OutputSink>,
    stats: Arc<PollStats>,
}

impl OutputSink for CountingSink {
    fn emit(&self, line: &str) {
        self.stats.record_line_emitted();
        self.inner.emit(line);
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    aggregator: Arc<Aggregator>,
    stats: Arc<PollStats>,
}

impl Application {
    /// Create an application emitting to the console.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_sink(config, Arc::new(ConsoleSink))
    }

    /// Create an application emitting to an explicit sink.
    pub fn with_sink(config: AppConfig, sink: Arc<dyn OutputSink>) -> AppResult<Self> {
        if config.providers.is_empty() {
            return Err(AppError::Config(
                "At least one provider must be configured".to_string(),
            ));
        }

        let stats = Arc::new(PollStats::new());

        // Feeds are shared: providers reference them by id.
        let mut feeds: HashMap<String, Arc<DataFeed>> = HashMap::new();
        for feed_config in &config.feeds {
            if feeds.contains_key(&feed_config.id) {
                return Err(AppError::Config(format!(
                    "Duplicate feed id: {}",
                    feed_config.id
                )));
            }

            let feed = Arc::new(DataFeed::new(
                feed_config.url.clone(),
                Duration::from_millis(feed_config.interval_ms),
            )?);

            let ok_stats = stats.clone();
            feed.add_data_listener(Arc::new(move |_feed| ok_stats.record_fetch_ok()))?;
            let err_stats = stats.clone();
            feed.add_error_listener(Arc::new(move |_feed| err_stats.record_fetch_err()))?;

            feeds.insert(feed_config.id.clone(), feed);
        }

        let mut providers: Vec<Arc<ValueProvider>> = Vec::with_capacity(config.providers.len());
        for provider_config in &config.providers {
            let quantity: Quantity = provider_config.quantity.parse()?;
            let feed = feeds.get(&provider_config.feed).ok_or_else(|| {
                AppError::Config(format!("Unknown feed id: {}", provider_config.feed))
            })?;

            providers.push(ValueProvider::new(
                quantity,
                feed.clone(),
                Arc::new(provider_config.extractor.clone()),
            )?);
        }

        let counting_sink = Arc::new(CountingSink {
            inner: sink,
            stats: stats.clone(),
        });
        let aggregator = Aggregator::with_debounce(
            providers,
            counting_sink,
            Duration::from_millis(config.aggregator.debounce_ms),
        )?;

        Ok(Self {
            config,
            aggregator,
            stats,
        })
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run(self) -> AppResult<()> {
        info!(
            feeds = self.config.feeds.len(),
            providers = self.config.providers.len(),
            debounce_ms = self.config.aggregator.debounce_ms,
            "Starting aggregation"
        );
        self.aggregator.start()?;

        let mut stats_interval = tokio::time::interval(Duration::from_secs(
            self.config.telemetry.stats_interval_secs.max(1),
        ));
        // The first tick completes immediately.
        stats_interval.tick().await;

        loop {
            tokio::select! {
                _ = stats_interval.tick() => {
                    self.stats.log_summary();
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.aggregator.stop()?;
        self.stats.log_summary();
        Ok(())
    }
}
