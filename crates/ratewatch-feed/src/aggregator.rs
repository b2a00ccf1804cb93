//! Debounced aggregation across value providers.
//!
//! The aggregator owns a fixed list of providers, starts and stops their
//! underlying feeds (deduplicated when feeds are shared), and coalesces
//! bursts of update notifications through a debounce window into one
//! best-value-per-quantity line on the output sink.

use crate::error::FeedResult;
use crate::feed::DataFeed;
use crate::output::OutputSink;
use crate::provider::ValueProvider;
use parking_lot::Mutex;
use ratewatch_core::Quantity;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Coalescing window for update notifications.
///
/// Several providers sharing one feed fire within the same poll; all updates
/// within this window collapse into a single emission, bounding output
/// frequency regardless of provider count.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Per-quantity aggregation result, recomputed from scratch each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregationEntry {
    /// Providers reporting this quantity.
    pub total: usize,
    /// Providers whose value is present and not outdated.
    pub valid: usize,
    /// Maximum present value, zero when no provider has one.
    pub output_value: Decimal,
}

/// Feed values aggregator.
pub struct Aggregator {
    providers: Vec<Arc<ValueProvider>>,
    sink: Arc<dyn OutputSink>,
    debounce: Duration,
    /// Debounce state: `true` while a recompute is pending.
    pending: Mutex<bool>,
}

impl Aggregator {
    /// Create an aggregator over a fixed provider list with the default
    /// debounce window, subscribing to every provider's updates.
    pub fn new(
        providers: Vec<Arc<ValueProvider>>,
        sink: Arc<dyn OutputSink>,
    ) -> FeedResult<Arc<Self>> {
        Self::with_debounce(providers, sink, DEBOUNCE_WINDOW)
    }

    /// Create an aggregator with an explicit debounce window.
    pub fn with_debounce(
        providers: Vec<Arc<ValueProvider>>,
        sink: Arc<dyn OutputSink>,
        debounce: Duration,
    ) -> FeedResult<Arc<Self>> {
        let aggregator = Arc::new(Self {
            providers,
            sink,
            debounce,
            pending: Mutex::new(false),
        });

        // The provider list is immutable for the process lifetime, so
        // subscribing once at construction is sufficient.
        for provider in &aggregator.providers {
            let weak = Arc::downgrade(&aggregator);
            provider.add_update_listener(Arc::new(move |_provider| {
                if let Some(aggregator) = weak.upgrade() {
                    aggregator.schedule_recompute();
                }
            }))?;
        }

        Ok(aggregator)
    }

    /// Start every distinct underlying feed that is not already running.
    ///
    /// Feeds shared by multiple providers are started exactly once.
    pub fn start(&self) -> FeedResult<()> {
        for feed in self.distinct_feeds() {
            if !feed.running() {
                feed.start()?;
            }
        }
        Ok(())
    }

    /// Stop every distinct underlying feed that is running.
    pub fn stop(&self) -> FeedResult<()> {
        for feed in self.distinct_feeds() {
            if feed.running() {
                feed.stop()?;
            }
        }
        Ok(())
    }

    fn distinct_feeds(&self) -> Vec<Arc<DataFeed>> {
        let mut feeds: Vec<Arc<DataFeed>> = Vec::new();
        for provider in &self.providers {
            let feed = provider.feed();
            if !feeds.iter().any(|known| Arc::ptr_eq(known, feed)) {
                feeds.push(feed.clone());
            }
        }
        feeds
    }

    /// Arm the debounce timer; no-op while a recompute is already pending.
    fn schedule_recompute(self: Arc<Self>) {
        {
            let mut pending = self.pending.lock();
            if *pending {
                return;
            }
            *pending = true;
        }

        debug!(debounce_ms = self.debounce.as_millis() as u64, "Recompute scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(self.debounce).await;
            *self.pending.lock() = false;
            self.recompute_and_emit();
        });
    }

    /// Group providers by quantity and compute per-quantity entries.
    fn aggregate(&self) -> BTreeMap<Quantity, AggregationEntry> {
        let mut entries: BTreeMap<Quantity, AggregationEntry> = BTreeMap::new();
        for provider in &self.providers {
            let entry = entries.entry(provider.quantity()).or_default();
            entry.total += 1;
            if let Some(value) = provider.value() {
                if !provider.is_out_dated() {
                    entry.valid += 1;
                }
                // Stale values still display; valid only counts fresh ones.
                if value > entry.output_value {
                    entry.output_value = value;
                }
            }
        }
        entries
    }

    /// Recompute the snapshot and emit one formatted line.
    fn recompute_and_emit(&self) {
        let entries = self.aggregate();

        let mut values = Vec::with_capacity(entries.len());
        let mut sources = Vec::with_capacity(entries.len());
        for (quantity, entry) in &entries {
            values.push(format!("{}: {}", quantity.label(), entry.output_value));
            sources.push(format!(
                "{} ({} of {})",
                quantity.label(),
                entry.valid,
                entry.total
            ));
        }

        let line = format!(
            "{} Active sources: {}",
            values.join("\t"),
            sources.join("\t")
        );
        self.sink.emit(&line);
    }
}
