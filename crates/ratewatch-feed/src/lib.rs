//! Polling data feeds, value providers and debounced aggregation.
//!
//! The pipeline: a `DataFeed` polls one HTTP resource on a fixed interval and
//! notifies listeners of raw bodies or errors; a `ValueProvider` extracts one
//! named `Decimal` quantity from those bodies and tracks staleness; the
//! `Aggregator` coalesces provider updates through a debounce window into a
//! single best-value-per-quantity line on an `OutputSink`.

pub mod aggregator;
pub mod error;
pub mod extract;
pub mod feed;
pub mod output;
pub mod provider;

pub use aggregator::{Aggregator, AggregationEntry, DEBOUNCE_WINDOW};
pub use error::{FeedError, FeedResult};
pub use extract::{Extract, ExtractorSpec};
pub use feed::{DataFeed, FeedListener};
pub use output::{ConsoleSink, MemorySink, OutputSink};
pub use provider::{ProviderListener, ValueProvider};
