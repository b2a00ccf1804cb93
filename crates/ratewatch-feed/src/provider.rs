//! Value providers.
//!
//! A `ValueProvider` adapts one `DataFeed` into one named numeric quantity:
//! it extracts a `Decimal` from each raw payload, keeps the last known value,
//! and notifies listeners only when the value actually changes. Staleness is
//! derived from the owning feed's last successful fetch.

use crate::error::{FeedError, FeedResult};
use crate::extract::Extract;
use crate::feed::DataFeed;
use parking_lot::RwLock;
use ratewatch_core::Quantity;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

/// Listener invoked with the provider itself on value-update notifications.
pub type ProviderListener = Arc<dyn Fn(&ValueProvider) + Send + Sync>;

/// Adapter turning a feed's raw payload into one quantity observation.
///
/// Providers do not own their feed exclusively; several providers may share
/// one feed, each extracting a different quantity from the same payload.
pub struct ValueProvider {
    quantity: Quantity,
    feed: Arc<DataFeed>,
    extractor: Arc<dyn Extract>,
    value: RwLock<Option<Decimal>>,
    update_listeners: RwLock<Vec<ProviderListener>>,
}

impl ValueProvider {
    /// Create a provider and subscribe it to `feed`'s data and error
    /// notifications.
    pub fn new(
        quantity: Quantity,
        feed: Arc<DataFeed>,
        extractor: Arc<dyn Extract>,
    ) -> FeedResult<Arc<Self>> {
        let provider = Arc::new(Self {
            quantity,
            feed,
            extractor,
            value: RwLock::new(None),
            update_listeners: RwLock::new(Vec::new()),
        });

        let weak = Arc::downgrade(&provider);
        provider.feed.add_data_listener(Arc::new(move |_feed| {
            if let Some(provider) = weak.upgrade() {
                provider.handle_data();
            }
        }))?;

        let weak = Arc::downgrade(&provider);
        provider.feed.add_error_listener(Arc::new(move |_feed| {
            if let Some(provider) = weak.upgrade() {
                provider.handle_error();
            }
        }))?;

        Ok(provider)
    }

    /// The quantity this provider reports.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// The feed this provider observes.
    pub fn feed(&self) -> &Arc<DataFeed> {
        &self.feed
    }

    /// Last known extracted value, if any. Zero is a valid value.
    pub fn value(&self) -> Option<Decimal> {
        *self.value.read()
    }

    /// Whether the last known value should be considered outdated.
    ///
    /// An unset value is never outdated, it is unknown. Otherwise the value
    /// is outdated once the owning feed has gone three update intervals
    /// without a successful fetch, evaluated at call time.
    pub fn is_out_dated(&self) -> bool {
        if self.value.read().is_none() {
            return false;
        }
        match self.feed.last_success() {
            Some(at) => at.elapsed() > self.feed.interval() * 3,
            None => false,
        }
    }

    /// Register a listener invoked when the extracted value changes.
    ///
    /// Registering the same listener instance twice fails with
    /// `DuplicateListener`.
    pub fn add_update_listener(&self, listener: ProviderListener) -> FeedResult<()> {
        let mut listeners = self.update_listeners.write();
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return Err(FeedError::DuplicateListener);
        }
        listeners.push(listener);
        Ok(())
    }

    /// Handle a data notification from the feed.
    pub(crate) fn handle_data(&self) {
        let Some(body) = self.feed.last_body() else {
            return;
        };

        match self.extractor.extract(&body) {
            None => {
                // Keep the previous value; an unparseable payload is not a
                // reason to forget what we knew.
                warn!(
                    quantity = %self.quantity,
                    url = %self.feed.url(),
                    "Payload could not be parsed into a meaningful value"
                );
            }
            Some(new_value) => {
                let changed = {
                    let mut value = self.value.write();
                    let changed = *value != Some(new_value);
                    *value = Some(new_value);
                    changed
                };
                // Equal values are suppressed to spare downstream recomputes.
                if changed {
                    self.notify_update();
                }
            }
        }
    }

    /// Handle an error notification from the feed.
    ///
    /// If the value has gone stale the downstream aggregation must get a
    /// chance to reflect that, so a notification fires even though no new
    /// value arrived.
    pub(crate) fn handle_error(&self) {
        if self.is_out_dated() {
            self.notify_update();
        }
    }

    fn notify_update(&self) {
        let listeners = self.update_listeners.read().clone();
        for listener in listeners {
            listener(self);
        }
    }
}
