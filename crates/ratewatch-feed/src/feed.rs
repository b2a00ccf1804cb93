//! Single-resource polling data feed.
//!
//! A `DataFeed` performs HTTP requests against one URL on a fixed interval
//! and notifies registered listeners as data arrives or errors occur. The
//! feed has an explicit running/stopped lifecycle; `stop()` guarantees that
//! no further poll is dispatched or scheduled once it returns, even if a
//! fetch was mid-flight.

use crate::error::{FeedError, FeedResult};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default timeout for a single poll request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Listener invoked with the feed itself on data or error notifications.
pub type FeedListener = Arc<dyn Fn(&DataFeed) + Send + Sync>;

#[derive(Default)]
struct FeedData {
    last_body: Option<Value>,
    last_success: Option<Instant>,
}

/// A polling subsystem for one network resource.
///
/// Feeds may be shared by multiple value providers; the poll task owns the
/// state exclusively and listener callbacks run one at a time from it.
pub struct DataFeed {
    url: String,
    interval: Duration,
    client: reqwest::Client,
    /// `Some` while running; the token cancels the poll task.
    lifecycle: Mutex<Option<CancellationToken>>,
    data: RwLock<FeedData>,
    data_listeners: RwLock<Vec<FeedListener>>,
    error_listeners: RwLock<Vec<FeedListener>>,
}

impl std::fmt::Debug for DataFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFeed")
            .field("url", &self.url)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl DataFeed {
    /// Create a new data feed for `url`, polled every `interval`.
    ///
    /// The interval must be non-zero.
    pub fn new(url: impl Into<String>, interval: Duration) -> FeedResult<Self> {
        let url = url.into();
        if interval.is_zero() {
            return Err(FeedError::InvalidInterval(url));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FeedError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url,
            interval,
            client,
            lifecycle: Mutex::new(None),
            data: RwLock::new(FeedData::default()),
            data_listeners: RwLock::new(Vec::new()),
            error_listeners: RwLock::new(Vec::new()),
        })
    }

    /// Resource URL this feed polls.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Configured poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the polling loop is currently active.
    pub fn running(&self) -> bool {
        self.lifecycle.lock().is_some()
    }

    /// Last successfully fetched body, if any.
    pub fn last_body(&self) -> Option<Value> {
        self.data.read().last_body.clone()
    }

    /// Monotonic time of the last successful fetch, if any.
    pub fn last_success(&self) -> Option<Instant> {
        self.data.read().last_success
    }

    /// Start polling. The first poll is issued immediately.
    ///
    /// Fails with `AlreadyRunning` if the feed is already started.
    pub fn start(self: &Arc<Self>) -> FeedResult<()> {
        let token = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.is_some() {
                return Err(FeedError::AlreadyRunning(self.url.clone()));
            }
            let token = CancellationToken::new();
            *lifecycle = Some(token.clone());
            token
        };

        debug!(url = %self.url, interval_ms = self.interval.as_millis() as u64, "Starting data feed");
        let feed = Arc::clone(self);
        tokio::spawn(async move {
            feed.poll_loop(token).await;
        });
        Ok(())
    }

    /// Stop polling and cancel any scheduled next poll.
    ///
    /// Fails with `NotRunning` if the feed is not started. Once this returns,
    /// an in-flight fetch completion will be discarded without dispatching
    /// notifications or scheduling a continuation.
    pub fn stop(&self) -> FeedResult<()> {
        let token = self
            .lifecycle
            .lock()
            .take()
            .ok_or_else(|| FeedError::NotRunning(self.url.clone()))?;
        debug!(url = %self.url, "Stopping data feed");
        token.cancel();
        Ok(())
    }

    /// Register a listener invoked on every successful fetch.
    ///
    /// Registering the same listener instance twice fails with
    /// `DuplicateListener`.
    pub fn add_data_listener(&self, listener: FeedListener) -> FeedResult<()> {
        Self::register(&self.data_listeners, listener)
    }

    /// Register a listener invoked on every failed fetch.
    pub fn add_error_listener(&self, listener: FeedListener) -> FeedResult<()> {
        Self::register(&self.error_listeners, listener)
    }

    fn register(listeners: &RwLock<Vec<FeedListener>>, listener: FeedListener) -> FeedResult<()> {
        let mut listeners = listeners.write();
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return Err(FeedError::DuplicateListener);
        }
        listeners.push(listener);
        Ok(())
    }

    async fn poll_loop(self: Arc<Self>, token: CancellationToken) {
        loop {
            let outcome = self.fetch_once().await;

            // A stop() during the in-flight fetch discards the result.
            if token.is_cancelled() {
                break;
            }

            match outcome {
                Ok(body) => self.record_success(body),
                Err(e) => self.record_failure(&e),
            }

            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }
        debug!(url = %self.url, "Data feed poll loop exited");
    }

    /// Issue one poll request and parse the body as JSON.
    async fn fetch_once(&self) -> FeedResult<Value> {
        let request_url = self.request_url();

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| FeedError::Http {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| FeedError::Http {
            url: self.url.clone(),
            reason: format!("Failed to parse body: {e}"),
        })
    }

    /// Build the request URL with a randomized cache-defeating parameter.
    fn request_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}nocache={}",
            self.url,
            separator,
            Uuid::new_v4().simple()
        )
    }

    /// Record a successful fetch and notify data listeners.
    pub(crate) fn record_success(&self, body: Value) {
        {
            let mut data = self.data.write();
            data.last_body = Some(body);
            data.last_success = Some(Instant::now());
        }
        for listener in self.snapshot(&self.data_listeners) {
            listener(self);
        }
    }

    /// Record a failed fetch and notify error listeners.
    ///
    /// `last_body` and `last_success` are left untouched.
    pub(crate) fn record_failure(&self, error: &FeedError) {
        warn!(url = %self.url, %error, "Data feed poll failed");
        for listener in self.snapshot(&self.error_listeners) {
            listener(self);
        }
    }

    fn snapshot(&self, listeners: &RwLock<Vec<FeedListener>>) -> Vec<FeedListener> {
        listeners.read().clone()
    }

    /// Rewind `last_success` so staleness can be asserted without sleeping.
    #[cfg(test)]
    pub(crate) fn backdate_last_success(&self, age: Duration) {
        self.data.write().last_success = Some(Instant::now() - age);
    }
}
