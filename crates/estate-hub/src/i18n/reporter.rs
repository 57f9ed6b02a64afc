//! Best-effort telemetry for translation keys that could not be resolved.
//!
//! Each `(locale, key)` pair is recorded once in a [`MissingTranslationStore`]. Every report
//! call then posts a batch to the collector endpoint, retrying with exponential backoff.
//! Delivery problems are logged and never reach the caller.

use super::catalog::Locale;
use super::translator::MissingKeySink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingTranslation {
    pub locale: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
    pub timestamp: DateTime<Utc>,
}

impl MissingTranslation {
    pub fn new(locale: &str, key: &str, context: Option<Map<String, Value>>) -> Self {
        Self {
            locale: locale.to_string(),
            key: key.to_string(),
            context,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> String {
        record_id(&self.locale, &self.key)
    }
}

/// Body posted to the collector endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingTranslationBatch {
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub translations: Vec<MissingTranslation>,
}

impl MissingTranslationBatch {
    pub fn new(translations: Vec<MissingTranslation>) -> Self {
        Self {
            timestamp: Utc::now(),
            total: translations.len(),
            translations,
        }
    }
}

/// Delivery progress of a recorded pair, as of the latest batch that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Recorded,
    Reporting,
    Reported,
    ReportFailed,
}

/// Which recorded pairs go into a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// Every pair recorded so far, on every send.
    #[default]
    Cumulative,
    /// Only pairs that are neither delivered nor in flight.
    Delta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Pause after the failed attempt with zero-based index `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn record_id(locale: &str, key: &str) -> String {
    format!("{locale}:{key}")
}

#[derive(Debug)]
struct StoredRecord {
    record: MissingTranslation,
    state: DeliveryState,
    /// Latest batch that carried the pair.
    batch: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    index: HashMap<String, usize>,
    records: Vec<StoredRecord>,
    batches: u64,
}

/// Deduplicating record of missing pairs, owned by whoever builds the reporter.
#[derive(Debug, Default)]
pub struct MissingTranslationStore {
    state: Mutex<StoreState>,
}

impl MissingTranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` when the pair was not known yet.
    pub fn record(&self, record: MissingTranslation) -> bool {
        let mut state = self.lock();
        let id = record.id();
        if state.index.contains_key(&id) {
            return false;
        }
        let position = state.records.len();
        state.records.push(StoredRecord {
            record,
            state: DeliveryState::Recorded,
            batch: 0,
        });
        state.index.insert(id, position);
        true
    }

    pub fn contains(&self, locale: &str, key: &str) -> bool {
        self.lock().index.contains_key(&record_id(locale, key))
    }

    pub fn state_of(&self, locale: &str, key: &str) -> Option<DeliveryState> {
        let state = self.lock();
        state
            .index
            .get(&record_id(locale, key))
            .and_then(|position| state.records.get(*position))
            .map(|stored| stored.state)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn snapshot(&self) -> Vec<MissingTranslation> {
        self.lock()
            .records
            .iter()
            .map(|stored| stored.record.clone())
            .collect()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.index.clear();
        state.records.clear();
    }

    /// Selects the pairs for the next batch and marks them as in flight.
    fn begin_batch(&self, mode: BatchMode) -> Option<PendingBatch> {
        let mut state = self.lock();
        let generation = state.batches + 1;
        let mut ids = Vec::new();
        let mut translations = Vec::new();

        for stored in state.records.iter_mut() {
            if mode == BatchMode::Delta
                && matches!(
                    stored.state,
                    DeliveryState::Reported | DeliveryState::Reporting
                )
            {
                continue;
            }
            // A delivered pair stays delivered when cumulative mode resends it.
            if stored.state != DeliveryState::Reported {
                stored.state = DeliveryState::Reporting;
            }
            stored.batch = generation;
            ids.push(stored.record.id());
            translations.push(stored.record.clone());
        }

        if translations.is_empty() {
            return None;
        }
        state.batches = generation;
        Some(PendingBatch {
            generation,
            ids,
            batch: MissingTranslationBatch::new(translations),
        })
    }

    /// Delivery always wins. A failure only sticks to pairs no newer batch has picked up.
    fn finish_batch(&self, pending: &PendingBatch, delivered: bool) {
        let mut state = self.lock();

        for id in &pending.ids {
            let Some(position) = state.index.get(id).copied() else {
                continue;
            };
            let Some(stored) = state.records.get_mut(position) else {
                continue;
            };
            if delivered {
                stored.state = DeliveryState::Reported;
            } else if stored.batch == pending.generation
                && stored.state == DeliveryState::Reporting
            {
                stored.state = DeliveryState::ReportFailed;
            }
        }
    }
}

#[derive(Debug)]
struct PendingBatch {
    generation: u64,
    ids: Vec<String>,
    batch: MissingTranslationBatch,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("collector answered with status {0}")]
    Status(u16),
    #[error("collector request failed: {0}")]
    Request(String),
    #[error("could not build http client: {0}")]
    Client(String),
}

/// Outbound seam so delivery can be exercised without a network.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn send(&self, batch: &MissingTranslationBatch) -> Result<(), TransportError>;
}

/// Posts batches as JSON to the collector endpoint.
#[derive(Debug, Clone)]
pub struct HttpReportTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReportTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReportTransport for HttpReportTransport {
    async fn send(&self, batch: &MissingTranslationBatch) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Delivered { attempts: u32, total: usize },
    Failed { attempts: u32, error: String },
    NothingToSend,
}

#[derive(Clone)]
pub struct MissingTranslationReporter {
    store: Arc<MissingTranslationStore>,
    transport: Arc<dyn ReportTransport>,
    retry: RetryPolicy,
    mode: BatchMode,
}

impl fmt::Debug for MissingTranslationReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissingTranslationReporter")
            .field("recorded", &self.store.len())
            .field("retry", &self.retry)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl MissingTranslationReporter {
    pub fn new(transport: Arc<dyn ReportTransport>) -> Self {
        Self {
            store: Arc::new(MissingTranslationStore::new()),
            transport,
            retry: RetryPolicy::default(),
            mode: BatchMode::default(),
        }
    }

    pub fn with_store(mut self, store: Arc<MissingTranslationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &Arc<MissingTranslationStore> {
        &self.store
    }

    /// Records the pair and sends a batch in the background.
    ///
    /// Outside a tokio runtime the pair is only recorded; it goes out with the next batch.
    pub fn report(&self, key: &str, locale: &str, context: Option<Map<String, Value>>) {
        self.record(key, locale, context);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let reporter = self.clone();
                handle.spawn(async move {
                    reporter.flush().await;
                });
            }
            Err(_) => {
                warn!(
                    locale,
                    key, "no async runtime available, missing translation kept for the next batch"
                );
            }
        }
    }

    pub async fn report_now(
        &self,
        key: &str,
        locale: &str,
        context: Option<Map<String, Value>>,
    ) -> ReportOutcome {
        self.record(key, locale, context);
        self.flush().await
    }

    /// Sends whatever the batch mode selects from the store.
    pub async fn flush(&self) -> ReportOutcome {
        let Some(pending) = self.store.begin_batch(self.mode) else {
            return ReportOutcome::NothingToSend;
        };

        let outcome = self.deliver(&pending.batch).await;
        self.store
            .finish_batch(&pending, matches!(outcome, ReportOutcome::Delivered { .. }));
        outcome
    }

    fn record(&self, key: &str, locale: &str, context: Option<Map<String, Value>>) {
        if self
            .store
            .record(MissingTranslation::new(locale, key, context))
        {
            debug!(locale, key, "missing translation recorded");
        }
    }

    async fn deliver(&self, batch: &MissingTranslationBatch) -> ReportOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            match self.transport.send(batch).await {
                Ok(()) => {
                    debug!(
                        attempts = attempt + 1,
                        total = batch.total,
                        "missing translations reported"
                    );
                    return ReportOutcome::Delivered {
                        attempts: attempt + 1,
                        total: batch.total,
                    };
                }
                Err(err) => {
                    warn!(attempt = attempt + 1, error = %err, "missing translation report failed");
                    last_error = err.to_string();
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        error!(
            attempts = max_attempts,
            total = batch.total,
            error = %last_error,
            "giving up on missing translation report"
        );
        ReportOutcome::Failed {
            attempts: max_attempts,
            error: last_error,
        }
    }
}

impl MissingKeySink for MissingTranslationReporter {
    fn missing(&self, locale: Locale, key: &str) {
        self.report(key, locale.code(), None);
    }
}
