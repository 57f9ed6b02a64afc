use super::reporter::MissingTranslationBatch;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Collector-side view of one reported `(locale, key)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingLogEntry {
    pub locale: String,
    pub key: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Number of received batches that carried this pair.
    pub reports: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

/// Aggregates batches posted to the missing-translation endpoint.
#[derive(Debug, Default)]
pub struct MissingTranslationLog {
    entries: Mutex<BTreeMap<(String, String), MissingLogEntry>>,
}

impl MissingTranslationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<(String, String), MissingLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merges a batch and returns how many pairs were seen for the first time.
    pub fn ingest(&self, batch: MissingTranslationBatch) -> usize {
        if batch.total != batch.translations.len() {
            warn!(
                declared = batch.total,
                received = batch.translations.len(),
                "missing translation batch total does not match its entries"
            );
        }

        let mut entries = self.lock();
        let mut fresh = 0;

        for record in batch.translations {
            let slot = (record.locale.clone(), record.key.clone());
            match entries.get_mut(&slot) {
                Some(entry) => {
                    entry.first_seen = entry.first_seen.min(record.timestamp);
                    entry.last_seen = entry.last_seen.max(record.timestamp);
                    entry.reports += 1;
                    if record.context.is_some() {
                        entry.context = record.context;
                    }
                }
                None => {
                    warn!(
                        locale = %record.locale,
                        key = %record.key,
                        "missing translation reported"
                    );
                    fresh += 1;
                    entries.insert(
                        slot,
                        MissingLogEntry {
                            locale: record.locale,
                            key: record.key,
                            first_seen: record.timestamp,
                            last_seen: record.timestamp,
                            reports: 1,
                            context: record.context,
                        },
                    );
                }
            }
        }

        fresh
    }

    /// Entries ordered by locale, then key.
    pub fn entries(&self) -> Vec<MissingLogEntry> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::MissingTranslation;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn merges_repeated_pairs() {
        let log = MissingTranslationLog::new();
        let early = MissingTranslation::new("ru", "Units.title", None);
        let mut late = early.clone();
        late.timestamp = early.timestamp + Duration::seconds(30);
        let mut context = Map::new();
        context.insert("page".to_string(), json!("units"));
        late.context = Some(context);

        assert_eq!(log.ingest(MissingTranslationBatch::new(vec![late.clone()])), 1);
        assert_eq!(
            log.ingest(MissingTranslationBatch::new(vec![
                early.clone(),
                MissingTranslation::new("en", "Units.title", None),
            ])),
            1
        );

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].locale, "en");
        let ru = &entries[1];
        assert_eq!(ru.reports, 2);
        assert_eq!(ru.first_seen, early.timestamp);
        assert_eq!(ru.last_seen, late.timestamp);
        assert_eq!(ru.context.as_ref().and_then(|c| c.get("page")), Some(&json!("units")));
    }

    #[test]
    fn mismatched_total_is_still_ingested() {
        let log = MissingTranslationLog::new();
        let mut batch = MissingTranslationBatch::new(vec![MissingTranslation::new("th", "a", None)]);
        batch.total = 5;
        assert_eq!(log.ingest(batch), 1);
        assert_eq!(log.len(), 1);
    }
}
