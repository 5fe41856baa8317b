// 🔄 Scan Engine - One batch in, subscriptions + price changes out
// Dedup by provider, first email wins; one store lookup per provider

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::detector::PriceChangeDetector;
use crate::extractor::SubscriptionExtractor;
use crate::model::{ExtractedSubscription, PreviousSubscriptionRecord, PriceChange, RawEmail};
use crate::provider::ProviderCatalog;

// ============================================================================
// STORAGE COLLABORATOR
// ============================================================================

/// SubscriptionStore - The external storage-lookup collaborator
///
/// One lookup per unique provider seen in a batch. The core never writes
/// through this trait; persistence of scan results is the caller's job.
pub trait SubscriptionStore {
    fn previous_for(&self, provider: &str) -> Option<PreviousSubscriptionRecord>;
}

/// In-memory store backing tests and the CLI
pub struct InMemoryStore {
    records: HashMap<String, PreviousSubscriptionRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            records: HashMap::new(),
        }
    }

    pub fn from_records(records: Vec<PreviousSubscriptionRecord>) -> Self {
        InMemoryStore {
            records: records
                .into_iter()
                .map(|r| (r.provider.clone(), r))
                .collect(),
        }
    }

    pub fn insert(&mut self, record: PreviousSubscriptionRecord) {
        self.records.insert(record.provider.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionStore for InMemoryStore {
    fn previous_for(&self, provider: &str) -> Option<PreviousSubscriptionRecord> {
        self.records.get(provider).cloned()
    }
}

// ============================================================================
// SCAN OUTCOME
// ============================================================================

/// Everything one scan invocation produces. Handed to the caller
/// (HTTP route / persistence layer) as-is; the engine holds no state
/// between batches.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// One record per distinct provider, post-dedup
    pub subscriptions: Vec<ExtractedSubscription>,

    /// Zero or more, only for providers with a known, differing price
    pub price_changes: Vec<PriceChange>,
}

// ============================================================================
// SCAN ENGINE
// ============================================================================

/// ScanEngine - External-facing entry point of the extraction core
pub struct ScanEngine {
    extractor: SubscriptionExtractor,
    detector: PriceChangeDetector,
}

impl ScanEngine {
    pub fn new(catalog: ProviderCatalog) -> Self {
        ScanEngine {
            extractor: SubscriptionExtractor::new(catalog),
            detector: PriceChangeDetector::new(),
        }
    }

    pub fn with_defaults() -> Self {
        ScanEngine::new(ProviderCatalog::with_defaults())
    }

    /// Process one extraction batch.
    ///
    /// Within a batch, at most one subscription is kept per distinct
    /// normalized provider name; the first email encountered for a
    /// provider wins and later ones are discarded, not merged. A provider
    /// with multiple differently-priced emails in one batch therefore
    /// yields only the first-seen record.
    pub fn scan(&self, emails: &[RawEmail], store: &dyn SubscriptionStore) -> ScanOutcome {
        let mut seen_providers: HashSet<String> = HashSet::new();
        let mut outcome = ScanOutcome::default();

        for email in emails {
            let subscription = self.extractor.extract(email);

            if !seen_providers.insert(subscription.provider.clone()) {
                debug!(
                    "scan: dropping duplicate provider {} (email {})",
                    subscription.provider, email.id
                );
                continue;
            }

            let previous = store.previous_for(&subscription.provider);
            if let Some(change) = self.detector.detect(&subscription, previous.as_ref()) {
                debug!(
                    "scan: price change for {}: {:.2} -> {:.2}",
                    change.provider, change.old_price, change.new_price
                );
                outcome.price_changes.push(change);
            }

            outcome.subscriptions.push(subscription);
        }

        debug!(
            "scan: {} emails -> {} subscriptions, {} price changes",
            emails.len(),
            outcome.subscriptions.len(),
            outcome.price_changes.len()
        );

        outcome
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str, subject: &str, from: &str, snippet: &str) -> RawEmail {
        RawEmail {
            id: id.to_string(),
            subject: subject.to_string(),
            from: from.to_string(),
            date: "2025-02-01".to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn test_batch_dedup_first_email_wins() {
        let engine = ScanEngine::with_defaults();
        let store = InMemoryStore::new();

        let batch = vec![
            email(
                "m1",
                "Netflix renewal",
                "info@netflix.com",
                "Renews at $13.99/month",
            ),
            email(
                "m2",
                "Netflix price change",
                "info@netflix.com",
                "New price $15.99/month",
            ),
        ];

        let outcome = engine.scan(&batch, &store);

        assert_eq!(outcome.subscriptions.len(), 1);
        assert_eq!(outcome.subscriptions[0].email_id, "m1");
        assert_eq!(outcome.subscriptions[0].price, Some(13.99));
    }

    #[test]
    fn test_distinct_providers_all_kept() {
        let engine = ScanEngine::with_defaults();
        let store = InMemoryStore::new();

        let batch = vec![
            email("m1", "Netflix bill", "info@netflix.com", "$15.99"),
            email("m2", "Spotify bill", "info@spotify.com", "$9.99"),
        ];

        let outcome = engine.scan(&batch, &store);

        assert_eq!(outcome.subscriptions.len(), 2);
        assert!(outcome.price_changes.is_empty());
    }

    #[test]
    fn test_price_change_emitted_for_known_provider() {
        let engine = ScanEngine::with_defaults();
        let store = InMemoryStore::from_records(vec![PreviousSubscriptionRecord {
            provider: "Netflix".to_string(),
            price: 13.99,
            term_months: None,
            renewal_date: None,
        }]);

        let batch = vec![email(
            "m1",
            "Netflix price increase",
            "info@netflix.com",
            "Your new price is $15.99/month",
        )];

        let outcome = engine.scan(&batch, &store);

        assert_eq!(outcome.price_changes.len(), 1);
        let change = &outcome.price_changes[0];
        assert_eq!(change.provider, "Netflix");
        assert!((change.change - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_no_price_change_without_history() {
        let engine = ScanEngine::with_defaults();
        let store = InMemoryStore::new();

        let batch = vec![email(
            "m1",
            "Netflix price increase",
            "info@netflix.com",
            "Your new price is $15.99/month",
        )];

        let outcome = engine.scan(&batch, &store);

        assert_eq!(outcome.subscriptions.len(), 1);
        assert!(outcome.price_changes.is_empty());
    }

    #[test]
    fn test_unknown_emails_still_produce_records() {
        let engine = ScanEngine::with_defaults();
        let store = InMemoryStore::new();

        let batch = vec![email("m1", "hi", "", "nothing useful")];
        let outcome = engine.scan(&batch, &store);

        assert_eq!(outcome.subscriptions.len(), 1);
        assert_eq!(outcome.subscriptions[0].provider, "Unknown Service");
    }

    #[test]
    fn test_empty_batch() {
        let engine = ScanEngine::with_defaults();
        let store = InMemoryStore::new();

        let outcome = engine.scan(&[], &store);

        assert!(outcome.subscriptions.is_empty());
        assert!(outcome.price_changes.is_empty());
    }
}
