// 📈 Price Change Detector - Delta between extracted and stored price
// Conservative gate: increase language is a precondition for any diff

use crate::model::{ExtractedSubscription, PreviousSubscriptionRecord, PriceChange};

/// PriceChangeDetector - Compares a fresh extraction against the user's
/// stored record for the same provider
///
/// Returning None is a normal outcome, not an error: it means no valid
/// change was computable for this provider.
pub struct PriceChangeDetector;

impl PriceChangeDetector {
    pub fn new() -> Self {
        PriceChangeDetector
    }

    /// Compute a price-change event, or None when:
    /// - the extraction carries no price
    /// - the email had no price-increase language (the gate; a numeric
    ///   decrease alone is never reported)
    /// - there is no previous record to compare against
    /// - old and new prices are equal
    pub fn detect(
        &self,
        extracted: &ExtractedSubscription,
        previous: Option<&PreviousSubscriptionRecord>,
    ) -> Option<PriceChange> {
        let new_price = extracted.price?;

        if !extracted.is_price_increase {
            return None;
        }

        let previous = previous?;
        let old_price = previous.price;

        if old_price == new_price {
            return None;
        }

        let change = new_price - old_price;
        let percentage_change = change / old_price * 100.0;

        Some(PriceChange {
            provider: extracted.provider.clone(),
            old_price,
            new_price,
            change,
            percentage_change,
            // Fresh values win; the stored record fills the gaps
            term_months: extracted.term_months.or(previous.term_months),
            renewal_date: extracted.renewal_date.or(previous.renewal_date),
        })
    }
}

impl Default for PriceChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
