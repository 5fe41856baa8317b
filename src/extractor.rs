// 🧩 Subscription Extractor - One ExtractedSubscription per email
// Variant dispatch up front: an email is Apple or Generic, never both

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::FieldClassifier;
use crate::model::{ExtractedSubscription, Frequency, RawEmail};
use crate::price::PriceExtractor;
use crate::provider::{ProviderCatalog, ProviderNormalizer, UNKNOWN_SERVICE};

// ============================================================================
// EXTRACTION VARIANT
// ============================================================================

/// Which extraction path applies to an email. Selected once, before any
/// field work; the Apple path replaces the generic one, it never merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionVariant {
    Generic,
    Apple,
}

// "App Babbel Subscription", "App Calm Subscription renewed"
static APP_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)app\s+([a-z0-9][a-z0-9 ]{0,40}?)\s+subscription")
        .expect("invalid app-name pattern")
});

// App Store receipts price their term as "€X.XX/N months"
static APPLE_PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)€\s*(\d+[.,]\d+)\s*/\s*(\d+)\s*months?")
        .expect("invalid apple price pattern")
});

// ============================================================================
// SUBSCRIPTION EXTRACTOR
// ============================================================================

/// SubscriptionExtractor - Combines normalizer, classifier and price
/// extractor into one structured record per email
///
/// Never fails: any heuristic miss leaves its field at the default, and
/// the returned record is always fully populated.
pub struct SubscriptionExtractor {
    normalizer: ProviderNormalizer,
    classifier: FieldClassifier,
    prices: PriceExtractor,
}

impl SubscriptionExtractor {
    pub fn new(catalog: ProviderCatalog) -> Self {
        SubscriptionExtractor {
            normalizer: ProviderNormalizer::new(catalog),
            classifier: FieldClassifier::new(),
            prices: PriceExtractor::new(),
        }
    }

    /// Extractor with the default provider catalog
    pub fn with_defaults() -> Self {
        SubscriptionExtractor::new(ProviderCatalog::with_defaults())
    }

    pub fn normalizer(&self) -> &ProviderNormalizer {
        &self.normalizer
    }

    /// Classify which extraction path applies, before any field work
    pub fn variant_for(&self, email: &RawEmail) -> ExtractionVariant {
        let from = email.from.to_lowercase();
        let subject = email.subject.to_lowercase();

        let apple_sender = from.contains("apple.com") || from.contains("itunes");
        let apple_subject =
            subject.contains("app store") || (subject.contains("apple") && subject.contains("receipt"));

        if apple_sender || apple_subject {
            ExtractionVariant::Apple
        } else {
            ExtractionVariant::Generic
        }
    }

    /// Extract one structured subscription record from one email
    pub fn extract(&self, email: &RawEmail) -> ExtractedSubscription {
        match self.variant_for(email) {
            ExtractionVariant::Generic => self.extract_generic(email),
            ExtractionVariant::Apple => self.extract_apple(email),
        }
    }

    // ------------------------------------------------------------------------
    // Generic path
    // ------------------------------------------------------------------------

    fn extract_generic(&self, email: &RawEmail) -> ExtractedSubscription {
        let mut provider = self.normalizer.normalize(&email.from);

        // From header gave nothing; the subject sometimes names the service
        if provider == UNKNOWN_SERVICE {
            if let Some(name) = self.normalizer.normalize_subject(&email.subject) {
                provider = name;
            }
        }

        let body = email.body_text();
        let classification = self.classifier.classify(&email.subject, &email.snippet);
        let price = self.prices.extract(&body);

        let frequency = derive_frequency(classification.term_months, &body);

        ExtractedSubscription {
            provider,
            price,
            frequency,
            renewal_date: classification.renewal_date,
            term_months: classification.term_months,
            is_price_increase: classification.is_price_increase,
            last_detected: Utc::now(),
            email_id: email.id.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Apple path
    // ------------------------------------------------------------------------

    /// App Store receipts name the service inside the body text, not in the
    /// From header, and price the whole term at once. Provider and price
    /// come from the Apple patterns; renewal-date and price-increase flags
    /// still come from the shared classifier.
    fn extract_apple(&self, email: &RawEmail) -> ExtractedSubscription {
        let body = email.body_text();
        let body_lower = body.to_lowercase();

        let provider = if body_lower.contains("babbel") {
            "Babbel".to_string()
        } else if let Some(caps) = APP_NAME_PATTERN.captures(&body) {
            caps.get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Apple".to_string())
        } else {
            // Receipt is from Apple but names no app we can recognize
            "Apple".to_string()
        };

        let (price, term_months) = match APPLE_PRICE_PATTERN.captures(&body) {
            Some(caps) => {
                let amount = caps
                    .get(1)
                    .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok());
                let months = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());

                match (amount, months) {
                    // N = 1 yields price 0: preserved source behavior,
                    // flagged for product review in DESIGN.md
                    (Some(amount), Some(n)) if n > 1 => (Some(amount / n as f64), Some(n)),
                    (Some(_), Some(n)) if n == 1 => (Some(0.0), Some(1)),
                    _ => (None, None),
                }
            }
            None => (None, None),
        };

        let classification = self.classifier.classify(&email.subject, &email.snippet);
        let frequency = derive_frequency(term_months, &body);

        ExtractedSubscription {
            provider,
            price,
            frequency,
            renewal_date: classification.renewal_date,
            term_months,
            is_price_increase: classification.is_price_increase,
            last_detected: Utc::now(),
            email_id: email.id.clone(),
        }
    }
}

impl Default for SubscriptionExtractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// FREQUENCY DERIVATION
// ============================================================================

/// Term length wins over keywords; keywords win over the monthly default.
/// A 12-month term still counts as monthly billing (the cutoff is > 12).
fn derive_frequency(term_months: Option<u32>, text: &str) -> Frequency {
    if let Some(months) = term_months {
        return if months > 12 {
            Frequency::Yearly
        } else {
            Frequency::Monthly
        };
    }

    let text_lower = text.to_lowercase();
    if text_lower.contains("yearly") || text_lower.contains("annual") {
        Frequency::Yearly
    } else if text_lower.contains("monthly") {
        Frequency::Monthly
    } else {
        Frequency::Monthly
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn email(subject: &str, from: &str, snippet: &str) -> RawEmail {
        RawEmail {
            id: "msg-1".to_string(),
            subject: subject.to_string(),
            from: from.to_string(),
            date: "2025-02-01".to_string(),
            snippet: snippet.to_string(),
        }
    }

    fn extractor() -> SubscriptionExtractor {
        SubscriptionExtractor::with_defaults()
    }

    #[test]
    fn test_generic_extraction_full_record() {
        let e = email(
            "Your Netflix renewal confirmation",
            "info@netflix.com",
            "Your plan renews at $15.99/month. Renewal date: 04/03/2025",
        );

        let sub = extractor().extract(&e);

        assert_eq!(sub.provider, "Netflix");
        assert_eq!(sub.price, Some(15.99));
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(
            sub.renewal_date,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 4)
        );
        assert_eq!(sub.email_id, "msg-1");
    }

    #[test]
    fn test_provider_falls_back_to_subject() {
        // From header is useless; the subject names the service
        let e = email("Spotify Premium receipt", "??", "Thanks for your payment");
        let sub = extractor().extract(&e);

        assert_eq!(sub.provider, "Spotify");
    }

    #[test]
    fn test_price_never_read_from_sender() {
        // Digits in the From header must not leak into the price
        let e = email("Hello", "mailer99@relay42.example.com", "no amounts here");
        let sub = extractor().extract(&e);

        assert_eq!(sub.price, None);
    }

    #[test]
    fn test_all_heuristics_miss_yields_defaults() {
        let e = email("", "", "");
        let sub = extractor().extract(&e);

        assert_eq!(sub.provider, UNKNOWN_SERVICE);
        assert_eq!(sub.price, None);
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.renewal_date, None);
        assert_eq!(sub.term_months, None);
        assert!(!sub.is_price_increase);
    }

    #[test]
    fn test_yearly_keyword_sets_frequency() {
        let e = email(
            "Invoice",
            "billing@unknownvendor.xyz",
            "Your annual plan costs $99",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.frequency, Frequency::Yearly);
    }

    #[test]
    fn test_term_length_beats_keywords() {
        // 24-month term is yearly even though the text says "monthly"
        let e = email(
            "Contract",
            "billing@unknownvendor.xyz",
            "term of 24 months, billed monthly",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.term_months, Some(24));
        assert_eq!(sub.frequency, Frequency::Yearly);
    }

    #[test]
    fn test_twelve_month_term_is_monthly() {
        let e = email(
            "Contract",
            "billing@unknownvendor.xyz",
            "for a term of 12 months",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.frequency, Frequency::Monthly);
    }

    #[test]
    fn test_apple_variant_detection() {
        let x = extractor();

        let apple = email("Your receipt from Apple", "no_reply@email.apple.com", "");
        assert_eq!(x.variant_for(&apple), ExtractionVariant::Apple);

        let generic = email("Netflix bill", "info@netflix.com", "");
        assert_eq!(x.variant_for(&generic), ExtractionVariant::Generic);
    }

    #[test]
    fn test_apple_path_app_name_and_monthly_price() {
        let e = email(
            "Your receipt from Apple",
            "no_reply@email.apple.com",
            "App Calm Subscription, €32.97/3 months",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.provider, "Calm");
        assert_eq!(sub.term_months, Some(3));
        let price = sub.price.expect("apple price");
        assert!((price - 10.99).abs() < 0.001);
    }

    #[test]
    fn test_apple_path_babbel_override() {
        // Babbel wins even when the generic App pattern would also match
        let e = email(
            "Your receipt from Apple",
            "no_reply@email.apple.com",
            "App Babbel Language Learning Subscription, €59.94/6 months",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.provider, "Babbel");
        let price = sub.price.expect("apple price");
        assert!((price - 9.99).abs() < 0.001);
    }

    #[test]
    fn test_apple_path_single_month_price_is_zero() {
        // Preserved source behavior: a one-month period prices as 0
        let e = email(
            "Your receipt from Apple",
            "no_reply@email.apple.com",
            "App Calm Subscription, €9.99/1 month",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.price, Some(0.0));
        assert_eq!(sub.term_months, Some(1));
    }

    #[test]
    fn test_apple_path_replaces_generic_provider() {
        // The From header would normalize via the catalog ("apple music" is
        // not present here, but the domain path would yield "Email"); the
        // Apple path must override with the app name instead
        let e = email(
            "Your receipt from Apple",
            "no_reply@email.apple.com",
            "App Duolingo Subscription, €23.94/6 months",
        );
        let sub = extractor().extract(&e);

        assert_eq!(sub.provider, "Duolingo");
    }

    #[test]
    fn test_idempotence_modulo_timestamp() {
        let e = email(
            "Price increase notice",
            "billing@netflix.com",
            "New price $17.99/month from 01 May 2025",
        );
        let x = extractor();

        let first = x.extract(&e);
        let second = x.extract(&e);

        assert_eq!(first.provider, second.provider);
        assert_eq!(first.price, second.price);
        assert_eq!(first.frequency, second.frequency);
        assert_eq!(first.renewal_date, second.renewal_date);
        assert_eq!(first.term_months, second.term_months);
        assert_eq!(first.is_price_increase, second.is_price_increase);
        assert_eq!(first.email_id, second.email_id);
    }
}
