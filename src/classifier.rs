// 🔎 Field Classifier - Keyword and date probes over subject+snippet
// Independent flags; only the message kind is first-match-wins

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// MESSAGE KIND
// ============================================================================

/// Kind of subscription message, set at most once by the first matching
/// probe in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    RenewalConfirmation,
}

/// Kind probes in priority order. Each entry is (kind, keyword list);
/// the first keyword hit anywhere in the list decides the kind.
const KIND_PROBES: &[(MessageKind, &[&str])] = &[(
    MessageKind::RenewalConfirmation,
    &[
        "renewal confirmation",
        "subscription renewal",
        "has been renewed",
        "renewed successfully",
        "will renew",
        "will automatically renew",
        "renewal notice",
    ],
)];

/// Price-increase language, independent of message kind and of any
/// computed numeric delta
const PRICE_INCREASE_KEYWORDS: &[&str] = &[
    "price increase",
    "rate increase",
    "new rate",
    "new price",
    "price change",
    "rate change",
    "price adjustment",
    "rate adjustment",
];

// "renewal date: 04/03/2025", "next billing on 15 March 2025"
static RENEWAL_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:renewal|next billing|next payment)\s+(?:date|on|at):?\s*(\d{1,2}/\d{1,2}/\d{4}|\d{1,2}\s+[a-z]{3,9}\.?\s+\d{4})",
    )
    .expect("invalid renewal-date pattern")
});

// "term of 12 months", "duration 1 year", "period of 6 mo"
static TERM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:term|duration|period)\s+(?:of\s+)?(\d{1,3})\s*(year|month|yr|mo)")
        .expect("invalid term pattern")
});

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

/// Result of one classification pass. Every field besides `kind` is an
/// independent flag; several can be set by the same text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub kind: Option<MessageKind>,
    pub renewal_date: Option<NaiveDate>,
    pub term_months: Option<u32>,
    pub is_price_increase: bool,
}

// ============================================================================
// FIELD CLASSIFIER
// ============================================================================

/// FieldClassifier - Scans subject+snippet for subscription signals
///
/// Pure and infallible; a probe that misses leaves its field at the
/// default. Date parse failures are misses, not errors.
pub struct FieldClassifier;

impl FieldClassifier {
    pub fn new() -> Self {
        FieldClassifier
    }

    pub fn classify(&self, subject: &str, snippet: &str) -> Classification {
        let fulltext = format!("{} {}", subject, snippet).to_lowercase();

        let mut result = Classification::default();

        for (kind, keywords) in KIND_PROBES {
            if result.kind.is_some() {
                break;
            }
            if keywords.iter().any(|k| fulltext.contains(k)) {
                result.kind = Some(*kind);
            }
        }

        result.is_price_increase = PRICE_INCREASE_KEYWORDS
            .iter()
            .any(|k| fulltext.contains(k));

        result.renewal_date = RENEWAL_DATE_PATTERN
            .captures(&fulltext)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_renewal_date(m.as_str()));

        result.term_months = TERM_PATTERN.captures(&fulltext).and_then(|caps| {
            let count: u32 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2)?.as_str();
            Some(if unit.starts_with('y') { count * 12 } else { count })
        });

        result
    }
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a matched date fragment: DD/MM/YYYY or "DD Mon YYYY" (month name
/// in any casing, optional abbreviation dot)
fn parse_renewal_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace('.', "");

    NaiveDate::parse_from_str(&cleaned, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(&cleaned, "%d %b %Y"))
        .or_else(|_| NaiveDate::parse_from_str(&cleaned, "%d %B %Y"))
        .ok()
}

// ============================================================================
// TESTS
// ============================================================================
