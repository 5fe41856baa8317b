// 📬 Core Records - Inputs and outputs of the extraction engine
// RawEmail in, ExtractedSubscription + PriceChange out

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// RAW EMAIL (input)
// ============================================================================

/// RawEmail - One already-fetched, already-decoded email envelope
///
/// Supplied by the Gmail-fetch collaborator. Immutable and ephemeral:
/// it exists only for the duration of one extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmail {
    /// Provider-side message id (back-reference for dedup/attribution)
    pub id: String,

    /// Decoded subject line
    pub subject: String,

    /// Raw From header ("Netflix <info@netflix.com>", "billing@spotify.com", ...)
    pub from: String,

    /// Date header as received (not interpreted by the core)
    pub date: String,

    /// Body snippet / preview text
    pub snippet: String,
}

impl RawEmail {
    /// Subject and snippet joined - the text every heuristic scans
    pub fn body_text(&self) -> String {
        format!("{} {}", self.subject, self.snippet)
    }
}

// ============================================================================
// BILLING FREQUENCY
// ============================================================================

/// Billing frequency of a detected subscription
///
/// Only two values exist by contract; defaults to Monthly whenever the
/// email gives no signal either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Monthly
    }
}

// ============================================================================
// EXTRACTED SUBSCRIPTION (output)
// ============================================================================

/// ExtractedSubscription - Structured result of one extraction call
///
/// Every field degrades to a conservative default when its heuristic
/// misses; the record itself is always fully populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSubscription {
    /// Canonical provider display name, never empty ("Unknown Service" fallback)
    pub provider: String,

    /// Monthly-equivalent amount when derivable
    pub price: Option<f64>,

    pub frequency: Frequency,

    /// Explicit renewal date found in the email, if any
    pub renewal_date: Option<NaiveDate>,

    /// Term length in months, when the email states one
    pub term_months: Option<u32>,

    /// True iff price-increase language was detected (independent of any delta)
    pub is_price_increase: bool,

    /// Extraction timestamp, always set
    pub last_detected: DateTime<Utc>,

    /// Back-reference to RawEmail.id (relates, does not own)
    pub email_id: String,
}

impl ExtractedSubscription {
    /// All-defaults record for an email no heuristic matched.
    /// Callers must read this as "extraction attempted, low/no confidence",
    /// not as an error signal.
    pub fn unknown(email_id: String) -> Self {
        ExtractedSubscription {
            provider: crate::provider::UNKNOWN_SERVICE.to_string(),
            price: None,
            frequency: Frequency::Monthly,
            renewal_date: None,
            term_months: None,
            is_price_increase: false,
            last_detected: Utc::now(),
            email_id,
        }
    }
}

// ============================================================================
// PRICE CHANGE EVENT (output)
// ============================================================================

/// PriceChange - Emitted when a known provider's price moved
///
/// Invariants: change = new_price - old_price,
/// percentage_change = change / old_price * 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChange {
    pub provider: String,
    pub old_price: f64,
    pub new_price: f64,
    pub change: f64,
    pub percentage_change: f64,
    pub term_months: Option<u32>,
    pub renewal_date: Option<NaiveDate>,
}

// ============================================================================
// PREVIOUS SUBSCRIPTION RECORD (input)
// ============================================================================

/// PreviousSubscriptionRecord - The user's stored subscription for a provider
///
/// Supplied by the storage-lookup collaborator, one per provider per user.
/// Read-only from the core's perspective; the core never mutates persisted
/// state, it only computes deltas against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousSubscriptionRecord {
    pub provider: String,
    pub price: f64,
    pub term_months: Option<u32>,
    pub renewal_date: Option<NaiveDate>,
}

// ============================================================================
// BATCH LOADERS
// ============================================================================

/// Load an extraction batch from a JSON array of RawEmail objects
pub fn load_emails_json(path: &Path) -> Result<Vec<RawEmail>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read email batch: {}", path.display()))?;

    let emails: Vec<RawEmail> =
        serde_json::from_str(&content).context("Failed to parse email batch JSON")?;

    Ok(emails)
}

/// Load an extraction batch from a CSV file with columns
/// id,subject,from,date,snippet
pub fn load_emails_csv(path: &Path) -> Result<Vec<RawEmail>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open email batch: {}", path.display()))?;

    let mut emails = Vec::new();

    for result in rdr.deserialize() {
        let email: RawEmail = result.context("Failed to deserialize email row")?;
        emails.push(email);
    }

    Ok(emails)
}

/// Load previously stored subscriptions from a JSON array
pub fn load_previous_json(path: &Path) -> Result<Vec<PreviousSubscriptionRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subscriptions file: {}", path.display()))?;

    let records: Vec<PreviousSubscriptionRecord> =
        serde_json::from_str(&content).context("Failed to parse subscriptions JSON")?;

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
