// Subscription Scan Engine - Core Library
// Exposes all modules for use in the CLI, an embedding server, and tests

pub mod classifier;
pub mod detector;
pub mod extractor;
pub mod model;
pub mod price;
pub mod provider;
pub mod scan;

// Re-export commonly used types
pub use classifier::{Classification, FieldClassifier, MessageKind};
pub use detector::PriceChangeDetector;
pub use extractor::{ExtractionVariant, SubscriptionExtractor};
pub use model::{
    load_emails_csv, load_emails_json, load_previous_json, ExtractedSubscription, Frequency,
    PreviousSubscriptionRecord, PriceChange, RawEmail,
};
pub use price::PriceExtractor;
pub use provider::{ProviderCatalog, ProviderNormalizer, UNKNOWN_SERVICE};
pub use scan::{InMemoryStore, ScanEngine, ScanOutcome, SubscriptionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
