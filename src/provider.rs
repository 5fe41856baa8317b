// 🏷️ Provider Normalizer - Raw sender text → canonical provider name
// Dictionary lookup first, then domain and display-name heuristics

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback provider name when every heuristic misses
pub const UNKNOWN_SERVICE: &str = "Unknown Service";

/// Local parts that mark a sender address as generic (machine-generated),
/// so the domain is the only useful signal
const GENERIC_SENDERS: &[&str] = &[
    "noreply",
    "no-reply",
    "notify",
    "notifications",
    "info",
    "support",
    "billing",
];

// Display-name forms, probed in order: "X", 'X', X <email>, [X], (X)
static DISPLAY_NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""([^"]{3,})""#,
        r"'([^']{3,})'",
        r"^\s*([^<>]{3,}?)\s*<[^>]*>",
        r"\[([^\]]{3,})\]",
        r"\(([^)]{3,})\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid display-name pattern"))
    .collect()
});

// ============================================================================
// PROVIDER CATALOG
// ============================================================================

/// ProviderCatalog - Immutable dictionary of known service keys
///
/// Injected into the normalizer (constructor parameter, not a module-level
/// global) so tests can swap in their own entries. Keys are matched
/// case-insensitively as substrings of the input.
pub struct ProviderCatalog {
    /// (lowercase match key, canonical display name), in match order
    entries: Vec<(String, String)>,
}

impl ProviderCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        ProviderCatalog {
            entries: Vec::new(),
        }
    }

    /// Create a catalog from explicit entries (test-time overriding)
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        ProviderCatalog {
            entries: entries
                .iter()
                .map(|(key, name)| (key.to_lowercase(), name.to_string()))
                .collect(),
        }
    }

    /// Catalog pre-loaded with the known subscription services
    pub fn with_defaults() -> Self {
        ProviderCatalog::from_entries(&[
            ("netflix", "Netflix"),
            ("spotify", "Spotify"),
            ("disney", "Disney+"),
            ("disneyplus", "Disney+"),
            ("hulu", "Hulu"),
            ("hbo", "HBO Max"),
            ("paramount", "Paramount+"),
            ("peacock", "Peacock"),
            ("youtube", "YouTube Premium"),
            ("twitch", "Twitch"),
            ("audible", "Audible"),
            ("kindle", "Kindle Unlimited"),
            ("amazon prime", "Amazon Prime"),
            ("prime video", "Amazon Prime"),
            ("apple music", "Apple Music"),
            ("apple tv", "Apple TV+"),
            ("icloud", "iCloud"),
            ("adobe", "Adobe"),
            ("photoshop", "Adobe"),
            ("microsoft", "Microsoft 365"),
            ("office 365", "Microsoft 365"),
            ("dropbox", "Dropbox"),
            ("github", "GitHub"),
            ("notion", "Notion"),
            ("slack", "Slack"),
            ("zoom", "Zoom"),
            ("canva", "Canva"),
            ("figma", "Figma"),
            ("grammarly", "Grammarly"),
            ("evernote", "Evernote"),
            ("babbel", "Babbel"),
            ("duolingo", "Duolingo"),
            ("rosetta", "Rosetta Stone"),
            ("coursera", "Coursera"),
            ("udemy", "Udemy"),
            ("skillshare", "Skillshare"),
            ("masterclass", "MasterClass"),
            ("linkedin", "LinkedIn Premium"),
            ("nytimes", "The New York Times"),
            ("wsj", "The Wall Street Journal"),
            ("economist", "The Economist"),
            ("medium", "Medium"),
            ("patreon", "Patreon"),
            ("nordvpn", "NordVPN"),
            ("expressvpn", "ExpressVPN"),
            ("playstation", "PlayStation Plus"),
            ("xbox", "Xbox Game Pass"),
            ("nintendo", "Nintendo Switch Online"),
        ])
    }

    /// Case-insensitive substring lookup: first entry whose key appears in
    /// the text wins
    pub fn lookup(&self, text: &str) -> Option<&str> {
        let text_lower = text.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| text_lower.contains(key))
            .map(|(_, name)| name.as_str())
    }

    /// Number of known services
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// PROVIDER NORMALIZER
// ============================================================================

/// ProviderNormalizer - Maps raw sender/subject text to a canonical name
///
/// Pure and infallible: always returns a non-empty string, falling back to
/// "Unknown Service" when nothing matches.
pub struct ProviderNormalizer {
    catalog: ProviderCatalog,
}

impl ProviderNormalizer {
    pub fn new(catalog: ProviderCatalog) -> Self {
        ProviderNormalizer { catalog }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Normalize raw sender text to a canonical provider name.
    ///
    /// Pipeline, first match wins:
    /// 1. catalog substring match against the whole text
    /// 2. catalog match against the first domain token of an address
    /// 3. generic senders (noreply@ etc.): title-cased domain root
    /// 4. display-name extraction ("X", 'X', X <email>, [X], (X))
    /// 5. any remaining address: title-cased domain root
    /// 6. "Unknown Service"
    pub fn normalize(&self, raw: &str) -> String {
        if let Some(name) = self.catalog.lookup(raw) {
            return name.to_string();
        }

        let address = extract_address(raw);

        if let Some(addr) = address {
            if let Some(token) = first_domain_token(addr) {
                if let Some(name) = self.catalog.lookup(token) {
                    return name.to_string();
                }
            }

            if is_generic_sender(addr) {
                if let Some(name) = domain_display_name(addr) {
                    return name;
                }
            }
        }

        if let Some(name) = extract_display_name(raw) {
            return name;
        }

        // Last resort for addresses from unremarkable senders: the domain
        // root is still a better label than nothing
        if let Some(name) = address.and_then(domain_display_name) {
            return name;
        }

        UNKNOWN_SERVICE.to_string()
    }

    /// Subject-only retry: catalog substring match with none of the
    /// address/display-name heuristics
    pub fn normalize_subject(&self, subject: &str) -> Option<String> {
        self.catalog.lookup(subject).map(|name| name.to_string())
    }
}

// ============================================================================
// ADDRESS HEURISTICS
// ============================================================================

/// Pull the bare email address out of the raw From text, if one exists.
/// Handles both "Name <user@host>" and plain "user@host" forms.
fn extract_address(raw: &str) -> Option<&str> {
    let candidate = match (raw.find('<'), raw.find('>')) {
        (Some(start), Some(end)) if start < end => &raw[start + 1..end],
        _ => raw,
    };

    let candidate = candidate.trim();
    if candidate.contains('@') {
        Some(candidate)
    } else {
        None
    }
}

/// Domain portion of an address, everything after '@'
fn domain_of(address: &str) -> Option<&str> {
    address.split('@').nth(1).filter(|d| !d.is_empty())
}

/// First domain token: "billing@netflix.com" → "netflix"
fn first_domain_token(address: &str) -> Option<&str> {
    domain_of(address)
        .and_then(|domain| domain.split('.').next())
        .filter(|t| !t.is_empty())
}

/// True when the local part is a machine-generated sender like noreply@
fn is_generic_sender(address: &str) -> bool {
    let local = address.split('@').next().unwrap_or("").to_lowercase();
    GENERIC_SENDERS.iter().any(|g| local == *g)
}

/// "mailer-relay.net" → "Mailer Relay": drop the TLD, split the domain
/// root on separators, title-case each token
fn domain_display_name(address: &str) -> Option<String> {
    let root = first_domain_token(address)?;

    let name = root
        .split(['-', '_', '.'])
        .filter(|t| !t.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Human-readable name from quoted/bracketed/angle-prefixed substrings,
/// first pattern producing a 3+ character match wins
fn extract_display_name(raw: &str) -> Option<String> {
    for pattern in DISPLAY_NAME_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(raw) {
            let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if name.len() >= 3 && !name.contains('@') {
                return Some(name.to_string());
            }
        }
    }
    None
}

// ============================================================================
// TESTS
// ============================================================================
