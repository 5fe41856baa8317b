// 💶 Price Extractor - Monetary amounts out of free text
// Ordered pattern list, first pattern to produce an amount wins

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// ============================================================================
// PATTERN TABLE
// ============================================================================

/// One entry in the ordered pattern list: a regex plus the handler that
/// turns its captures into an amount. A handler returning None means
/// "treat as no match" and the next pattern is tried.
struct PricePattern {
    regex: Regex,
    handler: fn(&Captures) -> Option<f64>,
}

/// Pattern order is part of the contract, not an implementation detail.
/// The amount-over-period form goes first: a plain currency-symbol pattern
/// would otherwise swallow "€32.97/3 months" and report the full-period
/// amount instead of the monthly equivalent.
static PRICE_PATTERNS: Lazy<Vec<PricePattern>> = Lazy::new(|| {
    vec![
        // €32.97/3 months → 10.99 (monthly equivalent)
        PricePattern {
            regex: Regex::new(r"(?i)€\s*(\d+[.,]\d+)\s*/\s*(\d+)\s*months?")
                .expect("invalid amount-over-period pattern"),
            handler: |caps| {
                let amount = parse_amount(caps.get(1)?.as_str())?;
                let months: i64 = caps.get(2)?.as_str().parse().ok()?;
                if months <= 0 {
                    return None;
                }
                Some(amount / months as f64)
            },
        },
        // $15.99, € 10,99, £7
        PricePattern {
            regex: Regex::new(r"[$€£]\s*(\d+[.,]?\d*)").expect("invalid symbol-before pattern"),
            handler: |caps| parse_amount(caps.get(1)?.as_str()),
        },
        // 15.99$, 10,99 €
        PricePattern {
            regex: Regex::new(r"(\d+[.,]?\d*)\s*[$€£]").expect("invalid symbol-after pattern"),
            handler: |caps| parse_amount(caps.get(1)?.as_str()),
        },
        // Comma-decimal Euro with the pieces captured separately: 10,99 €
        PricePattern {
            regex: Regex::new(r"(\d+),(\d+)\s*€").expect("invalid comma-euro pattern"),
            handler: |caps| {
                parse_amount(&format!(
                    "{}.{}",
                    caps.get(1)?.as_str(),
                    caps.get(2)?.as_str()
                ))
            },
        },
    ]
});

/// Parse a digit string with either decimal separator. Malformed numbers
/// yield None, never an error.
fn parse_amount(digits: &str) -> Option<f64> {
    let normalized = digits.replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

// ============================================================================
// PRICE EXTRACTOR
// ============================================================================

/// PriceExtractor - Pulls a monthly-equivalent amount out of email text
///
/// Pure and infallible: any miss or malformed number is None.
pub struct PriceExtractor;

impl PriceExtractor {
    pub fn new() -> Self {
        PriceExtractor
    }

    /// Extract a monetary amount from free text. Patterns are tried in
    /// table order; the first one whose handler produces an amount wins.
    pub fn extract(&self, text: &str) -> Option<f64> {
        PRICE_PATTERNS.iter().find_map(|pattern| {
            pattern
                .regex
                .captures(text)
                .and_then(|caps| (pattern.handler)(&caps))
        })
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<f64> {
        PriceExtractor::new().extract(text)
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected an amount");
        assert!(
            (actual - expected).abs() < 0.001,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_dollar_before_amount() {
        assert_close(extract("Your new price is $15.99/month"), 15.99);
    }

    #[test]
    fn test_euro_comma_decimal() {
        assert_close(extract("Betrag: 10,99 €"), 10.99);
    }

    #[test]
    fn test_pound_whole_number() {
        assert_close(extract("Renews at £7 per month"), 7.0);
    }

    #[test]
    fn test_amount_over_period_monthly_equivalent() {
        assert_close(extract("€32.97/3 months"), 10.99);
    }

    #[test]
    fn test_amount_over_period_single_month() {
        assert_close(extract("€9.99/1 month"), 9.99);
    }

    #[test]
    fn test_period_pattern_beats_plain_euro() {
        // Both the € pattern and the period pattern match this text; the
        // period pattern is first so the monthly equivalent wins
        assert_close(extract("Total: €24.00/12 months for the year"), 2.0);
    }

    #[test]
    fn test_symbol_after_amount() {
        assert_close(extract("charged 12.50€ today"), 12.50);
    }

    #[test]
    fn test_no_amount_present() {
        assert_eq!(extract("Thanks for being a loyal customer"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn test_malformed_number_is_not_an_error() {
        // "$." has a symbol but no digits; must be a clean miss
        assert_eq!(extract("price: $. and nothing else"), None);
    }

    #[test]
    fn test_zero_month_period_demotes_to_plain_amount() {
        // The guard treats /0 months as no match for the period pattern;
        // the plain € pattern then picks up the raw amount
        assert_close(extract("€10.00/0 months"), 10.0);
    }
}
