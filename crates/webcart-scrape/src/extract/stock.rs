//! Stock-status extraction.
//!
//! Matches selector text (or, without a configured selector, page body
//! text) against in-stock / out-of-stock phrase lists. Out-of-stock
//! phrases win over in-stock phrases so that "Currently out of stock"
//! never reads as available.

use webcart_core::{SelectorSpec, StockPhrases};

use super::ElementExtractor;

/// Phrase defaults used when the recipe configures none.
const DEFAULT_IN_STOCK: &[&str] = &["in stock", "instock", "available", "add to cart"];
const DEFAULT_OUT_OF_STOCK: &[&str] = &["out of stock", "outofstock", "sold out", "unavailable"];

/// Extracts a stock status string.
///
/// With a configured selector: the matched element's text is checked
/// against the phrase lists; an informative match maps to
/// `instock`/`outofstock`, any other non-empty text is returned raw for
/// the transformer to normalize, and no text at all yields `unknown`.
///
/// Without a selector the page body text is scanned the same way;
/// `unknown` when nothing matches.
#[must_use]
pub fn extract_stock_status(
    extractor: &ElementExtractor<'_>,
    primary: Option<&SelectorSpec>,
    fallback: Option<&SelectorSpec>,
    phrases: &StockPhrases,
) -> String {
    if primary.is_some() || fallback.is_some() {
        match extractor.extract_text(primary, fallback) {
            Some(text) => match match_phrases(&text, phrases) {
                Some(status) => status,
                None => text,
            },
            None => "unknown".to_string(),
        }
    } else {
        let body = extractor
            .document()
            .root_element()
            .text()
            .collect::<String>();
        match_phrases(&body, phrases).unwrap_or_else(|| "unknown".to_string())
    }
}

fn match_phrases(text: &str, phrases: &StockPhrases) -> Option<String> {
    let lowered = text.to_lowercase();

    let out_phrases: Vec<String> = if phrases.out_of_stock.is_empty() {
        DEFAULT_OUT_OF_STOCK.iter().map(|s| (*s).to_string()).collect()
    } else {
        phrases.out_of_stock.iter().map(|s| s.to_lowercase()).collect()
    };
    if out_phrases.iter().any(|p| lowered.contains(p.as_str())) {
        return Some("outofstock".to_string());
    }

    let in_phrases: Vec<String> = if phrases.in_stock.is_empty() {
        DEFAULT_IN_STOCK.iter().map(|s| (*s).to_string()).collect()
    } else {
        phrases.in_stock.iter().map(|s| s.to_lowercase()).collect()
    };
    if in_phrases.iter().any(|p| lowered.contains(p.as_str())) {
        return Some("instock".to_string());
    }

    None
}
