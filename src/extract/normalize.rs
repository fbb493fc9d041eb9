//! Field normalization rules
//!
//! Raw values pulled out of listing markup are messy: padded whitespace,
//! currency symbols, thousands separators, relative image paths. The
//! functions here reduce them to a canonical form and never fail; an
//! unusable value becomes None.

use url::Url;

/// Normalizes a text field
///
/// Trims, collapses internal whitespace runs to a single space, and maps
/// blank results to None.
pub fn normalize_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Parses a price out of marketing text
///
/// Strips everything except digits and the `.`/`,` separators, then
/// decides which separator is decimal: the last one counts as decimal
/// when at most two digits follow it, otherwise every separator is
/// treated as grouping. Unparsable input yields None, never an error.
pub fn normalize_price(raw: &str) -> Option<f64> {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !filtered.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match filtered.rfind(|c| c == '.' || c == ',') {
        None => filtered,
        Some(idx) => {
            let (head, tail) = filtered.split_at(idx);
            let head: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
            let decimals = &tail[1..];
            if !decimals.is_empty() && decimals.len() <= 2 {
                format!("{}.{}", head, decimals)
            } else {
                format!("{}{}", head, decimals)
            }
        }
    };

    normalized.parse::<f64>().ok()
}

/// Resolves a possibly-relative URL against the page it came from
///
/// Returns the original string unchanged when resolution fails.
pub fn resolve_url(raw: &str, base: &Url) -> String {
    match base.join(raw.trim()) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => raw.to_string(),
    }
}
