//! Player name canonicalization for fuzzy comparison.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// A leading clan tag: two or three alphanumerics followed by separator
/// punctuation, e.g. "ds-", "vr | ", "jp.".
const TEAM_PREFIX_PATTERN: &str = r"^[\p{Alphabetic}\p{Nd}]{2,3}\s*[-_|.:/\\・]+\s*";

fn team_prefix_regex() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(TEAM_PREFIX_PATTERN).expect("valid team prefix pattern"))
}

/// Canonicalizes a raw player name for comparison.
///
/// Steps, in order: strip diacritics, lowercase, drop one leading team tag,
/// drop every non-alphanumeric character, trim. Pure and total.
pub fn normalize(raw: &str) -> String {
    let folded: String = raw
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    // Only strip the tag when a name remains after it
    let without_prefix = match team_prefix_regex().find(&folded) {
        Some(m) if folded[m.end()..].chars().any(char::is_alphanumeric) => &folded[m.end()..],
        _ => folded.as_str(),
    };

    without_prefix
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .trim()
        .to_string()
}
