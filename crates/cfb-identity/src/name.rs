//! Name → identity key → 16-hex-char id.
//!
//! The key is deliberately lossy (first initial + final surname component) so
//! independently scraped spellings of one player converge on the same id.
//! Common names can collide; that risk is accepted.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Number of hex characters kept from the SHA-256 digest.
pub const ID_HEX_LEN: usize = 16;

/// Generational suffixes stripped from the end of a name before keying.
pub const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// ASCII-fold, lowercase, drop punctuation except hyphens and collapse whitespace.
///
/// NFKD is used rather than NFD so compatibility characters (ligatures such
/// as `ﬁ`) fold to their ASCII spelling as well.
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw.nfkd().filter(char::is_ascii).collect();
    let cleaned: String = folded
        .to_ascii_lowercase()
        .chars()
        .map(|c| if is_separator(c) { ' ' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || *c == ' ')
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unicode whitespace plus the ASCII information separators (U+001C..U+001F),
/// which scraped text sometimes carries between name parts.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Reduce a raw name to the string that gets hashed.
pub fn name_key(raw: &str) -> String {
    let normalized = normalize_name(raw);
    let mut parts: Vec<&str> = normalized.split(' ').filter(|p| !p.is_empty()).collect();

    while parts
        .last()
        .map(|last| NAME_SUFFIXES.contains(last))
        .unwrap_or(false)
    {
        parts.pop();
    }

    if parts.len() < 2 {
        return normalized;
    }

    let first_initial = parts[0].chars().next().map(String::from).unwrap_or_default();
    let last = parts[parts.len() - 1];
    let surname = last.rsplit('-').next().unwrap_or(last);

    format!("{first_initial}{surname}")
}

/// Stable player id: first 16 hex chars of SHA-256(name_key).
pub fn derive_id(raw: &str) -> String {
    let key = name_key(raw);
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let mut out = hex::encode(hasher.finalize());
    out.truncate(ID_HEX_LEN);
    out
}
