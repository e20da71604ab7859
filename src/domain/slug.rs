//! Text normalisation for names and URL slugs.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Lowercase, dash-separated ASCII slug. Returns an empty string when the
/// input has no ASCII letters or digits.
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug with a numeric suffix, used when the plain slug is already taken.
pub fn slug_with_suffix(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

/// Trim, collapse inner whitespace and upper-case the first letter of
/// every word.
pub fn title_case(value: &str) -> String {
    WHITESPACE
        .split(value.trim())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed, lowercased email address.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
