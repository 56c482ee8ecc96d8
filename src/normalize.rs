//! Query canonicalization. Two forms are used throughout matching:
//! `normalize` for free-text comparison and `normalize_key` for topic-key
//! comparison. Both are pure and idempotent.

/// Spelled-out and ordinal number words mapped to their digit form, so that
/// "first event", "1st event" and "one event" all normalize identically.
const NUMBER_WORDS: &[(&str, &str)] = &[
    ("one", "1"),
    ("first", "1"),
    ("1st", "1"),
    ("two", "2"),
    ("second", "2"),
    ("2nd", "2"),
    ("three", "3"),
    ("third", "3"),
    ("3rd", "3"),
    ("four", "4"),
    ("fourth", "4"),
    ("4th", "4"),
    ("five", "5"),
    ("fifth", "5"),
    ("5th", "5"),
    ("six", "6"),
    ("sixth", "6"),
    ("6th", "6"),
    ("seven", "7"),
    ("seventh", "7"),
    ("7th", "7"),
    ("eight", "8"),
    ("eighth", "8"),
    ("8th", "8"),
    ("nine", "9"),
    ("ninth", "9"),
    ("9th", "9"),
    ("ten", "10"),
    ("tenth", "10"),
    ("10th", "10"),
];

fn digit_form(word: &str) -> Option<&'static str> {
    NUMBER_WORDS
        .iter()
        .find(|(spelled, _)| *spelled == word)
        .map(|(_, digits)| *digits)
}

/// Canonical free-text form: lower-cased, restricted to `[a-z0-9 ]`,
/// number words replaced by digits, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            cleaned.push(c);
        } else if c.is_whitespace() {
            cleaned.push(' ');
        }
    }
    cleaned
        .split_whitespace()
        .map(|word| digit_form(word).unwrap_or(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical topic-key form: lower-cased with spaces and dashes removed, so
/// "Co-ordinator" and "co ordinator" compare equal.
pub fn normalize_key(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// The precomputed forms of one query, built once per resolution step.
#[derive(Debug, Clone)]
pub struct QueryForms {
    /// Trimmed, lower-cased query as typed.
    pub lower: String,
    /// `normalize` form.
    pub norm: String,
    /// `normalize_key` form (no spaces or dashes).
    pub key: String,
}

impl QueryForms {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self {
            lower: trimmed.to_lowercase(),
            norm: normalize(trimmed),
            key: normalize_key(trimmed),
        }
    }
}
