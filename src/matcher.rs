//! Event matching: maps a free-text query onto one conclave roster entry,
//! or none. Three passes run in strict priority order and the first hit
//! wins; within a pass, roster order breaks ties.

use crate::knowledge::{EventBase, EventEntry};
use crate::normalize::{normalize, normalize_key, QueryForms};

/// Minimum `similarity` score for the fuzzy pass to accept a match.
pub const FUZZY_CUTOFF: f64 = 0.7;

/// Case-insensitive string similarity in `[0, 1]`, where 1.0 is an exact
/// match. Backed by normalized Levenshtein distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Resolve a query to an event entry.
///
/// Pass 1 looks for a topic key or display name contained in the query
/// (compared in raw-lowercase, normalized and key form). Pass 2 falls back
/// to single-word overlap between the query and event names. Pass 3 takes
/// the best fuzzy score across all keys and names, if it clears
/// [`FUZZY_CUTOFF`]; a typo like "scriptorum" still lands on Scriptorium,
/// while unrelated queries stay unmatched and go to the AI fallback.
pub fn find_event<'a>(events: &'a EventBase, query: &str) -> Option<&'a EventEntry> {
    let forms = QueryForms::new(query);
    substring_pass(events, &forms)
        .or_else(|| word_overlap_pass(events, &forms))
        .or_else(|| fuzzy_pass(events, &forms))
}

fn substring_pass<'a>(events: &'a EventBase, forms: &QueryForms) -> Option<&'a EventEntry> {
    events
        .iter()
        .find(|entry| name_in_query(&entry.key, forms) || name_in_query(&entry.record.event_name, forms))
}

/// True when any canonical form of `name` occurs inside the matching form
/// of the query. Empty forms never match (every string contains "").
fn name_in_query(name: &str, forms: &QueryForms) -> bool {
    let lower = name.to_lowercase();
    if !lower.is_empty() && forms.lower.contains(&lower) {
        return true;
    }
    let norm = normalize(name);
    if !norm.is_empty() && forms.norm.contains(&norm) {
        return true;
    }
    let key = normalize_key(name);
    !key.is_empty() && forms.key.contains(&key)
}

/// Word-level fallback for partial names ("united nations" for Model
/// United Nations). Only query words longer than two characters count, so
/// stopwords like "is" and "of" cannot pull in a record.
fn word_overlap_pass<'a>(events: &'a EventBase, forms: &QueryForms) -> Option<&'a EventEntry> {
    let words: Vec<&str> = forms
        .norm
        .split_whitespace()
        .filter(|word| word.len() > 2)
        .collect();
    if words.is_empty() {
        return None;
    }
    events.iter().find(|entry| {
        let mut tokens: Vec<String> = entry
            .record
            .event_name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        tokens.extend(entry.key.to_lowercase().split_whitespace().map(str::to_string));
        words
            .iter()
            .any(|word| tokens.iter().any(|token| token == word))
    })
}

/// Last resort for misspellings: best similarity between the whole query
/// and every key and display name. Strict `>` keeps the earliest entry on
/// equal scores.
fn fuzzy_pass<'a>(events: &'a EventBase, forms: &QueryForms) -> Option<&'a EventEntry> {
    if forms.lower.is_empty() {
        return None;
    }
    let mut best: Option<(&EventEntry, f64)> = None;
    for entry in events.iter() {
        for candidate in [entry.key.as_str(), entry.record.event_name.as_str()] {
            let score = similarity(&forms.lower, candidate);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry, score));
            }
        }
    }
    best.filter(|(_, score)| *score >= FUZZY_CUTOFF)
        .map(|(entry, _)| entry)
}
