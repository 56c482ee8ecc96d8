//! Per-session conversational context: remembers the last event a session
//! talked about, so a bare follow-up like "what are the prizes?" can be
//! retried as "<event> what are the prizes?" before giving up.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::knowledge::EventBase;

/// Words that mark a query as a facet-only follow-up. Matched by
/// containment against the lower-cased query, so "prizes" hits "prize" and
/// "eligibility" hits "eligib".
pub const FOLLOW_UP_TRIGGERS: &[&str] = &[
    "time",
    "timing",
    "when",
    "schedule",
    "duration",
    "prize",
    "award",
    "winner",
    "reward",
    "rule",
    "guideline",
    "regulation",
    "format",
    "round",
    "structure",
    "participant",
    "who",
    "eligib",
    "registration",
    "register",
    "deadline",
    "apply",
    "venue",
    "where",
    "location",
    "place",
    "hall",
];

/// In-memory map of session id to the display name of the last event that
/// session resolved. Lost on restart; chat history on disk is the durable
/// record.
#[derive(Debug, Default)]
pub struct ContextMemory {
    topics: Mutex<HashMap<String, String>>,
}

impl ContextMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remembered_topic(&self, session_id: &str) -> Option<String> {
        self.lock().get(session_id).cloned()
    }

    /// The query variants to attempt event matching with, in order. For a
    /// follow-up with a remembered topic this is the topic spliced around
    /// the raw query (duplicates removed); otherwise just the query itself.
    /// The flag reports whether context was applied.
    pub fn candidate_queries(&self, session_id: &str, raw: &str) -> (Vec<String>, bool) {
        let raw = raw.trim();
        let lower = raw.to_lowercase();
        let is_follow_up = FOLLOW_UP_TRIGGERS
            .iter()
            .any(|trigger| lower.contains(trigger));

        let topic = if is_follow_up {
            self.remembered_topic(session_id)
        } else {
            None
        };
        let Some(topic) = topic else {
            return (vec![raw.to_string()], false);
        };

        debug!(session_id, topic = %topic, "retrying follow-up with remembered topic");
        let mut variants = Vec::new();
        for variant in [
            format!("{topic} {raw}"),
            format!("{raw} {topic}"),
            topic.clone(),
            format!("{} {}", topic.to_lowercase(), lower),
        ] {
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
        (variants, true)
    }

    /// Remember the event a response talked about: the first roster entry
    /// whose display name occurs in the response text, in roster order.
    pub fn note_response(&self, session_id: &str, response: &str, events: &EventBase) {
        let lower = response.to_lowercase();
        for entry in events.iter() {
            let name = entry.record.event_name.to_lowercase();
            if !name.is_empty() && lower.contains(&name) {
                self.lock()
                    .insert(session_id.to_string(), entry.record.event_name.clone());
                return;
            }
        }
    }

    /// Drop the remembered topic for a session, if any.
    pub fn clear(&self, session_id: &str) {
        self.lock().remove(session_id);
    }

    // A poisoned lock only means another request panicked mid-insert; the
    // map itself stays usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.topics.lock().unwrap_or_else(|e| e.into_inner())
    }
}
