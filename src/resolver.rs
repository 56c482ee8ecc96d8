//! Query resolution pipeline. Local knowledge is always tried before the
//! AI fallback: school facts first, then event matching (with context
//! retries for follow-ups), and only then the model. Every resolved turn
//! is appended to the session's chat log.

use tracing::{debug, warn};

use crate::context::ContextMemory;
use crate::facet::{event_answer, facts_answer};
use crate::fallback::FallbackClient;
use crate::history::{ChatStore, ChatTurn, Role};
use crate::knowledge::KnowledgeBases;
use crate::matcher::find_event;

const EMPTY_QUERY_REPLY: &str = "Please ask something meaningful.";

pub struct Resolver {
    knowledge: KnowledgeBases,
    store: ChatStore,
    context: ContextMemory,
    fallback: FallbackClient,
}

impl Resolver {
    pub fn new(knowledge: KnowledgeBases, store: ChatStore, fallback: FallbackClient) -> Self {
        Resolver {
            knowledge,
            store,
            context: ContextMemory::new(),
            fallback,
        }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn context(&self) -> &ContextMemory {
        &self.context
    }

    /// Resolve one query for one session and log the exchange.
    pub async fn answer(&self, session_id: &str, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            // Nothing to resolve or remember; the exchange is not logged.
            return EMPTY_QUERY_REPLY.to_string();
        }

        if let Some(answer) = facts_answer(&self.knowledge.school, query) {
            debug!(session_id, "answered from school facts");
            self.record(session_id, query, &answer);
            return answer;
        }

        let (candidates, used_context) = self.context.candidate_queries(session_id, query);
        for candidate in &candidates {
            if let Some(entry) = find_event(&self.knowledge.events, candidate) {
                debug!(session_id, event = %entry.key, used_context, "answered from event roster");
                let answer = event_answer(entry, candidate);
                self.context
                    .note_response(session_id, &answer, &self.knowledge.events);
                self.record(session_id, query, &answer);
                return answer;
            }
        }

        debug!(session_id, "no local answer, deferring to AI fallback");
        let mut turns = match self.store.load(session_id) {
            Ok(turns) => turns,
            Err(e) => {
                warn!(session_id, error = %e, "failed to load chat history, sending the query alone");
                Vec::new()
            }
        };
        turns.push(ChatTurn::new(Role::User, query));
        let answer = self.fallback.complete(&turns).await;
        self.record(session_id, query, &answer);
        answer
    }

    /// Append the user turn and the assistant reply to the session log. A
    /// store failure degrades to an unlogged exchange; the user still gets
    /// their answer.
    fn record(&self, session_id: &str, query: &str, answer: &str) {
        for (role, content) in [(Role::User, query), (Role::Assistant, answer)] {
            if let Err(e) = self.store.append(session_id, role, content) {
                warn!(session_id, error = %e, "failed to persist chat turn");
            }
        }
    }
}
