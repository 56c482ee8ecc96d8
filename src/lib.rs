//! Chat service for Juniper Hill Public School and its annual conclave of
//! inter-school events. Queries are answered from two read-only JSON
//! knowledge bases wherever possible; everything else goes to an
//! OpenRouter-style AI model with the session's chat history attached.

pub mod config;
pub mod context;
pub mod facet;
pub mod fallback;
pub mod history;
pub mod knowledge;
pub mod logging;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod server;
