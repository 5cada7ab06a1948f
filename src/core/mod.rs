//! Core engine module - the query-to-ranked-list pipeline.
//!
//! Everything here is platform-agnostic:
//! - Search result and candidate types
//! - Fuzzy matcher, fallback heuristics, and the composite scorer
//! - Query dispatcher orchestrating sources and extensions
//! - Debounce and most-recent-wins session bookkeeping

pub mod matcher;
pub mod result;
pub mod search;
pub mod session;

pub use matcher::Matcher;
pub use result::{Candidate, ResultKind, SearchResponse, SearchResult};
pub use search::{CandidateSource, SearchService, StaticSource};
pub use session::{Debouncer, QuerySession, QueryTicket};
