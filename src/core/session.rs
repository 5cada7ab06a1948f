//! Query session bookkeeping.
//!
//! Two small pieces keep keystrokes and results honest:
//! - `Debouncer` collapses rapid typing into one dispatch per pause.
//! - `QuerySession` hands out generation tickets so only the most
//!   recently started dispatch may present its results. In-flight older
//!   dispatches are not cancelled; their output is simply discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Poll-driven debounce window over user keystrokes.
///
/// Callers feed in their own `Instant`s, which keeps the logic clock-free
/// and testable without sleeping.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Register a keystroke at `now`, pushing the dispatch deadline out.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// True once the window has elapsed since the last `touch`. Fires
    /// once per armed deadline.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Discard any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Ticket identifying one started dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

/// Generation counter for most-recent-wins result presentation.
#[derive(Debug, Default)]
pub struct QuerySession {
    latest: AtomicU64,
}

impl QuerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new dispatch. Every previously issued ticket goes stale
    /// the moment this returns.
    pub fn begin(&self) -> QueryTicket {
        QueryTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` still identifies the newest dispatch.
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}
