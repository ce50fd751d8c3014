//! Wall-clock budget for move search.
//!
//! Backends self-limit: there is no cancellation path, so a search loop is
//! expected to poll `SearchClock::expired` and return its best answer.

use std::time::{Duration, Instant};

/// Time allowed for one move computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchBudget {
    pub move_time: Duration,
}

impl SearchBudget {
    pub fn new(move_time: Duration) -> Self {
        Self { move_time }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Whole seconds, rounded up, for protocols that only take seconds.
    pub fn whole_seconds(&self) -> u64 {
        self.move_time.as_secs_f64().ceil() as u64
    }

    /// Start the clock. Call when search begins.
    pub fn start(&self) -> SearchClock {
        SearchClock {
            deadline: Instant::now() + self.move_time,
        }
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        // One second per move, the budget the reference engines were tuned for.
        Self::new(Duration::from_secs(1))
    }
}

/// Running clock handed to a search loop.
#[derive(Clone, Copy, Debug)]
pub struct SearchClock {
    deadline: Instant,
}

impl SearchClock {
    #[inline]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
