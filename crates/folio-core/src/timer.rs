#![forbid(unsafe_code)]

//! Deadline-ordered timer queue driven by host-supplied time.
//!
//! # Invariants
//!
//! 1. Entries are sorted by `(due, seq)`; `seq` grows with every schedule, so
//!    timers with the same deadline fire in insertion order.
//! 2. A cancelled or fired [`TimerId`] is never reused.

use std::time::Duration;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    due: Duration,
    task: T,
}

/// Timers keyed by absolute deadline on the host clock.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `task` to fire at `due`.
    pub fn schedule(&mut self, due: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        // Ids are monotonic, so "after every entry with due <= this one"
        // keeps ties in insertion order.
        let pos = self.entries.partition_point(|e| e.due <= due);
        self.entries.insert(pos, Entry { id, due, task });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Deadline of a pending timer.
    #[must_use]
    pub fn due(&self, id: TimerId) -> Option<Duration> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.due)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.first().map(|e| e.due)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, Duration, T)> {
        if self.entries.first().is_some_and(|e| e.due <= now) {
            let e = self.entries.remove(0);
            Some((e.id, e.due, e.task))
        } else {
            None
        }
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
