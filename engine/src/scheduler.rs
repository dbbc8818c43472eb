//! Delayed continuations.
//!
//! Pacing between solution steps and the pause before a dead-end undo are
//! both expressed as entries in this queue rather than as sleeping tasks, so
//! cancelling one is a removal and nothing runs concurrently with the caller.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuation {
    NextSolutionStep,
    DeadEndUndo,
}

/// Continuations ordered by deadline, then by arrival.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BTreeMap<(Instant, u64), Continuation>,
    next_seq: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, continuation: Continuation, delay: Duration, now: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::debug!(?continuation, delay_ms = delay.as_millis(), "Scheduled");
        self.queue.insert((now + delay, seq), continuation);
    }

    /// Remove every pending entry of this kind. Returns how many were removed.
    pub fn cancel(&mut self, continuation: Continuation) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, pending| *pending != continuation);
        before - self.queue.len()
    }

    #[must_use]
    pub fn is_pending(&self, continuation: Continuation) -> bool {
        self.queue.values().any(|pending| *pending == continuation)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Sequence number the next scheduled entry will get. Entries queued
    /// from here on are excluded by [`Scheduler::pop_due`] with this cutoff.
    #[must_use]
    pub const fn cutoff(&self) -> u64 {
        self.next_seq
    }

    /// Pop the earliest entry due at or before `now` that was queued before
    /// `cutoff`.
    pub fn pop_due(&mut self, now: Instant, cutoff: u64) -> Option<Continuation> {
        let key = self
            .queue
            .keys()
            .take_while(|(due, _)| *due <= now)
            .find(|(_, seq)| *seq < cutoff)
            .copied()?;
        self.queue.remove(&key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
