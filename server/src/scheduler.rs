//! Deferred one-shot actions, fired from inside the tick.
//!
//! Nothing here runs on its own timer: the tick drains whatever is due
//! against the current `Instant`, so every state transition still happens on
//! the simulation task.

use skirmish_shared::AgentId;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    RespawnAgent(AgentId),
}

#[derive(Debug)]
struct Scheduled<T> {
    due: Instant,
    seq: u64,
    action: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    entries: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Instant, action: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Scheduled { due, seq, action });
    }

    /// Removes and returns every action due at or before `now`, earliest
    /// first. Entries due at the same instant keep insertion order.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.due, entry.seq));
        due.into_iter().map(|entry| entry.action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
