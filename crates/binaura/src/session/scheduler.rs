//! Cooperative task scheduler
//!
//! Holds one-shot and periodic tasks keyed by deadline. Nothing runs on its
//! own: the owner asks `pop_due(now)` for the next task whose deadline has
//! passed and handles it. Tasks with equal deadlines come out in the order
//! they were scheduled.

use std::time::Duration;

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// How a periodic task behaves after a late wakeup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every missed period is delivered (countdown ticks)
    Steady,
    /// Missed periods collapse into one delivery (display frames)
    Coalesce,
}

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    seq: u64,
    due: Duration,
    repeat: Option<(Duration, Cadence)>,
    payload: T,
}

/// Deadline-ordered task set
#[derive(Debug)]
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `payload` once at `due`
    pub fn once(&mut self, due: Duration, payload: T) -> TaskId {
        self.insert(due, None, payload)
    }

    /// Run `payload` at `first_due` and then every `period`
    pub fn every(&mut self, first_due: Duration, period: Duration, cadence: Cadence, payload: T) -> TaskId {
        let period = period.max(Duration::from_nanos(1));
        self.insert(first_due, Some((period, cadence)), payload)
    }

    fn insert(&mut self, due: Duration, repeat: Option<(Duration, Cadence)>, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.entries.push(Entry {
            id,
            seq,
            due,
            repeat,
            payload,
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Remove a task. Returns false when it had already finished or been cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take the earliest task due at or before `now`.
    ///
    /// Returns the task, its payload and the deadline it was due at. Periodic
    /// tasks are rescheduled according to their cadence; one-shot tasks are
    /// removed.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TaskId, Duration, T)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;

        match self.entries[index].repeat {
            None => {
                let entry = self.entries.swap_remove(index);
                Some((entry.id, entry.due, entry.payload))
            }
            Some((period, cadence)) => {
                let seq = self.bump_seq();
                let entry = &mut self.entries[index];
                let due = entry.due;
                entry.due = match cadence {
                    Cadence::Steady => due + period,
                    Cadence::Coalesce => next_after(due, period, now),
                };
                entry.seq = seq;
                Some((entry.id, due, entry.payload.clone()))
            }
        }
    }
}

/// First `due + k * period` (k ≥ 1) strictly after `now`
fn next_after(due: Duration, period: Duration, now: Duration) -> Duration {
    let behind = now.saturating_sub(due).as_nanos();
    let period_nanos = period.as_nanos();
    let steps = behind / period_nanos + 1;
    due + Duration::from_nanos((steps * period_nanos) as u64)
}
