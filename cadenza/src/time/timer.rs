use crate::runtime::task::TaskHeader;

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::{Rc, Weak};
use std::task::Waker;
use std::time::Instant;

/// What happens when a timer fires.
pub(crate) enum TimerAction {
    /// Wake a parked task so it can observe its elapsed deadline.
    Wake(Waker),

    /// Deliver a cancellation armed with a future deadline.
    Cancel(Weak<TaskHeader>),
}

/// An entry in the runtime timer queue.
///
/// `TimerEntry` represents a scheduled action at a specific deadline.
/// Entries are stored in a [`BinaryHeap`] ordered by deadline, with the
/// insertion sequence breaking ties so equal deadlines fire in FIFO order.
///
/// The entry may be cancelled before it fires.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Insertion order, used to break ties between equal deadlines.
    seq: u64,

    /// Action to perform when the deadline is reached.
    pub(crate) action: TimerAction,

    /// Cancellation flag shared with the [`TimerGuard`].
    cancelled: Rc<Cell<bool>>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then by insertion order.
    ///
    /// The comparison is **reversed** so that a `BinaryHeap<TimerEntry>`
    /// behaves as a min-heap, where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Disarms its timer when dropped.
///
/// Cancelled entries stay in the heap until they reach the front, or until
/// they outnumber the armed ones and the queue compacts itself.
#[must_use = "dropping the guard disarms the timer"]
pub(crate) struct TimerGuard {
    cancelled: Rc<Cell<bool>>,

    /// Disarmed-but-queued counter of the owning queue.
    disarmed: Rc<Cell<usize>>,
}

impl TimerGuard {
    /// Returns `true` once the timer fired or was disarmed.
    pub(crate) fn is_disarmed(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        // Fired entries already left the heap.
        if !self.cancelled.replace(true) {
            self.disarmed.set(self.disarmed.get() + 1);
        }
    }
}

/// Deadline-ordered queue of pending timers.
#[derive(Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
    next_seq: u64,

    /// Entries still in `heap` whose guard was dropped before they fired.
    disarmed: Rc<Cell<usize>>,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` at `deadline`.
    pub(crate) fn insert(&mut self, deadline: Instant, action: TimerAction) -> TimerGuard {
        self.compact();

        let cancelled = Rc::new(Cell::new(false));
        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(TimerEntry {
            deadline,
            seq,
            action,
            cancelled: cancelled.clone(),
        });

        TimerGuard {
            cancelled,
            disarmed: self.disarmed.clone(),
        }
    }

    /// Earliest deadline among the armed timers.
    pub(crate) fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_cancelled();
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Removes every armed timer whose deadline is not after `now`, in
    /// firing order.
    pub(crate) fn expired(&mut self, now: Instant) -> Vec<TimerAction> {
        let mut fired = Vec::new();

        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }

            if let Some(entry) = self.heap.pop() {
                if entry.cancelled.replace(true) {
                    self.forget_disarmed();
                    continue;
                }
                fired.push(entry.action);
            }
        }

        fired
    }

    /// Number of armed timers.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap
            .iter()
            .filter(|entry| !entry.cancelled.get())
            .count()
    }

    /// Number of entries in the heap, disarmed ones included.
    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.heap.len()
    }

    fn discard_cancelled(&mut self) {
        while self
            .heap
            .peek()
            .is_some_and(|entry| entry.cancelled.get())
        {
            self.heap.pop();
            self.forget_disarmed();
        }
    }

    /// Drops every disarmed entry once they make up more than half the heap.
    fn compact(&mut self) {
        let disarmed = self.disarmed.get();

        if disarmed == 0 || disarmed * 2 <= self.heap.len() {
            return;
        }

        self.heap.retain(|entry| !entry.cancelled.get());
        self.disarmed.set(0);

        tracing::trace!(reclaimed = disarmed, armed = self.heap.len(), "timer queue compacted");
    }

    fn forget_disarmed(&self) {
        self.disarmed.set(self.disarmed.get().saturating_sub(1));
    }
}
