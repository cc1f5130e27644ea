use crate::utils::Key;

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Wake, Waker};
use std::time::Instant;

/// FIFO of tasks to poll on the next scheduling pass.
///
/// Wakers must be `Send + Sync`, so this is the only piece of scheduler
/// state behind a lock; everything else lives on the runtime thread.
#[derive(Default)]
pub(crate) struct ReadyQueue {
    queue: Mutex<VecDeque<Key>>,

    /// Signalled on every push, so an idle runtime waiting for its next
    /// timer also notices wakes coming from other threads.
    condvar: Condvar,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, key: Key) {
        self.queue.lock().push_back(key);
        self.condvar.notify_one();
    }

    /// Takes every task queued so far, leaving the queue empty.
    ///
    /// Tasks woken while the batch is processed land in the next pass.
    pub(crate) fn take_batch(&self) -> VecDeque<Key> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Blocks the thread until a task is queued or `deadline` passes.
    pub(crate) fn park_until(&self, deadline: Instant) {
        let mut queue = self.queue.lock();

        while queue.is_empty() {
            if self.condvar.wait_until(&mut queue, deadline).timed_out() {
                break;
            }
        }
    }
}

/// Waker shared by every suspension point of one task.
///
/// Waking pushes the task onto the ready queue at most once per pass.
pub(crate) struct TaskWaker {
    key: Key,
    scheduled: AtomicBool,
    ready: Arc<ReadyQueue>,
}

impl TaskWaker {
    /// Creates the waker of a freshly spawned task and queues the task.
    pub(crate) fn new(key: Key, ready: Arc<ReadyQueue>) -> Arc<Self> {
        let waker = Arc::new(Self {
            key,
            scheduled: AtomicBool::new(false),
            ready,
        });
        waker.schedule();
        waker
    }

    /// Queues the task unless it is already queued.
    pub(crate) fn schedule(&self) {
        if !self.scheduled.swap(true, Ordering::AcqRel) {
            self.ready.push(self.key);
        }
    }

    /// Clears the scheduled flag right before the task is polled, so a wake
    /// during the poll queues it again.
    pub(crate) fn unschedule(&self) {
        self.scheduled.store(false, Ordering::Release);
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Acquire)
    }

    pub(crate) fn waker(self: &Arc<Self>) -> Waker {
        Waker::from(self.clone())
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.schedule();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Slab;

    #[test]
    fn wakes_are_coalesced_until_polled() {
        let ready = Arc::new(ReadyQueue::new());
        let mut slab = Slab::new(1);
        let key = slab.insert_with(|_| ());

        let task = TaskWaker::new(key, ready.clone());
        let waker = task.waker();
        waker.wake_by_ref();
        waker.wake_by_ref();

        assert_eq!(ready.take_batch(), VecDeque::from([key]));

        task.unschedule();
        assert!(ready.is_empty());

        waker.wake();
        assert!(task.is_scheduled());
        assert_eq!(ready.take_batch().len(), 1);
    }

    #[test]
    fn park_returns_once_deadline_passes() {
        let ready = ReadyQueue::new();
        let start = Instant::now();
        let deadline = start + std::time::Duration::from_millis(5);

        ready.park_until(deadline);

        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn park_returns_early_when_a_task_is_queued() {
        let ready = Arc::new(ReadyQueue::new());
        let mut slab = Slab::new(1);
        let key = slab.insert_with(|_| ());

        let task = TaskWaker::new(key, ready.clone());
        let waker = task.waker();
        ready.take_batch();
        task.unschedule();

        let remote = std::thread::spawn(move || waker.wake());
        ready.park_until(Instant::now() + std::time::Duration::from_secs(30));
        remote.join().unwrap();

        assert_eq!(ready.take_batch(), VecDeque::from([key]));
    }
}
