use crate::error::{Error, Result};
use crate::runtime::context;
use crate::runtime::task::waker::{ReadyQueue, TaskWaker};
use crate::runtime::task::{TaskHeader, TaskState};
use crate::time::timer::{TimerAction, TimerGuard, TimerQueue};
use crate::utils::{Key, Slab};

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A live task owned by the executor.
struct TaskSlot {
    header: Rc<TaskHeader>,

    /// Taken out while the task is being polled.
    future: Option<BoxFuture>,

    /// The `block_on` future; it does not count towards `max_tasks`.
    root: bool,
}

/// Single-threaded task executor.
///
/// The `Executor` is responsible for:
/// - storing live tasks and their futures,
/// - polling woken tasks in FIFO order, one pass at a time,
/// - owning the timer queue that backs deadlines and deferred cancellation.
///
/// All of its state lives on the runtime thread. Only the ready queue is
/// shared, because wakers may be cloned to other threads.
pub(crate) struct Executor {
    tasks: RefCell<Slab<TaskSlot>>,
    ready: Arc<ReadyQueue>,
    timers: RefCell<TimerQueue>,

    /// Upper bound on live spawned tasks, if any.
    max_tasks: Option<usize>,

    /// Live tasks created through `spawn`.
    spawned: Cell<usize>,
}

impl Executor {
    pub(crate) fn new(max_tasks: Option<usize>) -> Self {
        Self {
            tasks: RefCell::new(Slab::new(64)),
            ready: Arc::new(ReadyQueue::new()),
            timers: RefCell::new(TimerQueue::new()),
            max_tasks,
            spawned: Cell::new(0),
        }
    }

    /// Registers a new task and queues it for the next pass.
    ///
    /// Fails with [`Error::ResourceExhausted`] once `max_tasks` live tasks
    /// exist.
    pub(crate) fn spawn(&self, future: BoxFuture) -> Result<Rc<TaskHeader>> {
        if let Some(max) = self.max_tasks {
            if self.spawned.get() >= max {
                tracing::debug!(max, "task limit reached; spawn refused");
                return Err(Error::ResourceExhausted);
            }
        }

        let header = self.insert(future, false);
        self.spawned.set(self.spawned.get() + 1);

        tracing::debug!(
            task = %header.id,
            parent = ?context::current_task().map(|task| task.id),
            "task spawned"
        );

        Ok(header)
    }

    /// Registers the future driven by `block_on`.
    pub(crate) fn spawn_root(&self, future: BoxFuture) -> Rc<TaskHeader> {
        self.insert(future, true)
    }

    fn insert(&self, future: BoxFuture, root: bool) -> Rc<TaskHeader> {
        let ready = &self.ready;
        let mut header = None;

        self.tasks.borrow_mut().insert_with(|key| {
            let task = Rc::new(TaskHeader::new(key, TaskWaker::new(key, ready.clone())));
            header = Some(task.clone());

            TaskSlot {
                header: task,
                future: Some(future),
                root,
            }
        });

        match header {
            Some(header) => header,
            None => unreachable!("slab always runs the constructor"),
        }
    }

    /// Arms `action` to run once `deadline` is reached.
    pub(crate) fn add_timer(&self, deadline: Instant, action: TimerAction) -> TimerGuard {
        tracing::trace!(?deadline, "timer armed");
        self.timers.borrow_mut().insert(deadline, action)
    }

    /// Runs every timer due at `now`.
    pub(crate) fn fire_timers(&self, now: Instant) {
        let fired = self.timers.borrow_mut().expired(now);

        for action in fired {
            match action {
                TimerAction::Wake(waker) => {
                    tracing::trace!("deadline elapsed; waking task");
                    waker.wake();
                }
                TimerAction::Cancel(task) => {
                    if let Some(task) = task.upgrade() {
                        task.cancel();
                    }
                }
            }
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.timers.borrow_mut().next_deadline()
    }

    pub(crate) fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Parks the thread until a task is woken or `deadline` passes.
    pub(crate) fn park_until(&self, deadline: Instant) {
        self.ready.park_until(deadline);
    }

    /// Polls every task queued before the pass started, in wake order.
    ///
    /// Tasks spawned or woken during the pass run on the next one.
    pub(crate) fn run_pass(&self) {
        for key in self.ready.take_batch() {
            self.poll_task(key);
        }
    }

    fn poll_task(&self, key: Key) {
        let (header, mut future) = {
            let mut tasks = self.tasks.borrow_mut();

            let Some(slot) = tasks.get_mut(key) else {
                return;
            };
            let Some(future) = slot.future.take() else {
                return;
            };

            (slot.header.clone(), future)
        };

        header.waker.unschedule();
        header.set_state(TaskState::Running);

        let waker = header.waker.waker();
        let mut cx = Context::from_waker(&waker);

        let poll = context::enter_task(header.clone(), || future.as_mut().poll(&mut cx));

        match poll {
            Poll::Ready(()) => {
                drop(future);
                self.finish(key, &header);
            }
            Poll::Pending => {
                header.set_state(if header.waker.is_scheduled() {
                    TaskState::Runnable
                } else {
                    TaskState::Blocked
                });

                if let Some(slot) = self.tasks.borrow_mut().get_mut(key) {
                    slot.future = Some(future);
                }
            }
        }
    }

    fn finish(&self, key: Key, header: &TaskHeader) {
        let slot = self.tasks.borrow_mut().remove(key);

        if slot.is_some_and(|slot| !slot.root) {
            self.spawned.set(self.spawned.get() - 1);
        }

        header.complete();

        tracing::trace!(task = %header.id, canceled = header.is_canceled(), "task finished");
    }

    /// Drops a task without polling it again.
    pub(crate) fn abort(&self, key: Key) {
        let slot = self.tasks.borrow_mut().remove(key);

        if let Some(slot) = slot {
            if !slot.root {
                self.spawned.set(self.spawned.get() - 1);
            }

            drop(slot.future);
            slot.header.complete();
        }
    }

    /// Number of live tasks, the root included.
    pub(crate) fn live_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Drops every remaining task.
    ///
    /// Futures are dropped outside of the slab borrow since their
    /// destructors may reach back into the executor.
    pub(crate) fn shutdown(&self) {
        let slots = self.tasks.borrow_mut().drain();

        if slots.is_empty() {
            return;
        }

        tracing::warn!(tasks = slots.len(), "runtime dropped with live tasks");

        for slot in slots {
            drop(slot.future);
            slot.header.complete();
        }

        self.spawned.set(0);
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::context;
    use crate::{Channel, Deadline, RuntimeBuilder, task};

    use std::time::Duration;

    #[test]
    fn finished_hand_offs_leave_no_timers_behind() {
        let rt = RuntimeBuilder::new().build();
        let patience = || Deadline::after(Duration::from_secs(3600));

        let queued = rt
            .block_on(async move {
                let ch = Channel::new(0).unwrap();
                let tx = ch.duplicate();

                let producer = task::spawn(async move {
                    for i in 0..10_000u32 {
                        tx.send(i, patience()).await.unwrap();
                    }
                })
                .unwrap();

                for i in 0..10_000u32 {
                    assert_eq!(ch.recv(patience()).await, Ok(i));
                }
                producer.join().await.unwrap();

                context::executor().timers.borrow().queued()
            })
            .unwrap();

        assert!(queued <= 8, "{queued} timer entries left");
    }
}
