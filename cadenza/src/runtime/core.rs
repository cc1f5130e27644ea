use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use super::context;
use super::executor::Executor;
use super::task::{TaskHandle, TaskHeader};
use crate::error::{Error, Result};
use crate::time;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning tasks,
/// - driving task execution on the current thread,
/// - firing timers for deadlines and deferred cancellation,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// A runtime is not `Send`: tasks, channels and timers live on the thread
/// that created it. Dropping the runtime drops every task still alive.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Rc<Executor>,

    /// Name recorded on the `runtime` span.
    name: String,
}

impl Runtime {
    /// Creates a new runtime instance.
    ///
    /// # Arguments
    ///
    /// * `max_tasks` - Cap on live spawned tasks, unbounded if `None`.
    /// * `name` - Name recorded on the runtime's tracing span.
    pub(crate) fn new(max_tasks: Option<usize>, name: String) -> Self {
        Self {
            executor: Rc::new(Executor::new(max_tasks)),
            name,
        }
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task starts running once [`block_on`](Self::block_on) drives the
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the runtime is at its task
    /// limit.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// runtime.spawn(async {
    ///     // background task
    /// })?;
    /// ```
    pub fn spawn<F>(&self, future: F) -> Result<TaskHandle>
    where
        F: Future<Output = ()> + 'static,
    {
        let header = self.executor.spawn(Box::pin(future))?;
        Ok(TaskHandle::new(header))
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// The future becomes the root task. Spawned tasks are driven alongside
    /// it for as long as it runs; tasks still alive when it returns stay
    /// suspended until the next `block_on` or until the runtime is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deadlock`] if every task is blocked with no timer
    /// left to wake any of them. The root future is dropped in that case.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// })?;
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let span = tracing::debug_span!("runtime", name = %self.name);
        let _enter = span.enter();

        let output = Rc::new(RefCell::new(None));
        let slot = output.clone();

        context::enter_context(self.executor.clone(), || {
            let root = self.executor.spawn_root(Box::pin(async move {
                let value = future.await;
                *slot.borrow_mut() = Some(value);
            }));

            self.drive(&root)
        })?;

        let value = output
            .borrow_mut()
            .take()
            .expect("root task finished without an output");

        Ok(value)
    }

    /// Runs scheduling passes until `root` finishes.
    fn drive(&self, root: &TaskHeader) -> Result<()> {
        loop {
            self.executor.fire_timers(time::now());
            self.executor.run_pass();

            if root.state().is_done() {
                return Ok(());
            }

            if self.executor.has_ready() {
                continue;
            }

            match self.executor.next_deadline() {
                Some(deadline) => self.executor.park_until(deadline),
                None => {
                    tracing::warn!(
                        tasks = self.executor.live_tasks(),
                        "deadlock: every task is blocked and no timer is pending"
                    );

                    self.executor.abort(root.key);
                    return Err(Error::Deadlock);
                }
            }
        }
    }

    /// Number of tasks spawned on this runtime that have not finished.
    pub fn live_tasks(&self) -> usize {
        self.executor.live_tasks()
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime, dropping every task that is still alive.
    fn drop(&mut self) {
        context::enter_context(self.executor.clone(), || self.executor.shutdown());
    }
}
