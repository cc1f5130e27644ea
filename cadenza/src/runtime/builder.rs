use super::Runtime;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime: a cap on live spawned tasks and a name
/// carried by the runtime's tracing span.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .max_tasks(1024)
///     .name("worker")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    /// Maximum number of live spawned tasks, unbounded if `None`.
    max_tasks: Option<usize>,

    /// Name recorded on the runtime span.
    name: String,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// By default the number of tasks is only bounded by memory and the
    /// runtime is named `"cadenza"`.
    pub fn new() -> Self {
        Self {
            max_tasks: None,
            name: String::from("cadenza"),
        }
    }

    /// Caps the number of live spawned tasks.
    ///
    /// Once the cap is reached, [`task::spawn`](crate::task::spawn) fails
    /// with [`Error::ResourceExhausted`](crate::Error::ResourceExhausted)
    /// until a task finishes. The `block_on` future does not count.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let builder = RuntimeBuilder::new()
    ///     .max_tasks(2);
    /// ```
    pub fn max_tasks(mut self, n: usize) -> Self {
        assert!(n > 0, "max_tasks must be > 0");

        self.max_tasks = Some(n);
        self
    }

    /// Sets the name recorded on the runtime's tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Runtime {
        Runtime::new(self.max_tasks, self.name)
    }
}

impl Default for RuntimeBuilder {
    /// Creates a default `RuntimeBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
