use super::Deadline;
use crate::error::{Error, Result};
use crate::runtime::context;
use crate::runtime::park::{WaitSignal, park};

use std::time::Duration;

/// Suspends the current task until `deadline` elapses.
///
/// Other tasks run in the meantime. An already elapsed deadline returns
/// immediately without yielding; [`Deadline::Never`] only returns once the
/// task is canceled.
///
/// # Errors
///
/// Returns [`Error::Canceled`] if the task is canceled before or while
/// sleeping.
///
/// # Panics
///
/// Panics if it has to wait outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep_until(Deadline::after(Duration::from_millis(10))).await?;
/// ```
pub async fn sleep_until(deadline: Deadline) -> Result<()> {
    context::check_canceled()?;

    if deadline.has_elapsed() {
        return Ok(());
    }

    let signal = WaitSignal::new();

    match park(&signal, deadline).await {
        Err(Error::Timeout) => Ok(()),
        other => other,
    }
}

/// Suspends the current task for `duration`.
///
/// Shorthand for [`sleep_until`] with [`Deadline::after`].
pub async fn sleep(duration: Duration) -> Result<()> {
    sleep_until(Deadline::after(duration)).await
}
