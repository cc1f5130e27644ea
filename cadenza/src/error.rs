//! Error types shared by every runtime primitive.

use std::fmt;

/// Failure kinds reported by tasks, timers and channels.
///
/// `Timeout` and `Canceled` both abort a wait, but they are not the same
/// thing: `Timeout` belongs to a single call, while `Canceled` comes from
/// [`task::cancel`](crate::task::cancel) and stays set for the rest of the
/// task's life. `BrokenChannel` is a property of the channel and is reported
/// again by every later call on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// The deadline elapsed before the operation could complete.
    #[error("operation timed out")]
    Timeout,

    /// The channel's write end is closed and no data remains, or every
    /// owning handle to it was released.
    #[error("channel is broken")]
    BrokenChannel,

    /// The calling task was canceled.
    #[error("task was canceled")]
    Canceled,

    /// A task slot or channel buffer could not be allocated.
    #[error("resource exhausted")]
    ResourceExhausted,

    /// Every task is blocked and no timer is pending.
    ///
    /// Only returned by [`Runtime::block_on`](crate::Runtime::block_on).
    #[error("all tasks are blocked and no timer is pending")]
    Deadlock,
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by [`Channel::send`](crate::Channel::send) and friends.
///
/// The item that could not be delivered is handed back to the caller.
pub struct SendError<T> {
    error: Error,
    item: T,
}

impl<T> SendError<T> {
    pub(crate) fn new(error: Error, item: T) -> Self {
        Self { error, item }
    }

    /// The reason the send failed.
    pub fn error(&self) -> Error {
        self.error
    }

    /// Recovers the item that was not sent.
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Splits the error into its kind and the unsent item.
    pub fn into_parts(self) -> (Error, T) {
        (self.error, self.item)
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send failed: {}", self.error)
    }
}

impl<T> std::error::Error for SendError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<SendError<T>> for Error {
    fn from(err: SendError<T>) -> Self {
        err.error
    }
}
