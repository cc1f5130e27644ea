//! Task primitives.
//!
//! A task is a future driven by the runtime until it returns. Tasks are
//! created with [`spawn`], observed through a [`TaskHandle`], and torn down
//! with [`cancel`], either one at a time or as a group through [`TaskSet`].
//!
//! Cancellation is cooperative: it sets a sticky flag on the task, and the
//! next suspension point the task reaches (or is parked at) fails with
//! [`Error::Canceled`](crate::Error::Canceled).

mod cancel;
mod core;
mod handle;
mod set;
mod state;
pub(crate) mod waker;

pub use cancel::cancel;
pub use core::{TaskId, current_id, spawn};
pub use handle::TaskHandle;
pub use set::TaskSet;
pub use state::TaskState;

pub(crate) use core::TaskHeader;
