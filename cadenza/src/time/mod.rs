//! Time utilities.
//!
//! Every blocking operation in the crate takes a [`Deadline`], an absolute
//! point on the monotonic clock returned by [`now`].
//!
//! It includes:
//! - [`sleep_until`] and [`sleep`] for suspending a task,
//! - the runtime timer queue that wakes parked tasks and fires deferred
//!   cancellations.

mod deadline;
mod sleep;

pub(crate) mod timer;

#[doc(inline)]
pub use deadline::{Deadline, now};

#[doc(inline)]
pub use sleep::{sleep, sleep_until};
