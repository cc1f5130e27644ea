//! Task executor implementation.
//!
//! The executor owns every live task of a runtime and polls the woken ones
//! in FIFO order, one scheduling pass at a time. It also owns the timer
//! queue backing deadlines and deferred cancellation.
//!
//! The loop that drives passes, timers and idle waiting lives in
//! [`Runtime::block_on`](crate::Runtime::block_on).

mod core;

pub(crate) use core::Executor;
