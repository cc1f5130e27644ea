//! Core runtime components.
//!
//! This module contains the fundamental building blocks of the runtime:
//! task execution, scheduling, cooperative yielding and the machinery that
//! parks a task until a peer, a deadline or a cancellation wakes it.
//!
//! It is responsible for:
//! - executing tasks on the current thread in FIFO order,
//! - providing runtime context and the currently running task,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with higher-level APIs built on top of
//! these components rather than using this module directly.

mod core;
mod executor;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod park;
pub(crate) mod yield_now;

pub mod task;

pub use core::Runtime;
