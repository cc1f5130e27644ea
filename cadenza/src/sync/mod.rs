//! Synchronization primitives for Cadenza.
//!
//! This module provides task-aware communication tools for the runtime.
//! They park the calling task rather than the thread, and wake it when a
//! peer, a deadline or a cancellation resolves the wait.
//!
//! The current primitives include:
//! - [`Channel`], a typed, optionally buffered channel with half-close,
//! - [`WeakChannel`], a handle to it that does not keep it alive.
//!
//! ## Design notes
//!
//! - Channels are single-threaded: every handle lives on the runtime thread
//!   and no lock guards their state.
//! - Every blocking operation takes a [`Deadline`](crate::Deadline).

mod channel;

pub use channel::{Channel, WeakChannel};
