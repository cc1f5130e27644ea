//! # Cadenza
//!
//! **Cadenza** is a small cooperative runtime for Rust: tasks, deadlines and
//! channels on a single thread, designed as the coordination layer for the
//! **Nebula** ecosystem.
//!
//! Exactly one task runs at a time, and it only gives up the thread at an
//! explicit suspension point. That keeps every primitive lock-free and makes
//! scheduling deterministic:
//!
//! - A **FIFO scheduler** with cooperative [`yield_now`] and structured
//!   cancellation through [`task::cancel`]
//! - **Deadlines** on every blocking operation, see [`Deadline`]
//! - **Typed channels** with rendezvous or buffered delivery and half-close,
//!   see [`Channel`]
//! - **Ergonomic macros** `#[cadenza::main]` and `#[cadenza::test]`
//!
//! ## Cancellation
//!
//! Canceling a task sets a sticky flag. From then on every suspension point
//! the task reaches fails with [`Error::Canceled`] instead of waiting, so a
//! canceled task unwinds in a bounded number of steps. A task that keeps
//! computing without suspending is never interrupted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadenza::{Channel, Deadline, task};
//!
//! #[cadenza::main]
//! async fn main() {
//!     let ch = Channel::<u32>::new(0).unwrap();
//!     let tx = ch.duplicate();
//!
//!     let producer = task::spawn(async move {
//!         let _ = tx.send(42, Deadline::Never).await;
//!     })
//!     .unwrap();
//!
//!     assert_eq!(ch.recv(Deadline::Never).await, Ok(42));
//!     producer.join().await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`task`] — Spawning, cancellation and task sets
//! - [`time`] — Deadlines and sleeping
//! - [`sync`] — Channels
//!
//! ## Getting Started
//!
//! Add Cadenza to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cadenza = { git = "https://github.com/Nebula-ecosystem/Cadenza", package = "cadenza" }
//! ```

mod error;
mod runtime;
mod utils;

pub mod sync;
pub mod time;

pub use error::{Error, Result, SendError};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;
pub use sync::{Channel, WeakChannel};
pub use time::Deadline;

pub use cadenza_macros::{main, test};
