//! Typed channels between tasks.
//!
//! A [`Channel`] moves items of one type between tasks of the same runtime.
//! With a capacity of zero it is a rendezvous point: a send completes only
//! once a receiver takes the item. With a positive capacity it buffers up
//! to that many items before senders block.
//!
//! Senders and receivers are matched strictly first-come first-served on
//! each side, and buffered items come out in the order they went in.
//!
//! ## Closing
//!
//! [`Channel::done`] closes the write end: parked and future senders fail
//! with [`Error::BrokenChannel`], while receivers keep draining buffered
//! items and only then observe `BrokenChannel`. Releasing the last owning
//! handle breaks the channel for everyone still holding a [`WeakChannel`].

mod shared;
mod waiter;

use shared::{Shared, TryRecv, TrySend};

use crate::error::{Error, Result, SendError};
use crate::time::Deadline;

use std::fmt;
use std::rc::{Rc, Weak};

/// An owning handle to a channel.
///
/// Cloning a handle ([`duplicate`](Self::duplicate)) adds an owner; dropping
/// it ([`release`](Self::release)) removes one. When the last owner goes
/// away every parked task fails with [`Error::BrokenChannel`] and buffered
/// items are dropped.
///
/// # Examples
///
/// ```rust,ignore
/// let ch = Channel::<u32>::new(0)?;
/// let tx = ch.duplicate();
///
/// let producer = task::spawn(async move {
///     let _ = tx.send(42, Deadline::Never).await;
/// })?;
///
/// assert_eq!(ch.recv(Deadline::Never).await?, 42);
/// producer.join().await?;
/// ```
pub struct Channel<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Channel<T> {
    /// Creates a channel buffering up to `capacity` items.
    ///
    /// A capacity of `0` makes every send a rendezvous with a receiver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the buffer cannot be
    /// allocated.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            shared: Shared::new(capacity)?,
        })
    }

    /// Returns another owning handle to the same channel.
    pub fn duplicate(&self) -> Self {
        self.shared.acquire();

        Self {
            shared: self.shared.clone(),
        }
    }

    /// Gives up this handle.
    ///
    /// Same as dropping it.
    pub fn release(self) {
        drop(self);
    }

    /// Returns a handle that does not keep the channel alive.
    pub fn downgrade(&self) -> WeakChannel<T> {
        WeakChannel {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Sends `item`, waiting for room or a receiver until `deadline`.
    ///
    /// The item goes straight to the oldest parked receiver if there is
    /// one, otherwise into the buffer if it has room. Failing that, the task
    /// parks behind earlier senders.
    ///
    /// # Errors
    ///
    /// The item is handed back inside the [`SendError`], whose kind is:
    /// - [`Error::BrokenChannel`] if the write end is or becomes closed,
    /// - [`Error::Timeout`] if `deadline` elapses first,
    /// - [`Error::Canceled`] if the task is or becomes canceled while it
    ///   would have to wait.
    pub async fn send(&self, item: T, deadline: Deadline) -> Result<(), SendError<T>> {
        self.shared.send(item, deadline).await
    }

    /// Receives the oldest item, waiting until `deadline` for one.
    ///
    /// # Errors
    ///
    /// - [`Error::BrokenChannel`] once the write end is closed and no item
    ///   is left,
    /// - [`Error::Timeout`] if `deadline` elapses first,
    /// - [`Error::Canceled`] if the task is or becomes canceled while it
    ///   would have to wait.
    pub async fn recv(&self, deadline: Deadline) -> Result<T> {
        self.shared.recv(deadline).await
    }

    /// Sends `item` if it can be done without waiting.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Timeout`] if the task would have to wait, or with
    /// [`Error::BrokenChannel`] if the write end is closed.
    pub fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        try_send(&self.shared, item)
    }

    /// Receives an item if one is available without waiting.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Timeout`] if the task would have to wait, or with
    /// [`Error::BrokenChannel`] once the write end is closed and drained.
    pub fn try_recv(&self) -> Result<T> {
        try_recv(&self.shared)
    }

    /// Closes the write end.
    ///
    /// Every parked sender fails with [`Error::BrokenChannel`] and so does
    /// every later send. Buffered items stay available to receivers.
    /// Closing an already closed channel does nothing.
    pub fn done(&self) -> Result<()> {
        self.shared.done();
        Ok(())
    }

    /// Returns `true` once the write end is closed.
    pub fn is_done(&self) -> bool {
        self.shared.state.borrow().is_done()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.shared.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered items.
    pub fn capacity(&self) -> usize {
        self.shared.state.borrow().capacity()
    }

    /// Size in bytes of one item.
    pub fn item_size(&self) -> usize {
        size_of::<T>()
    }

    /// Number of owning handles.
    pub fn handle_count(&self) -> usize {
        self.shared.handles()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

impl<T> Drop for Channel<T> {
    fn drop(&mut self) {
        self.shared.release();
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("done", &self.is_done())
            .field("handles", &self.handle_count())
            .finish()
    }
}

/// A handle that does not keep its channel alive.
///
/// Operations behave as through a [`Channel`] until the last owning handle
/// is released; from then on every one of them fails with
/// [`Error::BrokenChannel`], including those already parked.
pub struct WeakChannel<T> {
    shared: Weak<Shared<T>>,
}

impl<T> WeakChannel<T> {
    /// Returns an owning handle, or `None` once the channel was released.
    pub fn upgrade(&self) -> Option<Channel<T>> {
        let shared = self.live()?;
        shared.acquire();
        Some(Channel { shared })
    }

    fn live(&self) -> Option<Rc<Shared<T>>> {
        self.shared.upgrade().filter(|shared| shared.handles() > 0)
    }

    /// See [`Channel::send`].
    pub async fn send(&self, item: T, deadline: Deadline) -> Result<(), SendError<T>> {
        match self.live() {
            Some(shared) => shared.send(item, deadline).await,
            None => Err(SendError::new(Error::BrokenChannel, item)),
        }
    }

    /// See [`Channel::recv`].
    pub async fn recv(&self, deadline: Deadline) -> Result<T> {
        match self.live() {
            Some(shared) => shared.recv(deadline).await,
            None => Err(Error::BrokenChannel),
        }
    }

    /// See [`Channel::try_send`].
    pub fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        match self.live() {
            Some(shared) => try_send(&shared, item),
            None => Err(SendError::new(Error::BrokenChannel, item)),
        }
    }

    /// See [`Channel::try_recv`].
    pub fn try_recv(&self) -> Result<T> {
        match self.live() {
            Some(shared) => try_recv(&shared),
            None => Err(Error::BrokenChannel),
        }
    }

    /// See [`Channel::done`].
    pub fn done(&self) -> Result<()> {
        if let Some(shared) = self.live() {
            shared.done();
        }
        Ok(())
    }

    /// Returns `true` once the write end is closed or the channel released.
    pub fn is_done(&self) -> bool {
        self.live()
            .is_none_or(|shared| shared.state.borrow().is_done())
    }
}

impl<T> Clone for WeakChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for WeakChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakChannel")
            .field("released", &self.live().is_none())
            .finish()
    }
}

fn try_send<T>(shared: &Shared<T>, item: T) -> Result<(), SendError<T>> {
    match shared.try_send(item) {
        TrySend::Sent => Ok(()),
        TrySend::Full(item) => Err(SendError::new(Error::Timeout, item)),
        TrySend::Broken(item) => Err(SendError::new(Error::BrokenChannel, item)),
    }
}

fn try_recv<T>(shared: &Shared<T>) -> Result<T> {
    match shared.try_recv() {
        TryRecv::Received(item) => Ok(item),
        TryRecv::Empty => Err(Error::Timeout),
        TryRecv::Broken => Err(Error::BrokenChannel),
    }
}
