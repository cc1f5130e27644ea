use super::waiter::{Waiter, WaiterQueue, break_all, unlink};
use crate::error::{Error, Result, SendError};
use crate::runtime::context;
use crate::runtime::park::park;
use crate::time::Deadline;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Outcome of a send attempt that never blocks.
pub(super) enum TrySend<T> {
    Sent,
    Full(T),
    Broken(T),
}

/// Outcome of a receive attempt that never blocks.
pub(super) enum TryRecv<T> {
    Received(T),
    Empty,
    Broken,
}

pub(super) struct State<T> {
    buffer: VecDeque<T>,
    capacity: usize,

    /// Parked senders, oldest first. Each carries its pending item.
    senders: WaiterQueue<T>,

    /// Parked receivers, oldest first.
    receivers: WaiterQueue<T>,

    /// Write end closed, either by `done` or by releasing the last handle.
    done: bool,
}

impl<T> State<T> {
    fn new(capacity: usize) -> Result<Self> {
        let mut buffer = VecDeque::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| Error::ResourceExhausted)?;

        Ok(Self {
            buffer,
            capacity,
            senders: VecDeque::new(),
            receivers: VecDeque::new(),
            done: false,
        })
    }

    /// Hands `item` to the oldest parked receiver, or buffers it.
    pub(super) fn offer(&mut self, item: T) -> TrySend<T> {
        if self.done {
            return TrySend::Broken(item);
        }

        while let Some(receiver) = self.receivers.pop_front() {
            if receiver.signal.is_resolved() {
                continue;
            }

            receiver.put(item);
            receiver.signal.resolve(Ok(()));

            tracing::trace!("item handed to a parked receiver");
            return TrySend::Sent;
        }

        if self.buffer.len() < self.capacity {
            self.buffer.push_back(item);
            return TrySend::Sent;
        }

        TrySend::Full(item)
    }

    /// Takes the oldest available item.
    ///
    /// Buffered items come first; popping one pulls the oldest parked
    /// sender's item into the freed slot. With nothing buffered, a parked
    /// sender hands its item over directly.
    pub(super) fn take(&mut self) -> TryRecv<T> {
        if let Some(item) = self.buffer.pop_front() {
            if let Some(item) = self.take_from_sender() {
                self.buffer.push_back(item);
            }
            return TryRecv::Received(item);
        }

        if let Some(item) = self.take_from_sender() {
            tracing::trace!("item taken from a parked sender");
            return TryRecv::Received(item);
        }

        if self.done {
            return TryRecv::Broken;
        }

        TryRecv::Empty
    }

    fn take_from_sender(&mut self) -> Option<T> {
        while let Some(sender) = self.senders.pop_front() {
            if sender.signal.is_resolved() {
                continue;
            }

            if let Some(item) = sender.take() {
                sender.signal.resolve(Ok(()));
                return Some(item);
            }
        }

        None
    }

    /// Closes the write end.
    ///
    /// Parked senders fail right away. Parked receivers only fail if nothing
    /// is buffered; otherwise they drain the buffer first.
    pub(super) fn close(&mut self) -> Option<(usize, usize)> {
        if self.done {
            return None;
        }

        self.done = true;

        let senders = break_all(&mut self.senders, Error::BrokenChannel);
        let receivers = if self.buffer.is_empty() {
            break_all(&mut self.receivers, Error::BrokenChannel)
        } else {
            0
        };

        Some((senders, receivers))
    }

    pub(super) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(super) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(super) fn is_done(&self) -> bool {
        self.done
    }
}

/// Channel state shared by every handle.
pub(super) struct Shared<T> {
    pub(super) state: RefCell<State<T>>,

    /// Live owning handles. Reaching zero releases the channel.
    handles: Cell<usize>,
}

impl<T> Shared<T> {
    pub(super) fn new(capacity: usize) -> Result<Rc<Self>> {
        Ok(Rc::new(Self {
            state: RefCell::new(State::new(capacity)?),
            handles: Cell::new(1),
        }))
    }

    pub(super) fn handles(&self) -> usize {
        self.handles.get()
    }

    pub(super) fn acquire(&self) {
        self.handles.set(self.handles.get() + 1);
    }

    /// Drops one owning handle, releasing the channel with the last one.
    pub(super) fn release(&self) {
        let handles = self.handles.get() - 1;
        self.handles.set(handles);

        if handles > 0 {
            return;
        }

        let buffered = {
            let mut state = self.state.borrow_mut();
            state.done = true;

            let senders = break_all(&mut state.senders, Error::BrokenChannel);
            let receivers = break_all(&mut state.receivers, Error::BrokenChannel);

            if senders + receivers > 0 {
                tracing::debug!(senders, receivers, "channel released with parked tasks");
            }

            std::mem::take(&mut state.buffer)
        };

        // Item destructors run without the state borrowed.
        drop(buffered);
    }

    pub(super) fn done(&self) {
        let closed = self.state.borrow_mut().close();

        if let Some((senders, receivers)) = closed {
            tracing::debug!(senders, receivers, "channel write end closed");
        }
    }

    pub(super) fn try_send(&self, item: T) -> TrySend<T> {
        self.state.borrow_mut().offer(item)
    }

    pub(super) fn try_recv(&self) -> TryRecv<T> {
        self.state.borrow_mut().take()
    }

    pub(super) async fn send(&self, item: T, deadline: Deadline) -> Result<(), SendError<T>> {
        let item = match self.try_send(item) {
            TrySend::Sent => return Ok(()),
            TrySend::Broken(item) => return Err(SendError::new(Error::BrokenChannel, item)),
            TrySend::Full(item) => item,
        };

        if let Err(error) = context::check_canceled() {
            return Err(SendError::new(error, item));
        }

        if deadline.has_elapsed() {
            return Err(SendError::new(Error::Timeout, item));
        }

        let waiter = Waiter::new(Some(item));
        let queued = Queued::push(self, waiter.clone(), Side::Send);

        let outcome = park(&waiter.signal, deadline).await;
        drop(queued);

        match waiter.take() {
            None => Ok(()),
            Some(item) => {
                let error = outcome.err().unwrap_or(Error::BrokenChannel);
                Err(SendError::new(error, item))
            }
        }
    }

    pub(super) async fn recv(&self, deadline: Deadline) -> Result<T> {
        match self.try_recv() {
            TryRecv::Received(item) => return Ok(item),
            TryRecv::Broken => return Err(Error::BrokenChannel),
            TryRecv::Empty => {}
        }

        context::check_canceled()?;

        if deadline.has_elapsed() {
            return Err(Error::Timeout);
        }

        let waiter = Waiter::new(None);
        let queued = Queued::push(self, waiter.clone(), Side::Recv);

        let outcome = park(&waiter.signal, deadline).await;
        drop(queued);

        match waiter.take() {
            Some(item) => Ok(item),
            None => Err(outcome.err().unwrap_or(Error::BrokenChannel)),
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Send,
    Recv,
}

/// Keeps a waiter linked into its queue while the operation is parked.
///
/// Unlinks it on drop, so a timed out, canceled or dropped operation is
/// never matched afterwards.
struct Queued<'a, T> {
    shared: &'a Shared<T>,
    waiter: Rc<Waiter<T>>,
    side: Side,
}

impl<'a, T> Queued<'a, T> {
    fn push(shared: &'a Shared<T>, waiter: Rc<Waiter<T>>, side: Side) -> Self {
        let mut state = shared.state.borrow_mut();

        match side {
            Side::Send => state.senders.push_back(waiter.clone()),
            Side::Recv => state.receivers.push_back(waiter.clone()),
        }

        drop(state);

        Self {
            shared,
            waiter,
            side,
        }
    }
}

impl<T> Drop for Queued<'_, T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.borrow_mut();

        match self.side {
            Side::Send => unlink(&mut state.senders, &self.waiter),
            Side::Recv => unlink(&mut state.receivers, &self.waiter),
        }
    }
}
