use crate::runtime::park::WaitSignal;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A task parked on one side of a channel.
///
/// Senders park with their item in `slot`; a receiver takes it out before
/// resolving the signal. Receivers park with an empty `slot` that a sender
/// fills.
pub(super) struct Waiter<T> {
    pub(super) signal: WaitSignal,
    pub(super) slot: RefCell<Option<T>>,
}

impl<T> Waiter<T> {
    pub(super) fn new(item: Option<T>) -> Rc<Self> {
        Rc::new(Self {
            signal: WaitSignal::new(),
            slot: RefCell::new(item),
        })
    }

    pub(super) fn take(&self) -> Option<T> {
        self.slot.borrow_mut().take()
    }

    pub(super) fn put(&self, item: T) {
        *self.slot.borrow_mut() = Some(item);
    }
}

/// FIFO of parked waiters on one side of a channel.
pub(super) type WaiterQueue<T> = VecDeque<Rc<Waiter<T>>>;

/// Unlinks `waiter` from `queue`, if it is still there.
pub(super) fn unlink<T>(queue: &mut WaiterQueue<T>, waiter: &Rc<Waiter<T>>) {
    queue.retain(|queued| !Rc::ptr_eq(queued, waiter));
}

/// Breaks every waiter in `queue` with `error`.
pub(super) fn break_all<T>(queue: &mut WaiterQueue<T>, error: crate::Error) -> usize {
    let broken = queue.len();

    for waiter in queue.drain(..) {
        waiter.signal.resolve(Err(error));
    }

    broken
}
