/// A key into a [`Slab`].
///
/// The generation makes keys of removed entries stale: once a slot is
/// reused, the old key no longer resolves to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

/// A simple slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and
/// returns keys whose slot can be reused after removal.
///
/// Internally, it keeps track of:
/// - occupied and vacant slots,
/// - free indices,
/// - a per-slot generation counter bumped on every removal.
pub(crate) struct Slab<T> {
    /// Storage for items (vacant slots hold `None`).
    slots: Vec<Slot<T>>,
    /// Stack of free indices that can be reused.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with `size` preallocated vacant slots.
    pub(crate) fn new(size: usize) -> Self {
        let slots = (0..size)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        let free = (0..size).rev().collect();

        Self {
            slots,
            free,
            len: 0,
        }
    }

    /// Inserts the value built by `make` and returns its key.
    ///
    /// `make` receives the key so the value can record its own identity.
    /// If a free slot is available, it is reused. Otherwise, the slab grows.
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(Key) -> T) -> Key {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        let key = Key {
            index,
            generation: slot.generation,
        };
        slot.value = Some(make(key));
        self.len += 1;

        key
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the key is stale or was never issued.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.slots.get_mut(key.index)?;
        if slot.generation != key.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation += 1;
        self.free.push(key.index);
        self.len -= 1;

        Some(value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.index)?;
        if slot.generation != key.generation {
            return None;
        }

        slot.value.as_mut()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every value, leaving all slots vacant.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation += 1;
                self.free.push(index);
                values.push(value);
            }
        }

        self.len = 0;
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove() {
        let mut slab = Slab::new(2);

        let a = slab.insert_with(|_| "a");
        let b = slab.insert_with(|_| "b");
        assert_eq!(slab.len(), 2);

        assert_eq!(slab.remove(a), Some("a"));
        assert_eq!(slab.get_mut(b).copied(), Some("b"));
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn grows_past_initial_size() {
        let mut slab = Slab::new(1);

        let keys: Vec<Key> = (0..10).map(|i| slab.insert_with(move |_| i)).collect();

        assert_eq!(slab.len(), 10);
        for (i, key) in keys.into_iter().enumerate() {
            assert_eq!(slab.remove(key), Some(i));
        }
    }

    #[test]
    fn stale_key_does_not_resolve_reused_slot() {
        let mut slab = Slab::new(1);

        let old = slab.insert_with(|_| 1);
        slab.remove(old);
        let new = slab.insert_with(|_| 2);

        assert_eq!(old.index, new.index);
        assert!(slab.get_mut(old).is_none());
        assert!(slab.remove(old).is_none());
        assert_eq!(slab.get_mut(new).copied(), Some(2));
    }

    #[test]
    fn value_sees_its_key() {
        let mut slab = Slab::new(0);

        let key = slab.insert_with(|key| key);

        assert_eq!(slab.get_mut(key).copied(), Some(key));
    }

    #[test]
    fn drain_empties_slab() {
        let mut slab = Slab::new(4);
        let key = slab.insert_with(|_| 'x');
        slab.insert_with(|_| 'y');

        let mut drained = slab.drain();
        drained.sort();

        assert_eq!(drained, vec!['x', 'y']);
        assert_eq!(slab.len(), 0);
        assert!(slab.get_mut(key).is_none());
    }
}
