//! Ordered listener registry
//!
//! Stores subscriber callbacks with O(1) add/remove while preserving
//! registration order for delivery. Handles are versioned slotmap keys,
//! so a stale handle can never detach a listener that reused its slot.
//!
//! The registry does not run callbacks itself: notification needs to
//! release all borrows before entering user code (listeners may
//! reenter the holder), so the holder takes a snapshot first and
//! re-checks liveness per entry while delivering.

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Stable handle for a registered listener.
    pub struct ListenerId;
}

pub(crate) type Callback<T> = Rc<dyn Fn(&T)>;

/// Ordered collection of subscriber callbacks.
pub struct ListenerRegistry<T> {
    entries: SlotMap<ListenerId, Callback<T>>,
    /// Insertion order. May contain ids already removed from
    /// `entries`; those are skipped on snapshot and compacted on add.
    order: SmallVec<[ListenerId; 4]>,
}

impl<T> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            order: SmallVec::new(),
        }
    }

    /// Register a callback. O(1) amortized.
    pub fn add(&mut self, callback: Callback<T>) -> ListenerId {
        if self.order.len() >= 8 && self.order.len() >= self.entries.len() * 2 {
            let entries = &self.entries;
            self.order.retain(|id| entries.contains_key(*id));
        }
        let id = self.entries.insert(callback);
        self.order.push(id);
        id
    }

    /// Detach a callback. O(1); the order list is compacted lazily.
    /// Returns `false` if the handle was already removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Live callbacks in registration order. Cloning the `Rc`s lets
    /// the caller drop its borrow of the registry before invoking any
    /// of them.
    pub(crate) fn snapshot(&self) -> SmallVec<[(ListenerId, Callback<T>); 4]> {
        self.order
            .iter()
            .filter_map(|&id| self.entries.get(id).map(|cb| (id, Rc::clone(cb))))
            .collect()
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
