//! Host binding helpers
//!
//! The UI host is an external actor. It owes the core exactly two
//! behaviors per region (the host's unit of mount/unmount):
//!
//! 1. lazily construct one store on first access, cache it, and
//!    dispose it exactly once when the region is permanently removed;
//! 2. re-run the region's render whenever any of a declared set of
//!    observables notifies, and drop all of those subscriptions
//!    together at teardown.
//!
//! This module ships those two contracts as concrete primitives the
//! host composes: [`StoreSlot`] / [`RegionStores`] for ownership, and
//! [`RegionSubscription`] for the fan-in watch. No UI-tree logic lives
//! here.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::{Result, StateError};
use crate::holder::Subscription;
use crate::observable::Observable;
use crate::store::{mount_store, Store, StoreContext, StoreHandle};

/// Idempotent lazy store ownership for one region.
///
/// `get_or_mount` constructs at most once, no matter how many times
/// the lazy-creation check runs before the handle is cached. After
/// [`StoreSlot::dispose`] the slot is spent: the region was removed
/// permanently, so the store is never rebuilt.
pub struct StoreSlot<S: Store> {
    handle: Option<StoreHandle<S>>,
    disposed: bool,
}

impl<S: Store> StoreSlot<S> {
    pub fn new() -> Self {
        Self {
            handle: None,
            disposed: false,
        }
    }

    /// The cached store, mounting it first if this is the first
    /// access.
    pub fn get_or_mount(
        &mut self,
        build: impl FnOnce(&StoreContext) -> S,
    ) -> Result<&mut StoreHandle<S>> {
        if self.disposed {
            return Err(StateError::UsedAfterDisposal("store slot".to_string()));
        }
        Ok(self.handle.get_or_insert_with(|| mount_store(build)))
    }

    pub fn get(&self) -> Option<&StoreHandle<S>> {
        self.handle.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut StoreHandle<S>> {
        self.handle.as_mut()
    }

    pub fn is_mounted(&self) -> bool {
        !self.disposed && self.handle.is_some()
    }

    /// Tear the region's store down. Exactly once: a second call, or
    /// any later `get_or_mount`, reports `UsedAfterDisposal`. A slot
    /// whose store was never mounted can still be disposed (the
    /// region came and went without ever reading state).
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Err(StateError::UsedAfterDisposal("store slot".to_string()));
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.dispose()?;
        }
        self.disposed = true;
        Ok(())
    }
}

impl<S: Store> Default for StoreSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Store slots keyed by the host's region key.
pub struct RegionStores<K: Eq + Hash, S: Store> {
    slots: FxHashMap<K, StoreSlot<S>>,
}

impl<K: Eq + Hash, S: Store> RegionStores<K, S> {
    pub fn new() -> Self {
        Self {
            slots: FxHashMap::default(),
        }
    }

    /// The slot for a region, created empty on first access.
    pub fn slot(&mut self, key: K) -> &mut StoreSlot<S> {
        self.slots.entry(key).or_default()
    }

    /// Permanently remove a region: dispose its store if one was
    /// mounted and drop the slot. Unknown keys are a no-op.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        if let Some(mut slot) = self.slots.remove(key) {
            if !slot.disposed {
                slot.dispose()?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K: Eq + Hash, S: Store> Default for RegionStores<K, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-in subscription for one region: any watched observable firing
/// invokes that observable's registered callback, and teardown drops
/// every subscription together.
pub struct RegionSubscription {
    subscriptions: Vec<Subscription>,
}

impl RegionSubscription {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Watch one observable. The callback runs on every notification;
    /// there is no immediate delivery (the region just rendered with
    /// the current value).
    pub fn watch<T: Clone + 'static>(
        &mut self,
        observable: &Observable<T>,
        on_change: impl Fn() + 'static,
    ) -> Result<()> {
        let subscription = observable.add_listener(move |_| on_change(), false)?;
        self.subscriptions.push(subscription);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Detach every watched observable. Idempotent; safe to call on
    /// teardown even if some holders were already disposed.
    pub fn unsubscribe_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Default for RegionSubscription {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RegionStore {
        value: Observable<i32>,
    }
    impl Store for RegionStore {}

    fn build(ctx: &StoreContext) -> RegionStore {
        RegionStore {
            value: Observable::owned(ctx, "value", 0),
        }
    }

    #[test]
    fn test_slot_mounts_once() {
        let mut slot = StoreSlot::new();
        let builds = Rc::new(RefCell::new(0u32));

        for _ in 0..3 {
            let builds_in_builder = Rc::clone(&builds);
            slot.get_or_mount(move |ctx| {
                *builds_in_builder.borrow_mut() += 1;
                build(ctx)
            })
            .unwrap();
        }

        assert_eq!(*builds.borrow(), 1);
        assert!(slot.is_mounted());
    }

    #[test]
    fn test_slot_disposes_exactly_once() {
        let mut slot = StoreSlot::new();
        let value = slot.get_or_mount(build).unwrap().value.clone();

        slot.dispose().unwrap();
        assert!(!value.is_mounted());
        assert!(!slot.is_mounted());

        let expected = StateError::UsedAfterDisposal("store slot".to_string());
        assert_eq!(slot.dispose().unwrap_err(), expected);
        assert_eq!(slot.get_or_mount(build).map(|_| ()).unwrap_err(), expected);
    }

    #[test]
    fn test_empty_slot_can_be_disposed() {
        let mut slot = StoreSlot::<RegionStore>::new();
        slot.dispose().unwrap();
        assert_eq!(
            slot.get_or_mount(build).map(|_| ()).unwrap_err(),
            StateError::UsedAfterDisposal("store slot".to_string())
        );
    }

    #[test]
    fn test_region_stores_remove_disposes() {
        let mut regions: RegionStores<u32, RegionStore> = RegionStores::new();
        let value = regions.slot(1).get_or_mount(build).unwrap().value.clone();
        regions.slot(2);

        assert_eq!(regions.len(), 2);
        regions.remove(&1).unwrap();
        assert!(!value.is_mounted());
        assert!(!regions.contains(&1));

        // Removing a never-mounted or unknown region is fine.
        regions.remove(&2).unwrap();
        regions.remove(&99).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_region_subscription_fans_in_changes() {
        let a = Observable::new("a", 0i32);
        let b = Observable::new("b", 0i32);
        let renders = Rc::new(RefCell::new(0u32));

        let mut region = RegionSubscription::new();
        for observable in [&a, &b] {
            let renders_in_watch = Rc::clone(&renders);
            region
                .watch(observable, move || *renders_in_watch.borrow_mut() += 1)
                .unwrap();
        }
        assert_eq!(region.len(), 2);

        let bump = Action::new("bump", |n: &i32| n + 1);
        a.apply(&bump).unwrap();
        b.apply(&bump).unwrap();
        assert_eq!(*renders.borrow(), 2);

        region.unsubscribe_all();
        region.unsubscribe_all();
        a.apply(&bump).unwrap();
        assert_eq!(*renders.borrow(), 2);
        assert!(region.is_empty());
    }
}
