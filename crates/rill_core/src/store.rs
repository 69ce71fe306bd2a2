//! Store lifecycle and state registration
//!
//! A store aggregates the holders that make up one UI region's state
//! and owns their disposal. Construction follows a two-phase
//! registration protocol: state fields built with the `owned`
//! constructors register themselves into a [`StoreContext`] while the
//! store value itself is still being built, and [`mount_store`] claims
//! the full pending list, in declaration order, before any lifecycle
//! hook runs.
//!
//! Each [`mount_store`] call gets its own context, so nested store
//! construction cannot cross-attach states: the pending list only ever
//! holds states destined for the store being built from it.
//!
//! ```
//! use rill_core::{mount_store, Action, Observable, Store};
//!
//! struct CounterStore {
//!     counter: Observable<i32>,
//! }
//!
//! impl Store for CounterStore {}
//!
//! let mut handle = mount_store(|ctx| CounterStore {
//!     counter: Observable::owned(ctx, "counter", 0),
//! });
//!
//! let increment = Action::new("increment", |n: &i32| n + 1);
//! handle.counter.apply(&increment).unwrap();
//! assert_eq!(handle.counter.read().unwrap(), 1);
//!
//! handle.dispose().unwrap();
//! assert!(handle.counter.read().is_err());
//! ```

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

use crate::error::{Result, StateError};

/// Type-erased view of an attached state, enough for the store to
/// track and dispose it.
pub trait AnyState {
    fn dispose_state(&self) -> Result<()>;
    fn is_mounted(&self) -> bool;
    /// Diagnostic label of the underlying holder.
    fn label(&self) -> String;
}

/// Collector for holders constructed as part of a store's state,
/// before the store value exists. Created by [`mount_store`] and
/// passed into the builder closure; drained exactly once when the
/// builder returns.
pub struct StoreContext {
    pending: RefCell<Vec<Box<dyn AnyState>>>,
}

impl StoreContext {
    fn new() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Append a state handle to the pending list. Called by the
    /// `owned` constructors; construction order is attachment order.
    pub fn register(&self, state: Box<dyn AnyState>) {
        self.pending.borrow_mut().push(state);
    }

    fn drain(&self) -> Vec<Box<dyn AnyState>> {
        self.pending.take()
    }
}

/// User-defined store behavior: three startup hooks, invoked exactly
/// once each, in order, during [`mount_store`], after the pending
/// states were claimed and before the handle is returned.
pub trait Store {
    fn awake(&mut self) {}
    fn init(&mut self) {}
    fn ready(&mut self) {}
}

/// Construct a store and run its startup lifecycle.
///
/// The builder receives the registration context; every state field
/// built with an `owned` constructor ends up attached to the returned
/// handle, in declaration order. Hooks run `awake` → `init` → `ready`
/// on the fully-built store.
pub fn mount_store<S: Store>(build: impl FnOnce(&StoreContext) -> S) -> StoreHandle<S> {
    let ctx = StoreContext::new();
    let store = build(&ctx);
    // Claim before any user hook runs.
    let attached = ctx.drain();
    let mut handle = StoreHandle {
        store,
        attached,
        disposed: false,
    };
    handle.store.awake();
    handle.store.init();
    handle.store.ready();
    tracing::debug!(attached = handle.attached.len(), "store mounted");
    handle
}

/// An aggregate owning a user store plus all of its attached states.
///
/// Derefs to the user store. Disposing the handle disposes every
/// attached state in attachment order; a second dispose reports
/// `UsedAfterDisposal`.
pub struct StoreHandle<S: Store> {
    store: S,
    attached: Vec<Box<dyn AnyState>>,
    disposed: bool,
}

impl<S: Store> StoreHandle<S> {
    /// Attached states in declaration order, for diagnostics.
    pub fn attached(&self) -> &[Box<dyn AnyState>] {
        &self.attached
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose every attached state, then mark the store disposed.
    ///
    /// A state that was already unmounted out of band (the handles
    /// are cheap clones, so user code can reach `dispose` directly)
    /// is skipped: it is already in the target state, and stopping at
    /// it would leave the remaining states mounted with no way to
    /// ever tear them down.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Err(StateError::UsedAfterDisposal("store".to_string()));
        }
        for state in &self.attached {
            if state.is_mounted() {
                state.dispose_state()?;
            }
        }
        self.disposed = true;
        tracing::debug!(attached = self.attached.len(), "store disposed");
        Ok(())
    }
}

impl<S: Store> Deref for StoreHandle<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.store
    }
}

impl<S: Store> DerefMut for StoreHandle<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::holder::StateHolder;
    use crate::observable::Observable;
    use std::rc::Rc;

    struct CounterStore {
        counter: Observable<i32>,
        loading: StateHolder<bool>,
        hooks: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Store for CounterStore {
        fn awake(&mut self) {
            // Attached state is usable from the first hook onward.
            assert_eq!(self.counter.read().unwrap(), 0);
            self.hooks.borrow_mut().push("awake");
        }

        fn init(&mut self) {
            self.hooks.borrow_mut().push("init");
        }

        fn ready(&mut self) {
            self.hooks.borrow_mut().push("ready");
        }
    }

    fn mount_counter_store() -> StoreHandle<CounterStore> {
        mount_store(|ctx| CounterStore {
            counter: Observable::owned(ctx, "counter", 0),
            loading: StateHolder::owned(ctx, false),
            hooks: Rc::new(RefCell::new(Vec::new())),
        })
    }

    #[test]
    fn test_states_attach_in_declaration_order() {
        let handle = mount_counter_store();
        let labels: Vec<_> = handle.attached().iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["observable 'counter'", "state holder"]);
        assert!(handle.attached().iter().all(|s| s.is_mounted()));
    }

    #[test]
    fn test_lifecycle_hooks_run_once_in_order() {
        let handle = mount_counter_store();
        assert_eq!(*handle.hooks.borrow(), vec!["awake", "init", "ready"]);
    }

    #[test]
    fn test_counter_scenario() {
        let handle = mount_counter_store();
        let notifications = Rc::new(RefCell::new(0u32));
        let notifications_in_listener = Rc::clone(&notifications);
        handle
            .counter
            .add_listener(move |_| *notifications_in_listener.borrow_mut() += 1, false)
            .unwrap();

        let increment = Action::new("Increment", |n: &i32| n + 1);
        for _ in 0..3 {
            handle.counter.apply(&increment).unwrap();
        }

        assert_eq!(handle.counter.read().unwrap(), 3);
        assert_eq!(*notifications.borrow(), 3);
    }

    #[test]
    fn test_dispose_disposes_all_attached_states() {
        let mut handle = mount_counter_store();
        let counter = handle.counter.clone();
        let loading = handle.loading.clone();

        handle.dispose().unwrap();

        assert!(handle.is_disposed());
        assert!(!counter.is_mounted());
        assert!(!loading.is_mounted());
        assert_eq!(
            counter.read().unwrap_err(),
            StateError::UsedAfterDisposal("observable 'counter'".to_string())
        );
    }

    #[test]
    fn test_dispose_skips_states_already_disposed_out_of_band() {
        let mut handle = mount_counter_store();
        let counter = handle.counter.clone();
        let loading = handle.loading.clone();

        // The counter was torn down directly through a cloned handle.
        counter.dispose().unwrap();

        handle.dispose().unwrap();
        assert!(handle.is_disposed());
        assert!(!loading.is_mounted());
        assert_eq!(
            handle.dispose().unwrap_err(),
            StateError::UsedAfterDisposal("store".to_string())
        );
    }

    #[test]
    fn test_double_dispose_errors() {
        let mut handle = mount_counter_store();
        handle.dispose().unwrap();
        assert_eq!(
            handle.dispose().unwrap_err(),
            StateError::UsedAfterDisposal("store".to_string())
        );
    }

    #[test]
    fn test_empty_pending_is_a_noop() {
        struct EmptyStore;
        impl Store for EmptyStore {}

        let mut handle = mount_store(|_| EmptyStore);
        assert!(handle.attached().is_empty());
        handle.dispose().unwrap();
    }

    #[test]
    fn test_nested_mounts_keep_states_separate() {
        struct Inner {
            value: Observable<i32>,
        }
        impl Store for Inner {}

        struct Outer {
            value: Observable<i32>,
            inner: StoreHandle<Inner>,
        }
        impl Store for Outer {}

        let outer = mount_store(|ctx| Outer {
            value: Observable::owned(ctx, "outer", 1),
            inner: mount_store(|inner_ctx| Inner {
                value: Observable::owned(inner_ctx, "inner", 2),
            }),
        });

        // Each mount drained only its own context.
        let outer_labels: Vec<_> = outer.attached().iter().map(|s| s.label()).collect();
        assert_eq!(outer_labels, vec!["observable 'outer'"]);
        let inner_labels: Vec<_> = outer.inner.attached().iter().map(|s| s.label()).collect();
        assert_eq!(inner_labels, vec!["observable 'inner'"]);
    }
}
