//! Observable value holders
//!
//! [`StateHolder<T>`] is the mutable container for one value plus its
//! subscriber list. It is a cheap-clone handle over shared storage:
//! clones observe and mutate the same state, and a handle kept by a
//! pre-bound action does not own the value's lifecycle: disposal
//! stays with whoever calls [`StateHolder::dispose`], typically the
//! owning store.
//!
//! Mutation and broadcast are split on purpose: [`StateHolder::set_state`]
//! silently swaps the value and [`StateHolder::notify_listeners`]
//! broadcasts it, so a composite operation like `Observable::apply`
//! can batch one mutation with exactly one notification, and low-level
//! code can mutate several related holders before a shared broadcast.
//!
//! The core is single-threaded by contract: handles are `Rc`-based and
//! not `Send`. All operations complete synchronously; a listener may
//! reenter `apply`/`set_state` on any holder and that inner update
//! finishes before the outer notification pass resumes. Registering
//! new listeners from inside a notification callback is not supported.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::error::{Result, StateError};
use crate::fault;
use crate::listener::{Callback, ListenerId, ListenerRegistry};
use crate::store::{AnyState, StoreContext};

type ChangeFn<T> = Box<dyn Fn(&T, &T) -> bool>;

struct HolderInner<T> {
    /// Diagnostic label, used in error messages and fault reports.
    label: String,
    state: RefCell<T>,
    /// Cleared exactly once by `dispose`; never becomes true again.
    mounted: Cell<bool>,
    listeners: RefCell<ListenerRegistry<T>>,
    changed: ChangeFn<T>,
}

/// Generic mutable-value container with a listener registry.
pub struct StateHolder<T> {
    inner: Rc<HolderInner<T>>,
}

impl<T> Clone for StateHolder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> StateHolder<T> {
    /// Create a free-standing holder with an initial value.
    ///
    /// The default change policy treats every update as a change: two
    /// owned values produced by a transform are never the same
    /// reference. Use [`StateHolder::with_eq`] or
    /// [`StateHolder::with_change_detection`] to override per state
    /// type.
    pub fn new(initial: T) -> Self {
        Self::with_label("state holder", initial)
    }

    /// Create a holder with a diagnostic label.
    pub fn with_label(label: impl Into<String>, initial: T) -> Self {
        Self::build(label.into(), initial, Box::new(|_, _| true))
    }

    /// Create a holder whose change policy is `PartialEq` inequality.
    pub fn with_eq(label: impl Into<String>, initial: T) -> Self
    where
        T: PartialEq,
    {
        Self::build(label.into(), initial, Box::new(|old, new| old != new))
    }

    /// Create a holder with a custom change-detection policy.
    ///
    /// The policy only affects the return value of
    /// [`StateHolder::set_state`]; the new value is stored either way
    /// and notification is always an explicit separate step.
    pub fn with_change_detection(
        label: impl Into<String>,
        initial: T,
        changed: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self::build(label.into(), initial, Box::new(changed))
    }

    /// Create a holder owned by the store currently under
    /// construction: the new handle is registered into `ctx` and will
    /// be attached to that store, which then drives its disposal.
    pub fn owned(ctx: &StoreContext, initial: T) -> Self {
        let holder = Self::new(initial);
        ctx.register(Box::new(holder.clone()));
        holder
    }

    fn build(label: String, initial: T, changed: ChangeFn<T>) -> Self {
        Self {
            inner: Rc::new(HolderInner {
                label,
                state: RefCell::new(initial),
                mounted: Cell::new(true),
                listeners: RefCell::new(ListenerRegistry::new()),
                changed,
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.inner.mounted.get() {
            Ok(())
        } else {
            Err(StateError::UsedAfterDisposal(self.inner.label.clone()))
        }
    }

    /// Current value. No side effects.
    pub fn read(&self) -> Result<T>
    where
        T: Clone,
    {
        self.ensure_mounted()?;
        Ok(self.inner.state.borrow().clone())
    }

    /// Register a listener. With `deliver_current` set, the callback
    /// is invoked once synchronously with the pre-existing value
    /// before this returns.
    ///
    /// The returned [`Subscription`] is one-shot and idempotent.
    pub fn add_listener(
        &self,
        callback: impl Fn(&T) + 'static,
        deliver_current: bool,
    ) -> Result<Subscription>
    where
        T: Clone,
    {
        self.ensure_mounted()?;
        let callback: Callback<T> = Rc::new(callback);
        let id = self.inner.listeners.borrow_mut().add(Rc::clone(&callback));
        if deliver_current {
            let value = self.inner.state.borrow().clone();
            callback(&value);
        }
        Ok(Subscription::new(Rc::downgrade(&self.inner), id))
    }

    /// Compute and store the next value without notifying anyone.
    ///
    /// Returns whether the change policy considered the value changed.
    /// This is the low-level half of a mutation; ordinary callers go
    /// through `Observable::apply`, which pairs it with exactly one
    /// [`StateHolder::notify_listeners`].
    pub fn set_state(&self, update: impl FnOnce(&T) -> T) -> Result<bool> {
        self.ensure_mounted()?;
        let (next, changed) = {
            let current = self.inner.state.borrow();
            let next = update(&current);
            let changed = (self.inner.changed)(&current, &next);
            (next, changed)
        };
        *self.inner.state.borrow_mut() = next;
        Ok(changed)
    }

    /// Broadcast the current value to every registered listener, in
    /// registration order.
    ///
    /// The value is snapshotted once at entry; a reentrant mutation
    /// from inside a callback runs its own full pass with the newer
    /// value while the remaining listeners of this pass still receive
    /// the snapshot. A listener panic is routed to the process fault
    /// sink and does not abort delivery to the listeners after it.
    /// Unsubscribing a listener that has not been visited yet excludes
    /// it from the rest of the pass.
    pub fn notify_listeners(&self) -> Result<()>
    where
        T: Clone,
    {
        self.ensure_mounted()?;
        let value = self.inner.state.borrow().clone();
        let snapshot = self.inner.listeners.borrow().snapshot();
        for (id, callback) in snapshot {
            if !self.inner.listeners.borrow().contains(id) {
                continue;
            }
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(&value))) {
                fault::report(&self.inner.label, payload);
            }
        }
        Ok(())
    }

    /// Clear all listeners and permanently mark the holder unmounted.
    ///
    /// Any further read, mutation, registration, or notification
    /// (including a second `dispose`) reports
    /// [`StateError::UsedAfterDisposal`].
    pub fn dispose(&self) -> Result<()> {
        self.ensure_mounted()?;
        self.inner.listeners.borrow_mut().clear();
        self.inner.mounted.set(false);
        Ok(())
    }
}

impl<T: 'static> AnyState for StateHolder<T> {
    fn dispose_state(&self) -> Result<()> {
        self.dispose()
    }

    fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    fn label(&self) -> String {
        self.inner.label.clone()
    }
}

/// One-shot unsubscribe handle returned by
/// [`StateHolder::add_listener`].
///
/// Calling [`Subscription::unsubscribe`] more than once is a no-op,
/// and it never errors, not even after the holder was disposed or
/// dropped.
pub struct Subscription {
    cancel: Box<dyn Fn()>,
    spent: Cell<bool>,
}

impl Subscription {
    fn new<T: 'static>(inner: Weak<HolderInner<T>>, id: ListenerId) -> Self {
        Self {
            cancel: Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.listeners.borrow_mut().remove(id);
                }
            }),
            spent: Cell::new(false),
        }
    }

    /// Detach the listener. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.spent.replace(true) {
            (self.cancel)();
        }
    }
}
