//! Named observables
//!
//! [`Observable<T>`] is a [`StateHolder<T>`] with a diagnostic name
//! and `apply` as the sanctioned mutation entry point: one action
//! transform plus one notification, as a single caller-visible step.

use std::fmt;
use std::rc::Rc;

use crate::action::Action;
use crate::error::Result;
use crate::holder::{StateHolder, Subscription};
use crate::store::StoreContext;

/// A named observable value. Cheap-clone handle; clones share state.
pub struct Observable<T> {
    name: Rc<str>,
    holder: StateHolder<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            holder: self.holder.clone(),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Create a free-standing observable. The name identifies it in
    /// error messages and fault reports only.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        let name: Rc<str> = Rc::from(name.into());
        Self {
            holder: StateHolder::with_label(format!("observable '{name}'"), initial),
            name,
        }
    }

    /// Create an observable whose change policy is `PartialEq`
    /// inequality instead of the always-changed default.
    pub fn with_eq(name: impl Into<String>, initial: T) -> Self
    where
        T: PartialEq,
    {
        let name: Rc<str> = Rc::from(name.into());
        Self {
            holder: StateHolder::with_eq(format!("observable '{name}'"), initial),
            name,
        }
    }

    /// Create an observable owned by the store currently under
    /// construction (see `mount_store`).
    pub fn owned(ctx: &StoreContext, name: impl Into<String>, initial: T) -> Self {
        let observable = Self::new(name, initial);
        ctx.register(Box::new(observable.holder.clone()));
        observable
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_mounted(&self) -> bool {
        self.holder.is_mounted()
    }

    /// Current value. No side effects.
    pub fn read(&self) -> Result<T>
    where
        T: Clone,
    {
        self.holder.read()
    }

    /// Register a change listener; see `StateHolder::add_listener`.
    pub fn add_listener(
        &self,
        callback: impl Fn(&T) + 'static,
        deliver_current: bool,
    ) -> Result<Subscription>
    where
        T: Clone,
    {
        self.holder.add_listener(callback, deliver_current)
    }

    /// Run the action's transform against the current value, store the
    /// result, and notify every listener, as one logical step.
    pub fn apply(&self, action: &Action<T>) -> Result<()>
    where
        T: Clone,
    {
        tracing::trace!(observable = %self.name, action = action.name(), "apply");
        self.holder.set_state(|current| action.transform(current))?;
        self.holder.notify_listeners()
    }

    /// Dispose the underlying holder; see `StateHolder::dispose`.
    pub fn dispose(&self) -> Result<()> {
        self.holder.dispose()
    }

    /// The underlying holder, for code that needs the low-level
    /// `set_state`/`notify_listeners` split (advanced use).
    pub fn holder(&self) -> &StateHolder<T> {
        &self.holder
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.name)
            .finish()
    }
}
