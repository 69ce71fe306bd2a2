//! Named state transformations
//!
//! An [`Action`] is an immutable, reusable description of one state
//! transition: a name for diagnostics plus a pure `old -> new`
//! transform. Actions carry no state of their own and can be applied
//! any number of times, to any observable of the matching value type.
//!
//! A [`LazyAction`] binds an action to one specific observable at
//! construction, producing a reusable zero-argument command. The
//! eager variant fires the bound apply once, synchronously, before the
//! constructor returns.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::observable::Observable;

/// An immutable named pure transform from old state to new state.
pub struct Action<T> {
    name: Rc<str>,
    transform: Rc<dyn Fn(&T) -> T>,
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            transform: Rc::clone(&self.transform),
        }
    }
}

impl<T> Action<T> {
    pub fn new(name: impl Into<String>, transform: impl Fn(&T) -> T + 'static) -> Self {
        Self {
            name: Rc::from(name.into()),
            transform: Rc::new(transform),
        }
    }

    /// Diagnostic name; not a uniqueness key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the transform against a current value.
    pub fn transform(&self, current: &T) -> T {
        (self.transform)(current)
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

/// A pre-bound command: an action tied to one observable.
///
/// The bound handle does not control the observable's lifecycle; the
/// owning store does. Invoking after the observable was disposed
/// reports `UsedAfterDisposal`.
pub struct LazyAction<T> {
    action: Action<T>,
    target: Observable<T>,
}

impl<T> Clone for LazyAction<T> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            target: self.target.clone(),
        }
    }
}

impl<T: Clone + 'static> LazyAction<T> {
    /// Bind lazily: nothing runs until [`LazyAction::invoke`].
    pub fn new(
        name: impl Into<String>,
        target: &Observable<T>,
        transform: impl Fn(&T) -> T + 'static,
    ) -> Self {
        Self {
            action: Action::new(name, transform),
            target: target.clone(),
        }
    }

    /// Bind eagerly: performs one apply on the target before
    /// returning. The instance remains invokable afterwards like any
    /// lazily-built one.
    pub fn eager(
        name: impl Into<String>,
        target: &Observable<T>,
        transform: impl Fn(&T) -> T + 'static,
    ) -> Result<Self> {
        let bound = Self::new(name, target, transform);
        bound.invoke()?;
        Ok(bound)
    }

    /// Apply the bound action to the bound observable: one mutation,
    /// one notification. Reusable.
    pub fn invoke(&self) -> Result<()> {
        self.target.apply(&self.action)
    }

    pub fn name(&self) -> &str {
        self.action.name()
    }

    pub fn target(&self) -> &Observable<T> {
        &self.target
    }
}

impl<T: 'static> fmt::Debug for LazyAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyAction")
            .field("name", &self.action.name)
            .field("target", &self.target.name())
            .finish()
    }
}
