//! Rill Core
//!
//! The state-propagation engine behind a reactive UI: observable value
//! holders, named actions that mutate them, and a store lifecycle that
//! groups related observables per UI region.
//!
//! - **Holders**: [`StateHolder<T>`] keeps one value plus an ordered
//!   listener registry, with mutation (`set_state`) and broadcast
//!   (`notify_listeners`) as separate steps.
//! - **Observables & actions**: [`Observable<T>`] names a holder and
//!   exposes [`Observable::apply`]: run one [`Action`] transform and
//!   notify, as one step. [`LazyAction`] pre-binds an action to an
//!   observable as a reusable command.
//! - **Stores**: state fields register themselves during construction
//!   and [`mount_store`] attaches them to the new store before its
//!   `awake`/`init`/`ready` hooks run; disposing the store disposes
//!   every attached state.
//! - **Host binding**: [`StoreSlot`], [`RegionStores`], and
//!   [`RegionSubscription`] are the contracts a host UI satisfies to
//!   tie stores and re-renders to its mount/unmount lifecycle.
//!
//! The core is single-threaded and synchronous: no locks, no
//! scheduling, no batching. A listener panic is isolated per listener
//! and routed to the process fault sink (see [`set_fault_sink`]);
//! using anything after its disposal reports
//! [`StateError::UsedAfterDisposal`].
//!
//! # Example
//!
//! ```rust
//! use rill_core::{mount_store, Action, LazyAction, Observable, Store};
//!
//! struct CounterStore {
//!     counter: Observable<i32>,
//!     loading: Observable<bool>,
//! }
//!
//! impl Store for CounterStore {}
//!
//! let mut handle = mount_store(|ctx| CounterStore {
//!     counter: Observable::owned(ctx, "counter", 0),
//!     loading: Observable::owned(ctx, "loading", false),
//! });
//!
//! // A named transform, reusable across applies.
//! let increment = Action::new("increment", |n: &i32| n + 1);
//! handle.counter.apply(&increment).unwrap();
//! assert_eq!(handle.counter.read().unwrap(), 1);
//!
//! // A pre-bound command; the eager variant fires once immediately.
//! let start = LazyAction::eager("start", &handle.loading, |_| true).unwrap();
//! assert!(handle.loading.read().unwrap());
//! start.invoke().unwrap();
//!
//! // Disposing the store disposes every attached observable.
//! handle.dispose().unwrap();
//! assert!(handle.counter.read().is_err());
//! ```

pub mod action;
pub mod error;
pub mod fault;
pub mod holder;
pub mod listener;
pub mod observable;
pub mod region;
pub mod store;

pub use action::{Action, LazyAction};
pub use error::{Result, StateError};
pub use fault::{set_fault_sink, ListenerFault};
pub use holder::{StateHolder, Subscription};
pub use listener::{ListenerId, ListenerRegistry};
pub use observable::Observable;
pub use region::{RegionStores, RegionSubscription, StoreSlot};
pub use store::{mount_store, AnyState, Store, StoreContext, StoreHandle};
