//! Reactivity for `arbor`
//!
//! The engine is built out of a few small pieces:
//! - [`Trigger`]s, which keep a list of subscribed [`Scope`]s and re-run them when executed.
//! - [`Signal`]s, a value paired with a trigger.
//! - [`Scope`]s, a computation that tracks every trigger it reads, and owns the child scopes
//!   and cleanups created while it runs.
//! - The [`World`], which holds the stack of running scopes and the batch run queue.
//!
//! Alongside automatic tracking, [`Dependency`] offers explicit "will change" / "did change"
//! notifications, used by lifecycle effects that want to control exactly when they re-run.

// Modules
pub mod dependency;
mod loc;
pub mod memo;
pub mod scope;
pub mod signal;
pub mod trigger;
pub mod world;

// Exports
pub use self::{
	dependency::{Dependency, Deps, Subscription},
	loc::Loc,
	memo::Memo,
	scope::{Scope, WeakScope},
	signal::{Signal, SignalGet, SignalGetCloned, SignalReplace, SignalSet, SignalUpdate, SignalWith},
	trigger::{Trigger, WeakTrigger},
	world::World,
};
