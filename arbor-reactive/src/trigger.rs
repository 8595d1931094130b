//! Trigger
//!
//! A reactivity primitive that allows re-running
//! any subscribers.

// Imports
use {
	crate::{Loc, WeakScope, World},
	core::{
		cell::RefCell,
		fmt,
		hash::{Hash, Hasher},
	},
	std::rc::{Rc, Weak},
};

/// Trigger inner
struct Inner {
	/// World
	world: World,

	/// Subscribers, in subscription order
	subs: RefCell<Vec<WeakScope>>,

	/// Where this trigger was defined
	defined_loc: Loc,
}

/// Trigger
pub struct Trigger {
	/// Inner
	inner: Rc<Inner>,
}

impl Trigger {
	/// Creates a new trigger
	#[must_use]
	#[track_caller]
	pub fn new(world: &World) -> Self {
		let inner = Inner {
			world:       world.clone(),
			subs:        RefCell::new(vec![]),
			defined_loc: Loc::caller(),
		};
		Self { inner: Rc::new(inner) }
	}

	/// Returns the world of this trigger
	#[must_use]
	pub fn world(&self) -> &World {
		&self.inner.world
	}

	/// Downgrades this trigger
	#[must_use]
	pub fn downgrade(&self) -> WeakTrigger {
		WeakTrigger {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Returns where this trigger was defined
	#[must_use]
	pub fn defined_loc(&self) -> Loc {
		self.inner.defined_loc
	}

	/// Returns a unique identifier to this trigger.
	///
	/// Downgrading and cloning the trigger will retain the same id
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns the number of subscribers
	#[must_use]
	pub fn sub_count(&self) -> usize {
		self.inner.subs.borrow().len()
	}

	/// Subscribes the currently running scope, if any.
	///
	/// Scopes that aren't tracking are skipped, and a scope is
	/// only ever subscribed once.
	pub fn gather_subs(&self) {
		let Some(scope) = self.inner.world.current() else {
			return;
		};
		if !scope.is_tracking() {
			return;
		}

		if scope.add_dep(self) {
			self.inner.subs.borrow_mut().push(scope.downgrade());
		}
	}

	/// Executes this trigger.
	///
	/// If the world is batching, all subscribers are added to the run queue.
	/// Otherwise, they're all re-run immediately, in subscription order.
	#[track_caller]
	pub fn exec(&self) {
		// Note: Subscribers re-subscribe (or not) when they run, so we iterate
		//       over a snapshot to avoid seeing those changes.
		let subs = self.inner.subs.borrow().clone();
		if subs.is_empty() {
			return;
		}

		if self.inner.world.is_batching() {
			for sub in subs {
				self.inner.world.enqueue(sub);
			}
			return;
		}

		tracing::trace!(
			trigger=?self,
			exec_loc=%Loc::caller(),
			subs=subs.len(),
			"Running subscribers"
		);
		for sub in subs {
			if let Some(scope) = sub.upgrade() {
				scope.trigger();
			}
		}
	}

	/// Removes a subscriber
	pub(crate) fn remove_sub(&self, sub: &WeakScope) {
		self.inner.subs.borrow_mut().retain(|cur_sub| cur_sub != sub);
	}
}

impl PartialEq for Trigger {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Trigger {}

impl Clone for Trigger {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl Hash for Trigger {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for Trigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Trigger")
			.field("id", &self.id())
			.field("defined_loc", &self.inner.defined_loc)
			.finish()
	}
}

/// Weak trigger
pub struct WeakTrigger {
	/// Inner
	inner: Weak<Inner>,
}

impl WeakTrigger {
	/// Creates an empty weak trigger
	#[must_use]
	pub const fn new() -> Self {
		Self { inner: Weak::new() }
	}

	/// Returns a unique identifier to this trigger.
	///
	/// Upgrading and cloning the trigger will retain the same id
	#[must_use]
	pub fn id(&self) -> usize {
		Weak::as_ptr(&self.inner).addr()
	}

	/// Upgrades this weak trigger
	#[must_use]
	pub fn upgrade(&self) -> Option<Trigger> {
		let inner = self.inner.upgrade()?;
		Some(Trigger { inner })
	}
}

impl Default for WeakTrigger {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for WeakTrigger {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for WeakTrigger {}

impl Clone for WeakTrigger {
	fn clone(&self) -> Self {
		Self {
			inner: Weak::clone(&self.inner),
		}
	}
}

impl Hash for WeakTrigger {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for WeakTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(trigger) => fmt::Debug::fmt(&trigger, f),
			None => f.debug_struct("WeakTrigger").finish_non_exhaustive(),
		}
	}
}
