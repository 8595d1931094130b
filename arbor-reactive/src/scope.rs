//! Scope
//!
//! A scope is the tracking and cleanup unit of a computation.
//!
//! While a scope's computation runs, the scope sits on top of the world's
//! scope stack, so that:
//! - Any signals read subscribe the scope, re-running it when they change.
//! - Any scopes created become children of it.
//! - Any cleanups registered through [`World::on_cleanup`] are added to it.
//!
//! Re-running a scope always cleans it first, so each run starts from a
//! clean slate: the previous run's children are disposed, it's cleanups are
//! run and it's subscriptions are dropped.

// Imports
use {
	crate::{Loc, Trigger, WeakTrigger, World, world::scope_stack::ScopeStackGuard},
	core::{
		cell::{Cell, RefCell},
		fmt,
		hash::{Hash, Hasher},
		mem,
	},
	std::rc::{Rc, Weak},
};

/// Scope inner
struct Inner {
	/// World
	world: World,

	/// Computation
	run: RefCell<Option<Rc<dyn Fn()>>>,

	/// Child scopes
	children: RefCell<Vec<Scope>>,

	/// Cleanups
	cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,

	/// Triggers we're subscribed to
	deps: RefCell<Vec<WeakTrigger>>,

	/// Whether signal reads are currently not tracked
	no_track: Cell<bool>,

	/// Whether this scope was disposed
	disposed: Cell<bool>,

	/// Debug name
	name: RefCell<Option<String>>,

	/// Where this scope was defined
	defined_loc: Loc,
}

/// Scope
pub struct Scope {
	/// Inner
	inner: Rc<Inner>,
}

impl Scope {
	/// Creates a new scope, without running it.
	///
	/// If a scope is currently running in `world`, the new scope
	/// becomes a child of it.
	#[track_caller]
	pub fn new<F>(world: &World, run: F) -> Self
	where
		F: Fn() + 'static,
	{
		let scope = Self::new_root(world, run);
		if let Some(parent) = world.current() {
			parent.add_child(scope.clone());
		}

		scope
	}

	/// Creates a new scope with no parent, without running it.
	#[track_caller]
	pub fn new_root<F>(world: &World, run: F) -> Self
	where
		F: Fn() + 'static,
	{
		let run: Rc<dyn Fn()> = Rc::new(run);
		let inner = Inner {
			world:       world.clone(),
			run:         RefCell::new(Some(run)),
			children:    RefCell::new(vec![]),
			cleanups:    RefCell::new(vec![]),
			deps:        RefCell::new(vec![]),
			no_track:    Cell::new(false),
			disposed:    Cell::new(false),
			name:        RefCell::new(None),
			defined_loc: Loc::caller(),
		};
		Self { inner: Rc::new(inner) }
	}

	/// Creates a new scope as a child of `parent`, without running it.
	///
	/// Unlike [`Scope::new`], this ignores the currently running scope.
	#[track_caller]
	pub fn child_of<F>(parent: &Self, run: F) -> Self
	where
		F: Fn() + 'static,
	{
		let scope = Self::new_root(&parent.inner.world, run);
		parent.add_child(scope.clone());

		scope
	}

	/// Returns the world of this scope
	#[must_use]
	pub fn world(&self) -> &World {
		&self.inner.world
	}

	/// Downgrades this scope
	#[must_use]
	pub fn downgrade(&self) -> WeakScope {
		WeakScope {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Returns a unique identifier to this scope.
	///
	/// Downgrading and cloning the scope will retain the same id
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns where this scope was defined
	#[must_use]
	pub fn defined_loc(&self) -> Loc {
		self.inner.defined_loc
	}

	/// Returns the debug name of this scope
	#[must_use]
	pub fn name(&self) -> Option<String> {
		self.inner.name.borrow().clone()
	}

	/// Sets the debug name of this scope.
	///
	/// The name is cleared whenever the scope is cleaned.
	pub fn set_name(&self, name: impl Into<String>) {
		*self.inner.name.borrow_mut() = Some(name.into());
	}

	/// Returns if this scope was disposed
	#[must_use]
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}

	/// Returns if signal reads within this scope are currently tracked
	#[must_use]
	pub fn is_tracking(&self) -> bool {
		!self.inner.no_track.get()
	}

	/// Returns the number of triggers this scope is subscribed to
	#[must_use]
	pub fn dep_count(&self) -> usize {
		self.inner.deps.borrow().len()
	}

	/// Returns the number of child scopes
	#[must_use]
	pub fn child_count(&self) -> usize {
		self.inner.children.borrow().len()
	}

	/// Re-runs this scope.
	///
	/// Cleans the scope, then runs the computation with this scope
	/// as the current one. Disposed scopes are never run.
	pub fn trigger(&self) {
		if self.inner.disposed.get() {
			tracing::trace!(scope=?self, "Skipping disposed scope");
			return;
		}

		self.clean();

		// Note: We clone the computation out so it may dispose
		//       of this scope while running.
		let Some(run) = self.inner.run.borrow().clone() else {
			return;
		};

		tracing::trace!(scope=?self, "Running scope");
		self.run_in(|| run());
	}

	/// Runs `f` with this scope as the current one, without cleaning it.
	pub fn run_in<F, O>(&self, f: F) -> O
	where
		F: FnOnce() -> O,
	{
		let _guard = ScopeStackGuard::new(self.inner.world.scope_stack(), self.clone());
		f()
	}

	/// Runs `f` without tracking any signals read within it.
	///
	/// The previous tracking state is restored afterwards, even if `f` panics.
	pub fn untrack<F, O>(&self, f: F) -> O
	where
		F: FnOnce() -> O,
	{
		let prev_no_track = self.inner.no_track.replace(true);
		let _restore = scopeguard::guard((), |()| self.inner.no_track.set(prev_no_track));

		f()
	}

	/// Adds a cleanup to this scope.
	///
	/// Cleanups run, in the order they were added, the next
	/// time this scope is cleaned.
	pub fn on_cleanup<F>(&self, f: F)
	where
		F: FnOnce() + 'static,
	{
		self.inner.cleanups.borrow_mut().push(Box::new(f));
	}

	/// Cleans this scope.
	///
	/// First disposes of all children, then runs all cleanups, then
	/// unsubscribes from all triggers, and finally clears the name.
	///
	/// Cleaning an already clean scope does nothing.
	pub fn clean(&self) {
		let children = mem::take(&mut *self.inner.children.borrow_mut());
		for child in children {
			child.dispose();
		}

		let cleanups = mem::take(&mut *self.inner.cleanups.borrow_mut());
		for cleanup in cleanups {
			cleanup();
		}

		let deps = mem::take(&mut *self.inner.deps.borrow_mut());
		let this = self.downgrade();
		for dep in deps {
			if let Some(trigger) = dep.upgrade() {
				trigger.remove_sub(&this);
			}
		}

		self.inner.name.borrow_mut().take();
	}

	/// Disposes of this scope.
	///
	/// Cleans it and ensures it'll never run again.
	pub fn dispose(&self) {
		self.inner.disposed.set(true);
		self.clean();
		self.inner.run.borrow_mut().take();
	}

	/// Adds a child to this scope
	fn add_child(&self, child: Self) {
		// Note: If we're already disposed, nothing would ever clean the child,
		//       so we dispose it immediately instead.
		if self.inner.disposed.get() {
			child.dispose();
			return;
		}

		// Note: Children disposed on their own are only dropped here, since
		//       they don't know their parent.
		let mut children = self.inner.children.borrow_mut();
		children.retain(|child| !child.is_disposed());
		children.push(child);
	}

	/// Adds a trigger as a dependency of this scope.
	///
	/// Returns if it wasn't already a dependency
	pub(crate) fn add_dep(&self, trigger: &Trigger) -> bool {
		let trigger = trigger.downgrade();
		let mut deps = self.inner.deps.borrow_mut();
		if deps.contains(&trigger) {
			return false;
		}

		deps.push(trigger);
		true
	}
}

impl PartialEq for Scope {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Scope {}

impl Clone for Scope {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl Hash for Scope {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("Scope");
		s.field("id", &self.id());
		if let Ok(name) = self.inner.name.try_borrow() {
			if let Some(name) = &*name {
				s.field("name", name);
			}
		}
		s.field("defined_loc", &self.inner.defined_loc)
			.field("disposed", &self.inner.disposed.get())
			.finish()
	}
}

/// Weak scope
///
/// Used to break ownership between a trigger and it's subscribers
pub struct WeakScope {
	/// Inner
	inner: Weak<Inner>,
}

impl WeakScope {
	/// Creates an empty weak scope
	#[must_use]
	pub const fn new() -> Self {
		Self { inner: Weak::new() }
	}

	/// Upgrades this scope
	#[must_use]
	pub fn upgrade(&self) -> Option<Scope> {
		self.inner.upgrade().map(|inner| Scope { inner })
	}

	/// Returns a unique identifier to this scope.
	///
	/// Upgrading and cloning the scope will retain the same id
	#[must_use]
	pub fn id(&self) -> usize {
		Weak::as_ptr(&self.inner).addr()
	}
}

impl Default for WeakScope {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for WeakScope {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for WeakScope {}

impl Clone for WeakScope {
	fn clone(&self) -> Self {
		Self {
			inner: Weak::clone(&self.inner),
		}
	}
}

impl Hash for WeakScope {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for WeakScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(scope) => fmt::Debug::fmt(&scope, f),
			None => f.debug_struct("WeakScope").finish_non_exhaustive(),
		}
	}
}
