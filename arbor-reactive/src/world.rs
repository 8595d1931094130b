//! World
//!
//! The world is the state shared by every reactive item created from it:
//! the stack of running scopes and the batch run queue.
//!
//! There's no global world. Every signal and scope keeps a handle to the
//! world it was created in, which keeps separate worlds (e.g. one per tree,
//! or one per test) fully isolated from each other.

// Modules
pub mod run_queue;
pub mod scope_stack;

// Exports
pub use self::{run_queue::RunQueue, scope_stack::ScopeStack};

// Imports
use {
	crate::{Memo, Scope, Signal, WeakScope},
	core::{cell::Cell, fmt},
	std::rc::Rc,
};

/// Inner
struct Inner {
	/// Scope stack
	scope_stack: ScopeStack,

	/// Run queue
	run_queue: RunQueue,

	/// Whether we're currently batching
	batching: Cell<bool>,
}

/// Reactive world
#[derive(Clone)]
pub struct World {
	/// Inner
	inner: Rc<Inner>,
}

impl World {
	/// Creates a new, empty, world
	#[must_use]
	pub fn new() -> Self {
		let inner = Inner {
			scope_stack: ScopeStack::new(),
			run_queue:   RunQueue::new(),
			batching:    Cell::new(false),
		};
		Self { inner: Rc::new(inner) }
	}

	/// Returns a unique identifier to this world.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns the scope stack
	#[must_use]
	pub fn scope_stack(&self) -> &ScopeStack {
		&self.inner.scope_stack
	}

	/// Returns the run queue
	#[must_use]
	pub fn run_queue(&self) -> &RunQueue {
		&self.inner.run_queue
	}

	/// Returns the currently running scope
	#[must_use]
	pub fn current(&self) -> Option<Scope> {
		self.inner.scope_stack.top()
	}

	/// Returns whether a batch is currently active
	#[must_use]
	pub fn is_batching(&self) -> bool {
		self.inner.batching.get()
	}

	/// Runs `f` within a batch.
	///
	/// While a batch is active, any scopes that need re-running are added
	/// to the run queue instead of being run immediately. Once the outermost
	/// batch finishes, the queue is flushed, running each scope once.
	///
	/// Nested batches are flattened into the outermost one.
	pub fn batch<F, O>(&self, f: F) -> O
	where
		F: FnOnce() -> O,
	{
		if self.inner.batching.get() {
			return f();
		}

		self.inner.batching.set(true);
		let _restore = scopeguard::guard((), |()| self.inner.batching.set(false));

		let output = f();
		self.flush();

		output
	}

	/// Wraps `f` so that every invocation runs within a batch.
	///
	/// Any signal writes performed by `f` will only re-run their
	/// subscribers once `f` returns.
	pub fn batched<F>(&self, f: F) -> impl Fn() + use<F>
	where
		F: Fn() + 'static,
	{
		let world = self.clone();
		move || world.batch(&f)
	}

	/// Runs `f` without tracking any signals read within it.
	///
	/// Applies to the currently running scope, if any.
	pub fn untrack<F, O>(&self, f: F) -> O
	where
		F: FnOnce() -> O,
	{
		match self.current() {
			Some(scope) => scope.untrack(f),
			None => f(),
		}
	}

	/// Adds a cleanup to the currently running scope.
	///
	/// If no scope is running, the cleanup is dropped without running,
	/// since nothing would ever run it.
	#[track_caller]
	pub fn on_cleanup<F>(&self, f: F)
	where
		F: FnOnce() + 'static,
	{
		match self.current() {
			Some(scope) => scope.on_cleanup(f),
			None => tracing::warn!(
				location=%crate::Loc::caller(),
				"Cleanup registered outside of a scope will never run"
			),
		}
	}

	/// Creates a new signal in this world
	#[must_use]
	pub fn signal<T>(&self, value: T) -> Signal<T>
	where
		T: PartialEq + 'static,
	{
		Signal::new(self, value)
	}

	/// Creates and runs an effect.
	///
	/// The effect is bound to the currently running scope, if any,
	/// and is disposed when that scope is cleaned.
	#[track_caller]
	pub fn effect<F>(&self, f: F) -> Scope
	where
		F: Fn() + 'static,
	{
		let scope = Scope::new(self, f);
		scope.trigger();
		scope
	}

	/// Creates a new memo in this world
	#[track_caller]
	pub fn memo<T, F>(&self, f: F) -> Memo<T>
	where
		T: PartialEq + 'static,
		F: Fn() -> T + 'static,
	{
		Memo::new(self, f)
	}

	/// Queues `scope` to run when the current batch is flushed
	pub(crate) fn enqueue(&self, scope: WeakScope) {
		self.inner.run_queue.push(scope);
	}

	/// Runs every queued scope until the run queue is empty.
	fn flush(&self) {
		let mut ran = 0_usize;
		while let Some(scope) = self.inner.run_queue.pop() {
			let Some(scope) = scope.upgrade() else {
				continue;
			};

			scope.trigger();
			ran += 1;
		}

		if ran != 0 {
			tracing::debug!(ran, "Flushed batch");
		}
	}
}

impl Default for World {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for World {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for World {}

impl fmt::Debug for World {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("World")
			.field("id", &self.id())
			.field("depth", &self.inner.scope_stack.depth())
			.field("queued", &self.inner.run_queue.len())
			.field("batching", &self.inner.batching.get())
			.finish()
	}
}
