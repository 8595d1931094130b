//! Effect dependencies
//!
//! A dependency is an explicit change source with two events:
//! "will change", fired right before the change, and "did change",
//! fired right after it.
//!
//! Unlike signals, dependencies aren't tracked automatically. Listeners
//! subscribe to them by hand, and the returned [`Subscription`] unsubscribes
//! when dropped.

// Imports
use {
	core::{
		cell::{Cell, RefCell},
		fmt,
	},
	std::rc::{Rc, Weak},
};

/// Listener
type Listener = Rc<dyn Fn()>;

/// Listener list
#[derive(Default)]
struct Listeners {
	/// Next key
	next: Cell<usize>,

	/// Listeners, in subscription order
	list: RefCell<Vec<(usize, Listener)>>,
}

impl Listeners {
	/// Adds a listener, returning it's key
	fn add(&self, listener: Listener) -> usize {
		let key = self.next.get();
		self.next.set(key + 1);
		self.list.borrow_mut().push((key, listener));
		key
	}

	/// Removes a listener by key
	fn remove(&self, key: usize) {
		self.list.borrow_mut().retain(|&(cur_key, _)| cur_key != key);
	}

	/// Fires all listeners.
	///
	/// Listeners added or removed while firing only take effect on the next fire.
	fn fire(&self) {
		let listeners = self
			.list
			.borrow()
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect::<Vec<_>>();
		for listener in listeners {
			listener();
		}
	}

	/// Returns the number of listeners
	fn len(&self) -> usize {
		self.list.borrow().len()
	}
}

/// Event kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Event {
	WillChange,
	DidChange,
}

/// Inner
#[derive(Default)]
struct Inner {
	/// "Will change" listeners
	will_change: Listeners,

	/// "Did change" listeners
	did_change: Listeners,

	/// Subscriptions to upstream dependencies, for aggregates
	upstream: RefCell<Vec<Subscription>>,
}

impl Inner {
	/// Returns the listeners of an event
	const fn listeners(&self, event: Event) -> &Listeners {
		match event {
			Event::WillChange => &self.will_change,
			Event::DidChange => &self.did_change,
		}
	}
}

/// Effect dependency
#[derive(Clone, Default)]
pub struct Dependency {
	/// Inner
	inner: Rc<Inner>,
}

impl Dependency {
	/// Creates a new dependency
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a unique identifier to this dependency.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Subscribes `f` to the "will change" event
	pub fn on_will_change<F>(&self, f: F) -> Subscription
	where
		F: Fn() + 'static,
	{
		self.subscribe(Event::WillChange, Rc::new(f))
	}

	/// Subscribes `f` to the "did change" event
	pub fn on_did_change<F>(&self, f: F) -> Subscription
	where
		F: Fn() + 'static,
	{
		self.subscribe(Event::DidChange, Rc::new(f))
	}

	/// Fires the "will change" event
	pub fn will_change(&self) {
		self.inner.will_change.fire();
	}

	/// Fires the "did change" event
	pub fn did_change(&self) {
		self.inner.did_change.fire();
	}

	/// Performs a change with `f`, firing "will change" before and "did change" after.
	pub fn change<F, O>(&self, f: F) -> O
	where
		F: FnOnce() -> O,
	{
		self.will_change();
		let output = f();
		self.did_change();

		output
	}

	/// Returns the number of listeners, across both events
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.inner.will_change.len() + self.inner.did_change.len()
	}

	/// Subscribes a listener to an event
	fn subscribe(&self, event: Event, listener: Listener) -> Subscription {
		let key = self.inner.listeners(event).add(listener);
		Subscription {
			inner: Rc::downgrade(&self.inner),
			event,
			key,
		}
	}
}

impl PartialEq for Dependency {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Dependency {}

impl fmt::Debug for Dependency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dependency")
			.field("id", &self.id())
			.field("will_change", &self.inner.will_change.len())
			.field("did_change", &self.inner.did_change.len())
			.finish()
	}
}

/// Subscription to a dependency event.
///
/// Unsubscribes when dropped.
#[must_use = "Dropping a subscription unsubscribes it"]
pub struct Subscription {
	/// Dependency
	inner: Weak<Inner>,

	/// Event
	event: Event,

	/// Listener key
	key: usize,
}

impl Subscription {
	/// Returns if the dependency is still alive
	#[must_use]
	pub fn is_alive(&self) -> bool {
		self.inner.strong_count() != 0
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(inner) = self.inner.upgrade() {
			inner.listeners(self.event).remove(self.key);
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("event", &self.event)
			.field("key", &self.key)
			.field("alive", &self.is_alive())
			.finish()
	}
}

/// Dependency set
#[derive(Clone, Default, Debug, derive_more::From, derive_more::IntoIterator)]
pub struct Deps(#[into_iterator(owned, ref)] Vec<Dependency>);

impl Deps {
	/// Creates an empty dependency set
	#[must_use]
	pub const fn none() -> Self {
		Self(vec![])
	}

	/// Adds a dependency to this set
	pub fn push(&mut self, dep: Dependency) {
		self.0.push(dep);
	}

	/// Returns the number of dependencies
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns if this set is empty
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Composes this set into a single dependency.
	///
	/// The aggregate fires each event whenever any member fires it.
	/// It stays subscribed to the members for as long as it's alive.
	#[must_use]
	pub fn aggregate(&self) -> Dependency {
		let aggregate = Dependency::new();
		let upstream = self
			.0
			.iter()
			.flat_map(|dep| {
				let forward = |event: Event| {
					let aggregate = Rc::downgrade(&aggregate.inner);
					dep.subscribe(
						event,
						Rc::new(move || {
							if let Some(aggregate) = aggregate.upgrade() {
								aggregate.listeners(event).fire();
							}
						}),
					)
				};
				[forward(Event::WillChange), forward(Event::DidChange)]
			})
			.collect();
		*aggregate.inner.upstream.borrow_mut() = upstream;

		aggregate
	}
}

impl From<()> for Deps {
	fn from((): ()) -> Self {
		Self::none()
	}
}

impl From<Dependency> for Deps {
	fn from(dep: Dependency) -> Self {
		Self(vec![dep])
	}
}

impl From<&Dependency> for Deps {
	fn from(dep: &Dependency) -> Self {
		Self(vec![dep.clone()])
	}
}

impl<const N: usize> From<[Dependency; N]> for Deps {
	fn from(deps: [Dependency; N]) -> Self {
		Self(deps.into())
	}
}

impl FromIterator<Dependency> for Deps {
	fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}
