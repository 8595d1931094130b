//! Signal
//!
//! A read-write value that automatically updates
//! any subscribers when changed.

// Modules
pub mod ops;

// Exports
pub use self::ops::{SignalGet, SignalGetCloned, SignalReplace, SignalSet, SignalUpdate, SignalWith};

// Imports
use {
	crate::{Trigger, World},
	core::{cell::RefCell, fmt, mem},
	std::rc::Rc,
};

/// Equality predicate
type EqFn<T> = dyn Fn(&T, &T) -> bool;

/// Inner
struct Inner<T> {
	/// Value
	value: RefCell<T>,

	/// Trigger
	trigger: Trigger,

	/// Equality predicate.
	///
	/// When `None`, every write notifies.
	eq: Option<Box<EqFn<T>>>,
}

/// Signal
pub struct Signal<T> {
	/// Inner
	inner: Rc<Inner<T>>,
}

impl<T: 'static> Signal<T> {
	/// Creates a new signal.
	///
	/// Writes that compare equal to the current value are ignored.
	#[must_use]
	#[track_caller]
	pub fn new(world: &World, value: T) -> Self
	where
		T: PartialEq,
	{
		Self::new_with_eq(world, value, T::eq)
	}

	/// Creates a new signal with a custom equality predicate.
	#[must_use]
	#[track_caller]
	pub fn new_with_eq<F>(world: &World, value: T, eq: F) -> Self
	where
		F: Fn(&T, &T) -> bool + 'static,
	{
		let eq: Box<EqFn<T>> = Box::new(eq);
		Self::new_inner(world, value, Some(eq))
	}

	/// Creates a new signal that notifies on every write
	#[must_use]
	#[track_caller]
	pub fn new_always(world: &World, value: T) -> Self {
		Self::new_inner(world, value, None)
	}

	/// Inner function for all constructors
	#[track_caller]
	fn new_inner(world: &World, value: T, eq: Option<Box<EqFn<T>>>) -> Self {
		let inner = Inner {
			value: RefCell::new(value),
			trigger: Trigger::new(world),
			eq,
		};
		Self { inner: Rc::new(inner) }
	}
}

impl<T> Signal<T> {
	/// Returns the trigger of this signal
	#[must_use]
	pub fn trigger(&self) -> &Trigger {
		&self.inner.trigger
	}

	/// Returns the world of this signal
	#[must_use]
	pub fn world(&self) -> &World {
		self.inner.trigger.world()
	}

	/// Returns if `new_value` would change this signal
	fn would_change(&self, value: &T, new_value: &T) -> bool {
		match &self.inner.eq {
			Some(eq) => !eq(value, new_value),
			None => true,
		}
	}
}

impl<T> SignalWith for Signal<T> {
	type Value = T;

	fn with<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		self.inner.trigger.gather_subs();
		self.with_raw(f)
	}

	fn with_raw<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		let value = self
			.inner
			.value
			.try_borrow()
			.expect("Cannot use signal value while updating");
		f(&value)
	}
}

impl<T> SignalSet<T> for Signal<T> {
	#[track_caller]
	fn set(&self, new_value: T) {
		let changed = {
			let mut value = self
				.inner
				.value
				.try_borrow_mut()
				.expect("Cannot update signal value while using it");
			let changed = self.would_change(&value, &new_value);
			if changed {
				*value = new_value;
			}

			changed
		};

		if changed {
			self.inner.trigger.exec();
		}
	}
}

impl<T> SignalReplace<T> for Signal<T> {
	#[track_caller]
	fn replace(&self, new_value: T) -> T {
		let (prev_value, changed) = {
			let mut value = self
				.inner
				.value
				.try_borrow_mut()
				.expect("Cannot update signal value while using it");
			let changed = self.would_change(&value, &new_value);
			(mem::replace(&mut *value, new_value), changed)
		};

		if changed {
			self.inner.trigger.exec();
		}

		prev_value
	}
}

impl<T> SignalUpdate for Signal<T> {
	type Value = T;

	#[track_caller]
	fn update<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&mut Self::Value) -> O,
	{
		// Update the value and get the output
		let output = {
			let mut value = self
				.inner
				.value
				.try_borrow_mut()
				.expect("Cannot update signal value while using it");
			f(&mut value)
		};

		// Then execute our trigger
		self.inner.trigger.exec();

		output
	}
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("Signal");
		match self.inner.value.try_borrow() {
			Ok(value) => s.field("value", &*value),
			Err(_) => s.field("value", &"<updating>"),
		};
		s.field("trigger", &self.inner.trigger).finish()
	}
}

#[cfg(test)]
mod test {
	// Imports
	use {super::*, core::cell::Cell};

	#[test]
	fn set_same_value_is_noop() {
		let world = World::new();
		let signal = Signal::new(&world, 5_i32);
		let runs = Rc::new(Cell::new(0_usize));

		let _effect = world.effect({
			let signal = signal.clone();
			let runs = Rc::clone(&runs);
			move || {
				_ = signal.get();
				runs.set(runs.get() + 1);
			}
		});
		assert_eq!(runs.get(), 1, "Effect wasn't run on creation");

		signal.set(5);
		assert_eq!(runs.get(), 1, "Effect was re-run on an unchanged write");

		signal.set(6);
		assert_eq!(runs.get(), 2, "Effect wasn't re-run on a changed write");
	}

	#[test]
	fn always_notifies_without_eq() {
		let world = World::new();
		let signal = Signal::new_always(&world, 5_i32);
		let runs = Rc::new(Cell::new(0_usize));

		let _effect = world.effect({
			let signal = signal.clone();
			let runs = Rc::clone(&runs);
			move || {
				_ = signal.get();
				runs.set(runs.get() + 1);
			}
		});

		signal.set(5);
		signal.set(5);
		assert_eq!(runs.get(), 3, "Effect wasn't re-run on every write");
	}

	#[test]
	fn custom_eq() {
		let world = World::new();
		let signal = Signal::new_with_eq(&world, 10_i32, |lhs, rhs| lhs / 10 == rhs / 10);
		let runs = Rc::new(Cell::new(0_usize));

		let _effect = world.effect({
			let signal = signal.clone();
			let runs = Rc::clone(&runs);
			move || {
				_ = signal.get();
				runs.set(runs.get() + 1);
			}
		});

		signal.set(15);
		assert_eq!(runs.get(), 1, "Predicate wasn't used");
		assert_eq!(signal.get_raw(), 10, "Ignored write still changed the value");

		signal.set(20);
		assert_eq!(runs.get(), 2);
	}

	#[test]
	fn replace_returns_previous() {
		let world = World::new();
		let signal = Signal::new(&world, "a");

		assert_eq!(signal.replace("b"), "a");
		assert_eq!(signal.get_raw(), "b");
	}

	#[test]
	#[should_panic = "Cannot update signal value while using it"]
	fn update_while_using_panics() {
		let world = World::new();
		let signal = Signal::new(&world, 0_i32);
		signal.with_raw(|_| signal.set(1));
	}
}
