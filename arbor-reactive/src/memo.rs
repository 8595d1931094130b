//! Memo
//!
//! A derived value that's only recomputed when it's dependencies change,
//! and only notifies it's own subscribers when the recomputed value differs.

// Imports
use {
	crate::{Scope, Signal, SignalSet, SignalWith, World},
	core::fmt,
};

/// Memo
pub struct Memo<T> {
	/// Value
	value: Signal<Option<T>>,

	/// Scope recomputing the value
	scope: Scope,
}

impl<T: PartialEq + 'static> Memo<T> {
	/// Creates a new memo, computing it's initial value immediately.
	#[track_caller]
	pub fn new<F>(world: &World, f: F) -> Self
	where
		F: Fn() -> T + 'static,
	{
		let value = Signal::new(world, None);
		let scope = Scope::new(world, {
			let value = value.clone();
			move || value.set(Some(f()))
		});
		scope.trigger();

		Self { value, scope }
	}
}

impl<T> Memo<T> {
	/// Returns the scope recomputing this memo.
	///
	/// Disposing it freezes the memo at it's current value.
	#[must_use]
	pub fn scope(&self) -> &Scope {
		&self.scope
	}
}

impl<T> SignalWith for Memo<T> {
	type Value = T;

	fn with<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		self.value
			.with(|value| f(value.as_ref().expect("Memo value wasn't initialized")))
	}

	fn with_raw<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		self.value
			.with_raw(|value| f(value.as_ref().expect("Memo value wasn't initialized")))
	}
}

impl<T> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			value: self.value.clone(),
			scope: self.scope.clone(),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo")
			.field("value", &self.value)
			.field("scope", &self.scope)
			.finish()
	}
}

#[cfg(test)]
mod test {
	// Imports
	use {
		super::*,
		crate::SignalGet,
		core::cell::Cell,
		std::rc::Rc,
	};

	#[test]
	fn only_notifies_on_change() {
		let world = World::new();
		let count = Signal::new(&world, 1_i32);
		let parity = world.memo({
			let count = count.clone();
			move || count.get() % 2
		});

		let runs = Rc::new(Cell::new(0_usize));
		let _effect = world.effect({
			let parity = parity.clone();
			let runs = Rc::clone(&runs);
			move || {
				_ = parity.get();
				runs.set(runs.get() + 1);
			}
		});
		assert_eq!(parity.get_raw(), 1);

		count.set(3);
		assert_eq!(runs.get(), 1, "Unchanged memo notified subscribers");

		count.set(4);
		assert_eq!(parity.get_raw(), 0);
		assert_eq!(runs.get(), 2, "Changed memo didn't notify subscribers");
	}
}
