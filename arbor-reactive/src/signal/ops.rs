//! Signal operators

// Imports
use std::rc::Rc;

/// Signal with
pub trait SignalWith {
	/// Value type
	type Value: ?Sized;

	/// Uses the signal value, subscribing the current scope.
	fn with<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O;

	/// Uses the signal value without subscribing anything.
	fn with_raw<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O;
}

#[duplicate::duplicate_item(
	Ty;
	[&'_ S];
	[Rc<S>];
)]
impl<S> SignalWith for Ty
where
	S: ?Sized + SignalWith,
{
	type Value = S::Value;

	fn with<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		(**self).with(f)
	}

	fn with_raw<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		(**self).with_raw(f)
	}
}

/// Signal get
pub trait SignalGet: SignalWith {
	/// Gets the signal value, by copying it.
	fn get(&self) -> Self::Value
	where
		Self::Value: Copy,
	{
		self.with(|value| *value)
	}

	/// Gets the signal value, by copying it, without subscribing anything.
	fn get_raw(&self) -> Self::Value
	where
		Self::Value: Copy,
	{
		self.with_raw(|value| *value)
	}
}

impl<S: ?Sized + SignalWith> SignalGet for S {}

/// Signal cloned
pub trait SignalGetCloned: SignalWith {
	/// Gets the signal value, by cloning it.
	fn get_cloned(&self) -> Self::Value
	where
		Self::Value: Clone,
	{
		self.with(<Self::Value as Clone>::clone)
	}

	/// Gets the signal value, by cloning it, without subscribing anything.
	fn get_cloned_raw(&self) -> Self::Value
	where
		Self::Value: Clone,
	{
		self.with_raw(<Self::Value as Clone>::clone)
	}
}

impl<S: ?Sized + SignalWith> SignalGetCloned for S {}

/// Signal set
pub trait SignalSet<Value> {
	/// Sets the signal value.
	///
	/// If the signal considers the value unchanged, nothing is notified.
	fn set(&self, new_value: Value);
}

/// Signal replace
pub trait SignalReplace<Value> {
	/// Replaces the signal value, returning the previous value
	fn replace(&self, new_value: Value) -> Value;
}

/// Signal update
pub trait SignalUpdate {
	/// Value type
	type Value: ?Sized;

	/// Updates the signal value.
	///
	/// Always notifies, since the signal can't know what `f` changed.
	fn update<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&mut Self::Value) -> O;
}
