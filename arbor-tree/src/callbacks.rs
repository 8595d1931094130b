//! Message callbacks

// Imports
use {
	crate::Node,
	core::any::{Any, TypeId},
	std::{collections::HashMap, rc::Rc},
};

/// Callback for messages of type `M`
pub type Callback<M> = dyn Fn(&Node, &M);

/// When a callback runs, relative to the node's children
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CallbackKind {
	/// Before the children
	On,

	/// After the children
	After,
}

/// Callbacks of a node, by message type
#[derive(Default)]
pub struct Callbacks {
	/// "On" callbacks
	on: HashMap<TypeId, Vec<Rc<dyn Any>>>,

	/// "After" callbacks
	after: HashMap<TypeId, Vec<Rc<dyn Any>>>,
}

impl Callbacks {
	/// Adds a callback
	pub fn add<M: 'static>(&mut self, kind: CallbackKind, callback: Box<Callback<M>>) {
		self.callbacks_mut(kind)
			.entry(TypeId::of::<M>())
			.or_default()
			.push(Rc::new(callback));
	}

	/// Returns all callbacks of a kind for messages of type `M`, in the order they were added
	pub fn get<M: 'static>(&self, kind: CallbackKind) -> Vec<Rc<Box<Callback<M>>>> {
		let callbacks = match kind {
			CallbackKind::On => &self.on,
			CallbackKind::After => &self.after,
		};

		callbacks
			.get(&TypeId::of::<M>())
			.into_iter()
			.flatten()
			.map(|callback| {
				Rc::clone(callback)
					.downcast::<Box<Callback<M>>>()
					.expect("Callback was the wrong type")
			})
			.collect()
	}

	/// Returns the callbacks of a kind
	fn callbacks_mut(&mut self, kind: CallbackKind) -> &mut HashMap<TypeId, Vec<Rc<dyn Any>>> {
		match kind {
			CallbackKind::On => &mut self.on,
			CallbackKind::After => &mut self.after,
		}
	}
}
