//! Context
//!
//! Nodes may create contexts, which are values keyed by their type, that any
//! descendant may read.
//!
//! A context is looked up starting from the *parent* of the reading node, and
//! going up until a node that created a context of that type is found.
//!
//! Since nodes are built before being attached, readers created while building
//! are only initialized once the node is mounted, and uninitialized once it's
//! unmounted. Reading an uninitialized context is a fatal error.
//!
//! When a context is replaced, every reader that resolved to it is notified,
//! both through it's trigger, re-running any scopes that read it, and through
//! it's [`Dependency`], re-running any lifecycle effects that depend on it.

// Imports
use {
	crate::{Node, NodeKey, Tree, TreeError, error::TreeResultExt, node::data::NodeData},
	arbor_reactive::{Dependency, SignalWith, Trigger, World},
	core::{
		any::{self, Any, TypeId},
		cell::RefCell,
		fmt,
	},
	slotmap::SlotMap,
	std::{collections::HashMap, rc::Rc},
};

/// Context slot, as stored by the creating node
type Slot<T> = RefCell<T>;

/// Type-erased context reader
pub(crate) trait ErasedReader {
	/// Returns the type of context read
	fn context_type(&self) -> TypeId;

	/// Returns the name of the type of context read
	fn context_name(&self) -> &'static str;

	/// Initializes this reader with the slot of the creating node
	fn init(&self, slot: Rc<dyn Any>);

	/// Uninitializes this reader
	fn uninit(&self);

	/// Returns if this reader was initialized with `slot`
	fn is_bound_to(&self, slot: &Rc<dyn Any>) -> bool;

	/// Notifies that the value will change
	fn will_change(&self);

	/// Notifies that the value changed
	fn did_change(&self);
}

/// Reader inner
struct Inner<T> {
	/// Slot of the creating node
	slot: RefCell<Option<Rc<Slot<T>>>>,

	/// Trigger
	trigger: Trigger,

	/// Dependency
	dep: Dependency,

	/// Node reading the context
	node: NodeKey,
}

impl<T: 'static> ErasedReader for Inner<T> {
	fn context_type(&self) -> TypeId {
		TypeId::of::<T>()
	}

	fn context_name(&self) -> &'static str {
		any::type_name::<T>()
	}

	fn init(&self, slot: Rc<dyn Any>) {
		let slot = slot.downcast::<Slot<T>>().expect("Value was the wrong type");
		*self.slot.borrow_mut() = Some(slot);
	}

	fn uninit(&self) {
		self.slot.borrow_mut().take();
	}

	fn is_bound_to(&self, slot: &Rc<dyn Any>) -> bool {
		self.slot
			.borrow()
			.as_ref()
			.is_some_and(|cur_slot| Rc::as_ptr(cur_slot).addr() == Rc::as_ptr(slot).addr())
	}

	fn will_change(&self) {
		self.dep.will_change();
	}

	fn did_change(&self) {
		self.trigger.exec();
		self.dep.did_change();
	}
}

/// Context reader
pub struct Context<T> {
	/// Inner
	inner: Rc<Inner<T>>,
}

impl<T: 'static> Context<T> {
	/// Creates a new, uninitialized, reader
	#[track_caller]
	fn new(world: &World, node: NodeKey) -> Self {
		let inner = Inner {
			slot: RefCell::new(None),
			trigger: Trigger::new(world),
			dep: Dependency::new(),
			node,
		};
		Self { inner: Rc::new(inner) }
	}
}

impl<T> Context<T> {
	/// Returns if this reader is initialized
	#[must_use]
	pub fn is_initialized(&self) -> bool {
		self.inner.slot.borrow().is_some()
	}

	/// Returns the key of the node reading this context
	#[must_use]
	pub fn node(&self) -> NodeKey {
		self.inner.node
	}

	/// Returns the dependency of this context.
	///
	/// It changes whenever the context is replaced.
	#[must_use]
	pub fn dep(&self) -> Dependency {
		self.inner.dep.clone()
	}
}

impl<T> SignalWith for Context<T> {
	type Value = T;

	fn with<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		self.inner.trigger.gather_subs();
		self.with_raw(f)
	}

	#[track_caller]
	fn with_raw<F, O>(&self, f: F) -> O
	where
		F: FnOnce(&Self::Value) -> O,
	{
		let slot = self.inner.slot.borrow();
		let slot = slot
			.as_ref()
			.expect("Context wasn't initialized, it may only be read while the node is mounted");
		let value = slot.try_borrow().expect("Cannot use context while replacing it");
		f(&value)
	}
}

impl<T> Clone for Context<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T> From<&Context<T>> for Dependency {
	fn from(context: &Context<T>) -> Self {
		context.dep()
	}
}

impl<T> fmt::Debug for Context<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("ty", &any::type_name::<T>())
			.field("node", &self.inner.node)
			.field("initialized", &self.is_initialized())
			.finish_non_exhaustive()
	}
}

impl Node {
	/// Creates a context of type `T` at this node
	pub fn try_create_context<T: 'static>(&self, value: T) -> Result<(), TreeError> {
		let tree = self.try_tree()?;
		let mut nodes = tree.nodes().borrow_mut();
		let data = nodes
			.get_mut(self.key())
			.ok_or(TreeError::AlreadyFreed { node: self.key() })?;
		if data.contexts.contains_key(&TypeId::of::<T>()) {
			return Err(TreeError::DuplicateContext {
				node: self.key(),
				ty:   any::type_name::<T>(),
			});
		}

		let slot: Rc<Slot<T>> = Rc::new(RefCell::new(value));
		data.contexts.insert(TypeId::of::<T>(), slot);

		Ok(())
	}

	/// Creates a context of type `T` at this node.
	///
	/// See [`Node::try_create_context`].
	#[track_caller]
	pub fn create_context<T: 'static>(&self, value: T) {
		self.try_create_context(value).or_panic();
	}

	/// Replaces the context of type `T` created at this node, returning the previous value.
	///
	/// Notifies every descendant reader of it, except for those below a descendant
	/// that created it's own context of type `T`.
	pub fn try_replace_context<T: 'static>(&self, value: T) -> Result<T, TreeError> {
		let tree = self.try_tree()?;
		let (slot, readers) = {
			let nodes = tree.nodes().borrow();
			let data = nodes
				.get(self.key())
				.ok_or(TreeError::AlreadyFreed { node: self.key() })?;
			let slot = data
				.contexts
				.get(&TypeId::of::<T>())
				.ok_or(TreeError::MissingContext {
					node: self.key(),
					ty:   any::type_name::<T>(),
				})?;

			(Rc::clone(slot), self::readers_of(&nodes, data, slot, TypeId::of::<T>()))
		};

		tracing::trace!(node=?self, ty=any::type_name::<T>(), readers=readers.len(), "Replacing context");
		let prev = tree.world().batch(|| {
			for reader in &readers {
				reader.will_change();
			}

			let slot = slot.downcast::<Slot<T>>().expect("Value was the wrong type");
			let prev = slot.replace(value);

			for reader in &readers {
				reader.did_change();
			}

			prev
		});

		Ok(prev)
	}

	/// Replaces the context of type `T` created at this node, returning the previous value.
	///
	/// See [`Node::try_replace_context`].
	#[track_caller]
	pub fn replace_context<T: 'static>(&self, value: T) -> T {
		self.try_replace_context(value).or_panic()
	}

	/// Uses a context of type `T`, provided by an ancestor.
	///
	/// If we're mounted, the context is looked up immediately. Otherwise, it'll
	/// be looked up once we're mounted.
	pub fn try_use_context<T: 'static>(&self) -> Result<Context<T>, TreeError> {
		let tree = self.try_tree()?;
		let context = Context::<T>::new(tree.world(), self.key());

		let mut nodes = tree.nodes().borrow_mut();
		let data = nodes
			.get(self.key())
			.ok_or(TreeError::AlreadyFreed { node: self.key() })?;
		if data.mounted {
			let slot = self::lookup(&nodes, data.parent, TypeId::of::<T>(), &HashMap::new()).ok_or(
				TreeError::MissingContext {
					node: self.key(),
					ty:   any::type_name::<T>(),
				},
			)?;
			context.inner.init(slot);
		}

		let reader: Rc<dyn ErasedReader> = Rc::<Inner<T>>::clone(&context.inner);
		if let Some(data) = nodes.get_mut(self.key()) {
			data.readers.push(reader);
		}
		drop(nodes);

		// Note: The reader only lives as long as the scope using it, so
		//       re-running that scope doesn't leave stale readers behind.
		if let Some(scope) = tree.world().current() {
			let node = self.clone();
			let reader_id = Rc::as_ptr(&context.inner).addr();
			scope.on_cleanup(move || node.remove_reader(reader_id));
		}

		Ok(context)
	}

	/// Removes a context reader of this node, by it's address
	fn remove_reader(&self, reader_id: usize) {
		let Ok(tree) = self.try_tree() else {
			return;
		};

		// Note: The reader must be dropped after the borrow ends.
		let reader = {
			let mut nodes = tree.nodes().borrow_mut();
			let Some(data) = nodes.get_mut(self.key()) else {
				return;
			};
			data.readers
				.iter()
				.position(|reader| Rc::as_ptr(reader).addr() == reader_id)
				.map(|idx| data.readers.remove(idx))
		};
		drop(reader);
	}

	/// Uses a context of type `T`, provided by an ancestor.
	///
	/// See [`Node::try_use_context`].
	#[track_caller]
	pub fn use_context<T: 'static>(&self) -> Context<T> {
		self.try_use_context().or_panic()
	}

	/// Finds the current value of a context of type `T`, provided by an ancestor.
	///
	/// Unlike [`Node::use_context`], this looks up the context immediately, and
	/// doesn't keep track of it.
	pub fn find_context<T: Clone + 'static>(&self) -> Result<T, TreeError> {
		let tree = self.try_tree()?;
		let nodes = tree.nodes().borrow();
		let data = nodes
			.get(self.key())
			.ok_or(TreeError::AlreadyFreed { node: self.key() })?;
		let slot = self::lookup(&nodes, data.parent, TypeId::of::<T>(), &HashMap::new())
			.ok_or(TreeError::MissingContext {
				node: self.key(),
				ty:   any::type_name::<T>(),
			})?
			.downcast::<Slot<T>>()
			.expect("Value was the wrong type");

		let value = slot.borrow().clone();
		Ok(value)
	}
}

impl Tree {
	/// Returns the number of context readers in the tree
	#[must_use]
	pub fn context_reader_count(&self) -> usize {
		self.nodes().borrow().values().map(|data| data.readers.len()).sum()
	}
}

/// Looks up a context, starting from `start` and going up.
///
/// `parents` overrides the parents of any nodes.
pub(crate) fn lookup(
	nodes: &SlotMap<NodeKey, NodeData>,
	start: Option<NodeKey>,
	context_type: TypeId,
	parents: &HashMap<NodeKey, NodeKey>,
) -> Option<Rc<dyn Any>> {
	let mut cur = start;
	while let Some(key) = cur {
		let data = nodes.get(key)?;
		if let Some(slot) = data.contexts.get(&context_type) {
			return Some(Rc::clone(slot));
		}

		cur = parents.get(&key).copied().or(data.parent);
	}

	None
}

/// Returns all readers below `data` bound to `slot`, depth-first.
///
/// Doesn't descend into nodes that create their own context of the same type.
fn readers_of(
	nodes: &SlotMap<NodeKey, NodeData>,
	data: &NodeData,
	slot: &Rc<dyn Any>,
	context_type: TypeId,
) -> Vec<Rc<dyn ErasedReader>> {
	let mut readers = vec![];
	let mut stack = data.children.iter().rev().copied().collect::<Vec<_>>();
	while let Some(key) = stack.pop() {
		let Some(data) = nodes.get(key) else {
			continue;
		};

		readers.extend(
			data.readers
				.iter()
				.filter(|reader| reader.is_bound_to(slot))
				.cloned(),
		);
		if !data.contexts.contains_key(&context_type) {
			stack.extend(data.children.iter().rev());
		}
	}

	readers
}
