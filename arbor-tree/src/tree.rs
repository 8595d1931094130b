//! Tree
//!
//! The tree owns every node, along with the queues that drive it:
//! - The call queue, for messages queued with [`Tree::queue_call`].
//! - The deferred queue, for actions scheduled with [`Tree::call_deferred`].
//! - The free queue, for nodes queued with [`Node::queue_free`].
//!
//! All of them are drained, in that order, by [`Tree::update`].

// Imports
use {
	crate::{
		Component,
		Node,
		NodeKey,
		NodeState,
		TreeError,
		callbacks::{Callback, CallbackKind},
		error::TreeResultExt,
		node::data::NodeData,
	},
	arbor_reactive::World,
	core::{
		any::{self, Any, TypeId},
		cell::{Cell, RefCell},
		fmt,
		mem,
	},
	slotmap::SlotMap,
	std::{
		collections::HashMap,
		rc::{Rc, Weak},
	},
};

/// Deferred action
type Action = Box<dyn FnOnce(&Tree)>;

/// Inner
struct Inner {
	/// World
	world: World,

	/// Nodes
	nodes: RefCell<SlotMap<NodeKey, NodeData>>,

	/// Hidden root.
	///
	/// Anchors everything that's mounted, including any decorators of the root.
	hidden_root: NodeKey,

	/// Root
	root: NodeKey,

	/// Queued calls
	call_queue: RefCell<Vec<Action>>,

	/// Deferred actions
	deferred: RefCell<Vec<Action>>,

	/// Nodes queued for freeing
	free_queue: RefCell<Vec<NodeKey>>,

	/// Mounted nodes, by id
	ids: RefCell<HashMap<String, NodeKey>>,

	/// Singletons
	singletons: RefCell<HashMap<TypeId, Rc<dyn Any>>>,

	/// Number of calls in progress
	call_depth: Cell<usize>,
}

/// Tree
#[derive(Clone)]
pub struct Tree {
	/// Inner
	inner: Rc<Inner>,
}

impl Tree {
	/// Creates a new tree, with an empty mounted root
	#[must_use]
	pub fn new() -> Self {
		let world = World::new();

		let mut nodes = SlotMap::with_key();
		let mut hidden_root = NodeData::new(&world, Some("hidden-root".to_owned()));
		hidden_root.state = NodeState::Built;
		hidden_root.mounted = true;
		let hidden_root = nodes.insert(hidden_root);

		let mut root = NodeData::new(&world, Some("root".to_owned()));
		root.state = NodeState::Built;
		root.mounted = true;
		root.parent = Some(hidden_root);
		let root = nodes.insert(root);
		nodes[hidden_root].children.push(root);

		let inner = Inner {
			world,
			nodes: RefCell::new(nodes),
			hidden_root,
			root,
			call_queue: RefCell::new(vec![]),
			deferred: RefCell::new(vec![]),
			free_queue: RefCell::new(vec![]),
			ids: RefCell::new(HashMap::new()),
			singletons: RefCell::new(HashMap::new()),
			call_depth: Cell::new(0),
		};
		Self { inner: Rc::new(inner) }
	}

	/// Returns the world every node of this tree is reactive in
	#[must_use]
	pub fn world(&self) -> &World {
		&self.inner.world
	}

	/// Downgrades this tree
	#[must_use]
	pub fn downgrade(&self) -> WeakTree {
		WeakTree {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Returns the root node.
	///
	/// The root stays the same even if it's decorated.
	#[must_use]
	pub fn root(&self) -> Node {
		self.node(self.inner.root)
	}

	/// Returns the number of nodes in this tree, including the hidden root
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.nodes.borrow().len()
	}

	/// Returns if this tree has no nodes.
	///
	/// Only possible after the hidden root is freed.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.inner.nodes.borrow().is_empty()
	}

	/// Builds `component` as a new child of the root
	#[track_caller]
	pub fn attach_to_root(&self, component: &Component) -> Node {
		self.root().create_child(component)
	}

	/// Decorates the root with `component`, returning the decorator
	#[track_caller]
	pub fn decorate_root_up(&self, component: &Component) -> Node {
		self.root().decorate_up(component)
	}

	/// Builds `component` into a new node with no parent.
	#[track_caller]
	pub fn build(&self, component: &Component) -> Node {
		let key = self.inner.world.batch(|| self.build_node(component));
		self.node(key)
	}

	/// Calls every callback for messages of type `M` in the mounted tree.
	///
	/// The tree is visited depth-first. At each node, the "on" callbacks run first,
	/// then the children are visited, and finally the "after" callbacks run.
	///
	/// While a call is in progress, mounted nodes can't be restructured.
	#[track_caller]
	pub fn call<M: 'static>(&self, msg: &M) {
		tracing::trace!(msg=any::type_name::<M>(), "Calling");

		let depth = &self.inner.call_depth;
		depth.set(depth.get() + 1);
		let _depth = scopeguard::guard((), |()| depth.set(depth.get() - 1));

		self.call_node(self.inner.hidden_root, msg);
	}

	/// Queues a call, to be made on the next update, before any deferred actions
	pub fn queue_call<M: 'static>(&self, msg: M) {
		self.inner
			.call_queue
			.borrow_mut()
			.push(Box::new(move |tree| tree.call(&msg)));
	}

	/// Defers `f` to the next update
	pub fn call_deferred<F>(&self, f: F)
	where
		F: FnOnce(&Self) + 'static,
	{
		self.inner.deferred.borrow_mut().push(Box::new(f));
	}

	/// Updates the tree.
	///
	/// First makes all queued calls, then runs all deferred actions,
	/// and finally frees every node queued for freeing, including any
	/// queued by the previous steps.
	///
	/// Actions deferred during the update only run on the next one.
	pub fn update(&self) {
		let calls = mem::take(&mut *self.inner.call_queue.borrow_mut());
		let deferred_calls = calls.len();
		for call in calls {
			call(self);
		}

		let deferred = mem::take(&mut *self.inner.deferred.borrow_mut());
		let deferred_actions = deferred.len();
		for action in deferred {
			action(self);
		}

		// Note: Freeing may run cleanups that queue further frees.
		let mut freed = 0_usize;
		loop {
			let queue = mem::take(&mut *self.inner.free_queue.borrow_mut());
			if queue.is_empty() {
				break;
			}

			for key in queue {
				if self.is_alive(key) {
					self.inner.world.batch(|| self.free_node(key));
					freed += 1;
				}
			}
		}

		if deferred_calls != 0 || deferred_actions != 0 || freed != 0 {
			tracing::debug!(deferred_calls, deferred_actions, freed, "Updated tree");
		}
	}

	/// Returns the mounted node with id `id`
	#[must_use]
	pub fn node_by_id(&self, id: &str) -> Option<Node> {
		let key = *self.inner.ids.borrow().get(id)?;
		Some(self.node(key))
	}

	/// Sets a singleton, returning the previous one
	pub fn set_singleton<T: 'static>(&self, value: T) -> Option<Rc<T>> {
		let prev = self
			.inner
			.singletons
			.borrow_mut()
			.insert(TypeId::of::<T>(), Rc::new(value))?;
		Some(prev.downcast().expect("Singleton was the wrong type"))
	}

	/// Returns a singleton, if set
	#[must_use]
	pub fn try_singleton<T: 'static>(&self) -> Option<Rc<T>> {
		let singleton = Rc::clone(self.inner.singletons.borrow().get(&TypeId::of::<T>())?);
		Some(singleton.downcast().expect("Singleton was the wrong type"))
	}

	/// Returns a singleton.
	///
	/// # Panics
	/// Panics if the singleton was never set.
	#[must_use]
	#[track_caller]
	pub fn use_singleton<T: 'static>(&self) -> Rc<T> {
		self.try_singleton()
			.ok_or(TreeError::MissingSingleton {
				ty: any::type_name::<T>(),
			})
			.or_panic()
	}

	/// Shuts down the tree.
	///
	/// Runs any pending update, then frees everything below the hidden root,
	/// running every cleanup exactly once.
	pub fn shutdown(&self) {
		self.update();

		let roots = self
			.inner
			.nodes
			.borrow()
			.get(self.inner.hidden_root)
			.map(|data| data.children.clone())
			.unwrap_or_default();
		self.inner.world.batch(|| {
			for root in roots {
				self.free_node(root);
			}
		});
		self.update();

		tracing::debug!(nodes=self.len(), "Shut down tree");
	}

	/// Returns a node handle
	pub(crate) fn node(&self, key: NodeKey) -> Node {
		Node::new(key, self.downgrade())
	}

	/// Returns the nodes
	pub(crate) fn nodes(&self) -> &RefCell<SlotMap<NodeKey, NodeData>> {
		&self.inner.nodes
	}

	/// Returns the id registry
	pub(crate) fn ids(&self) -> &RefCell<HashMap<String, NodeKey>> {
		&self.inner.ids
	}

	/// Returns the hidden root
	pub(crate) fn hidden_root(&self) -> NodeKey {
		self.inner.hidden_root
	}

	/// Queues a node for freeing
	pub(crate) fn queue_free(&self, key: NodeKey) {
		self.inner.free_queue.borrow_mut().push(key);
	}

	/// Returns if a node exists and wasn't freed
	pub(crate) fn is_alive(&self, key: NodeKey) -> bool {
		self.inner
			.nodes
			.borrow()
			.get(key)
			.is_some_and(|data| data.state != NodeState::Freed)
	}

	/// Checks that a node may be restructured.
	///
	/// Mounted nodes can't be restructured during a call.
	pub(crate) fn check_mutation(&self, mounted: bool) -> Result<(), TreeError> {
		if mounted && self.inner.call_depth.get() != 0 {
			return Err(TreeError::MutationDuringCall);
		}

		Ok(())
	}

	/// Calls all callbacks for `M` of a node and it's children
	fn call_node<M: 'static>(&self, key: NodeKey, msg: &M) {
		let Some(on) = self.callbacks::<M>(key, CallbackKind::On) else {
			return;
		};
		let node = self.node(key);
		for callback in on {
			callback(&node, msg);
		}

		// Note: The callbacks might have queued changes to the children,
		//       but they can't have changed them, so this is still up to date.
		let children = match self.inner.nodes.borrow().get(key) {
			Some(data) => data.children.clone(),
			None => return,
		};
		for child in children {
			self.call_node(child, msg);
		}

		if let Some(after) = self.callbacks::<M>(key, CallbackKind::After) {
			for callback in after {
				callback(&node, msg);
			}
		}
	}

	/// Returns the callbacks of a kind for `M` of a node
	fn callbacks<M: 'static>(
		&self,
		key: NodeKey,
		kind: CallbackKind,
	) -> Option<Vec<Rc<Box<Callback<M>>>>> {
		let nodes = self.inner.nodes.borrow();
		let data = nodes.get(key)?;
		Some(data.callbacks.get::<M>(kind))
	}
}

impl Default for Tree {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for Tree {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tree")
			.field("world", &self.inner.world)
			.field("nodes", &self.inner.nodes.try_borrow().map_or(0, |nodes| nodes.len()))
			.field("queued_calls", &self.inner.call_queue.borrow().len())
			.field("deferred", &self.inner.deferred.borrow().len())
			.field("queued_frees", &self.inner.free_queue.borrow().len())
			.field("call_depth", &self.inner.call_depth.get())
			.finish_non_exhaustive()
	}
}

/// Weak tree
///
/// Held by node handles, so they never keep the tree alive.
#[derive(Clone, Default)]
pub struct WeakTree {
	/// Inner
	inner: Weak<Inner>,
}

impl WeakTree {
	/// Upgrades this tree
	#[must_use]
	pub fn upgrade(&self) -> Option<Tree> {
		let inner = self.inner.upgrade()?;
		Some(Tree { inner })
	}

	/// Returns if both trees are the same
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Weak::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for WeakTree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(tree) => fmt::Debug::fmt(&tree, f),
			None => f.debug_struct("WeakTree").finish_non_exhaustive(),
		}
	}
}
