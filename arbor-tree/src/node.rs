//! Node
//!
//! A [`Node`] is a lightweight handle to a node stored in a [`Tree`].
//!
//! Handles only keep a weak reference to the tree, and may outlive the node
//! they point to. Once freed, a node's handle reports [`NodeState::Freed`],
//! and any structural operation on it fails with [`TreeError::AlreadyFreed`].

// Modules
pub(crate) mod data;
mod decorate;
mod lifecycle;

// Exports
pub use self::data::NodeState;

// Imports
use {
	crate::{
		Component,
		Tree,
		TreeError,
		WeakTree,
		callbacks::{Callback, CallbackKind},
		error::{self, TreeResultExt},
	},
	arbor_reactive::Scope,
	core::{
		fmt,
		hash::{Hash, Hasher},
	},
	std::rc::Rc,
};

slotmap::new_key_type! {
	/// Node key
	pub struct NodeKey;
}

/// Node
#[derive(Clone)]
pub struct Node {
	/// Key
	key: NodeKey,

	/// Tree
	tree: WeakTree,
}

impl Node {
	/// Creates a node handle
	pub(crate) const fn new(key: NodeKey, tree: WeakTree) -> Self {
		Self { key, tree }
	}

	/// Returns the key of this node
	#[must_use]
	pub const fn key(&self) -> NodeKey {
		self.key
	}

	/// Returns the tree of this node
	pub fn try_tree(&self) -> Result<Tree, TreeError> {
		self.tree.upgrade().ok_or(TreeError::Dropped)
	}

	/// Returns the tree of this node.
	///
	/// # Panics
	/// Panics if the tree was dropped.
	#[must_use]
	#[track_caller]
	pub fn tree(&self) -> Tree {
		self.try_tree().or_panic()
	}

	/// Returns the state of this node.
	///
	/// Nodes of dropped trees are considered freed.
	#[must_use]
	pub fn state(&self) -> NodeState {
		let Some(tree) = self.tree.upgrade() else {
			return NodeState::Freed;
		};
		let nodes = tree.nodes().borrow();
		nodes.get(self.key).map_or(NodeState::Freed, |data| data.state)
	}

	/// Returns if this node is mounted
	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.with_data(|data| data.mounted).unwrap_or(false)
	}

	/// Returns the debug name of this node
	#[must_use]
	pub fn name(&self) -> Option<String> {
		self.with_data(|data| data.name.clone()).ok().flatten()
	}

	/// Returns the parent of this node
	#[must_use]
	pub fn parent(&self) -> Option<Self> {
		let parent = self.with_data(|data| data.parent).ok().flatten()?;
		Some(Self::new(parent, self.tree.clone()))
	}

	/// Returns the children of this node
	#[must_use]
	pub fn children(&self) -> Vec<Self> {
		self.with_data(|data| {
			data.children
				.iter()
				.map(|&child| Self::new(child, self.tree.clone()))
				.collect()
		})
		.unwrap_or_default()
	}

	/// Returns the id of this node
	#[must_use]
	pub fn id(&self) -> Option<String> {
		self.with_data(|data| data.id.clone()).ok().flatten()
	}

	/// Sets the id of this node.
	///
	/// If mounted, the id is registered immediately, otherwise once the node is mounted.
	pub fn try_set_id(&self, id: impl Into<String>) -> Result<(), TreeError> {
		self.try_tree()?.set_id(self.key, id.into())
	}

	/// Sets the id of this node.
	///
	/// See [`Node::try_set_id`].
	#[track_caller]
	pub fn set_id(&self, id: impl Into<String>) {
		self.try_set_id(id).or_panic();
	}

	/// Returns the scope of this node.
	///
	/// # Panics
	/// Panics if the node was freed.
	#[must_use]
	#[track_caller]
	pub fn scope(&self) -> Scope {
		self.with_data(|data| data.scope.clone()).or_panic()
	}

	/// Adds `child` as the last child of this node.
	///
	/// If we're mounted, `child` is mounted along with it's subtree.
	pub fn try_add_child(&self, child: &Self) -> Result<(), TreeError> {
		self.try_tree()?.attach(self.key, child.key, None)
	}

	/// Adds `child` as the last child of this node.
	///
	/// See [`Node::try_add_child`].
	#[track_caller]
	pub fn add_child(&self, child: &Self) {
		self.try_add_child(child).or_panic();
	}

	/// Inserts `child` as a child of this node at `index`.
	///
	/// Indices past the end insert at the end.
	pub fn try_insert_child(&self, index: usize, child: &Self) -> Result<(), TreeError> {
		self.try_tree()?.attach(self.key, child.key, Some(index))
	}

	/// Inserts `child` as a child of this node at `index`.
	///
	/// See [`Node::try_insert_child`].
	#[track_caller]
	pub fn insert_child(&self, index: usize, child: &Self) {
		self.try_insert_child(index, child).or_panic();
	}

	/// Removes `child` from this node.
	///
	/// The child is unmounted first, and then left without a parent, but not freed.
	pub fn try_remove_child(&self, child: &Self) -> Result<(), TreeError> {
		self.try_tree()?.detach(self.key, child.key)
	}

	/// Removes `child` from this node.
	///
	/// See [`Node::try_remove_child`].
	#[track_caller]
	pub fn remove_child(&self, child: &Self) {
		self.try_remove_child(child).or_panic();
	}

	/// Reorders the children of this node, without unmounting them.
	///
	/// `children` must contain exactly our current children.
	pub fn try_arrange_children(&self, children: &[Self]) -> Result<(), TreeError> {
		let children = children.iter().map(Self::key).collect::<Vec<_>>();
		self.try_tree()?.arrange(self.key, children)
	}

	/// Reorders the children of this node, without unmounting them.
	///
	/// See [`Node::try_arrange_children`].
	#[track_caller]
	pub fn arrange_children(&self, children: &[Self]) {
		self.try_arrange_children(children).or_panic();
	}

	/// Builds `component` into a new child of this node.
	///
	/// The whole subtree is built before being attached, and then mounted at once.
	pub fn try_create_child(&self, component: &Component) -> Result<Self, TreeError> {
		let tree = self.try_tree()?;
		let child = tree.create_child(self.key, component)?;
		Ok(tree.node(child))
	}

	/// Builds `component` into a new child of this node.
	///
	/// See [`Node::try_create_child`].
	#[track_caller]
	pub fn create_child(&self, component: &Component) -> Self {
		self.try_create_child(component).or_panic()
	}

	/// Frees this node, along with all of it's children.
	pub fn try_free(&self) -> Result<(), TreeError> {
		self.try_tree()?.free(self.key)
	}

	/// Frees this node, along with all of it's children.
	///
	/// See [`Node::try_free`].
	#[track_caller]
	pub fn free(&self) {
		self.try_free().or_panic();
	}

	/// Frees this node, if it wasn't freed already
	#[track_caller]
	pub fn safe_free(&self) {
		match self.try_free() {
			Ok(()) | Err(TreeError::AlreadyFreed { .. } | TreeError::Dropped) => (),
			Err(err) => error::on_tree_error(&err),
		}
	}

	/// Queues this node to be freed on the next update.
	///
	/// Until then, the node stays where it is.
	pub fn queue_free(&self) {
		let Some(tree) = self.tree.upgrade() else {
			return;
		};

		{
			let mut nodes = tree.nodes().borrow_mut();
			let Some(data) = nodes.get_mut(self.key) else {
				return;
			};
			if data.state == NodeState::Freed {
				return;
			}
			data.state = NodeState::QueuedToDeletion;
		}

		tracing::trace!(node=?self, "Queued node for freeing");
		tree.queue_free(self.key);
	}

	/// Wraps this node with a node built from `component`.
	///
	/// The new node takes our place in our parent, and we become it's last child.
	/// Returns the new node.
	pub fn try_decorate_up(&self, component: &Component) -> Result<Self, TreeError> {
		let tree = self.try_tree()?;
		let decorator = tree.decorate_up(self.key, component)?;
		Ok(tree.node(decorator))
	}

	/// Wraps this node with a node built from `component`.
	///
	/// See [`Node::try_decorate_up`].
	#[track_caller]
	pub fn decorate_up(&self, component: &Component) -> Self {
		self.try_decorate_up(component).or_panic()
	}

	/// Inserts a node built from `component` between us and our children.
	///
	/// The new node becomes our only child, and our previous children become it's
	/// last children. Returns the new node.
	pub fn try_decorate_down(&self, component: &Component) -> Result<Self, TreeError> {
		let tree = self.try_tree()?;
		let decorator = tree.decorate_down(self.key, component)?;
		Ok(tree.node(decorator))
	}

	/// Inserts a node built from `component` between us and our children.
	///
	/// See [`Node::try_decorate_down`].
	#[track_caller]
	pub fn decorate_down(&self, component: &Component) -> Self {
		self.try_decorate_down(component).or_panic()
	}

	/// Removes this node from between it's parent and it's children.
	///
	/// Our children take our place in our parent, and we're queued for freeing.
	pub fn try_undecorate(&self) -> Result<(), TreeError> {
		self.try_tree()?.undecorate(self.key)
	}

	/// Removes this node from between it's parent and it's children.
	///
	/// See [`Node::try_undecorate`].
	#[track_caller]
	pub fn undecorate(&self) {
		self.try_undecorate().or_panic();
	}

	/// Adds a callback for messages of type `M`, ran before our children's.
	#[track_caller]
	pub fn on<M, F>(&self, f: F)
	where
		M: 'static,
		F: Fn(&Self, &M) + 'static,
	{
		self.add_callback(CallbackKind::On, Box::new(f)).or_panic();
	}

	/// Adds a callback for messages of type `M`, ran after our children's.
	#[track_caller]
	pub fn after<M, F>(&self, f: F)
	where
		M: 'static,
		F: Fn(&Self, &M) + 'static,
	{
		self.add_callback(CallbackKind::After, Box::new(f)).or_panic();
	}

	/// Creates a reactive effect owned by this node.
	///
	/// The effect runs immediately, and then whenever any signal it read changes,
	/// until the node is freed.
	#[track_caller]
	pub fn effect<F>(&self, f: F) -> Scope
	where
		F: Fn() + 'static,
	{
		let scope = Scope::child_of(&self.scope(), f);
		scope.trigger();
		scope
	}

	/// Adds a cleanup, ran when this node is freed
	#[track_caller]
	pub fn on_cleanup<F>(&self, f: F)
	where
		F: FnOnce() + 'static,
	{
		self.scope().on_cleanup(f);
	}

	/// Returns a singleton of our tree
	#[must_use]
	#[track_caller]
	pub fn use_singleton<T: 'static>(&self) -> Rc<T> {
		self.tree().use_singleton()
	}

	/// Uses the data of this node
	pub(crate) fn with_data<F, O>(&self, f: F) -> Result<O, TreeError>
	where
		F: FnOnce(&data::NodeData) -> O,
	{
		let tree = self.try_tree()?;
		let nodes = tree.nodes().borrow();
		let data = nodes
			.get(self.key)
			.ok_or(TreeError::AlreadyFreed { node: self.key })?;

		Ok(f(data))
	}

	/// Adds a callback
	fn add_callback<M: 'static>(
		&self,
		kind: CallbackKind,
		callback: Box<Callback<M>>,
	) -> Result<(), TreeError> {
		let tree = self.try_tree()?;
		let mut nodes = tree.nodes().borrow_mut();
		let data = nodes
			.get_mut(self.key)
			.ok_or(TreeError::AlreadyFreed { node: self.key })?;
		data.callbacks.add(kind, callback);

		Ok(())
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key && self.tree.ptr_eq(&other.tree)
	}
}

impl Eq for Node {}

impl Hash for Node {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.key.hash(state);
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("Node");
		s.field("key", &self.key);
		if let Some(tree) = self.tree.upgrade() {
			if let Ok(nodes) = tree.nodes().try_borrow() {
				if let Some(data) = nodes.get(self.key) {
					s.field("name", &data.name)
						.field("state", &data.state)
						.field("mounted", &data.mounted);
				}
			}
		}
		s.finish_non_exhaustive()
	}
}
