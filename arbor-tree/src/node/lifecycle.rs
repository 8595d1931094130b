//! Node lifecycle
//!
//! Building, attaching, mounting and freeing nodes.
//!
//! Every operation here checks all of it's preconditions before mutating
//! anything. User code (component bodies, effects, cleanups) is never ran
//! while the nodes are borrowed.

// Imports
use {
	super::data::NodeData,
	crate::{
		Component,
		NodeKey,
		NodeState,
		Tree,
		TreeError,
		context,
		error::TreeResultExt,
	},
	itertools::Itertools,
	std::{
		collections::{HashMap, HashSet},
		rc::Rc,
	},
};

impl Tree {
	/// Builds a component into a new node, along with all of it's children.
	///
	/// The node's body runs untracked within the node's scope. Children are
	/// only attached once built, and nothing is mounted.
	///
	/// If the body frees the node, it's children aren't built.
	pub(crate) fn build_node(&self, component: &Component) -> NodeKey {
		let data = NodeData::new(self.world(), component.name().map(str::to_owned));
		let scope = data.scope.clone();
		let key = self.nodes().borrow_mut().insert(data);
		let node = self.node(key);
		if let Some(name) = component.name() {
			scope.set_name(name);
		}

		tracing::trace!(?key, name=?component.name(), "Building node");
		let children = scope.run_in(|| scope.untrack(|| component.run(&node)));
		if !self.is_alive(key) {
			tracing::debug!(?key, "Node was freed while building, skipping it's children");
			return key;
		}

		for child in &children {
			let child = self.build_node(child);
			if self.is_alive(child) {
				self.link(key, child, None);
			}
		}

		if let Some(data) = self.nodes().borrow_mut().get_mut(key) {
			if data.state == NodeState::Building {
				data.state = NodeState::Built;
			}
		}

		key
	}

	/// Builds `component` into a new child of `parent`, and mounts it if `parent` is mounted
	pub(crate) fn create_child(&self, parent: NodeKey, component: &Component) -> Result<NodeKey, TreeError> {
		let mounted = self.with_node(parent, |data| data.mounted)?;
		self.check_mutation(mounted)?;

		self.world().batch(|| {
			let child = self.build_node(component);
			self.with_node(child, |_| ())?;
			if mounted {
				if let Err(err) = self.check_enter(&[child], &HashMap::from([(child, parent)])) {
					self.free_node(child);
					return Err(err);
				}
			}

			self.link(parent, child, None);
			if mounted {
				self.enter_tree(child);
			}

			Ok(child)
		})
	}

	/// Attaches `child` to `parent`, at `index`, or at the end.
	///
	/// If `parent` is mounted, `child` is mounted.
	pub(crate) fn attach(&self, parent: NodeKey, child: NodeKey, index: Option<usize>) -> Result<(), TreeError> {
		let mounted = {
			let nodes = self.nodes().borrow();
			let parent_data = nodes.get(parent).ok_or(TreeError::AlreadyFreed { node: parent })?;
			let child_data = nodes.get(child).ok_or(TreeError::AlreadyFreed { node: child })?;
			if child_data.parent.is_some() || child == self.hidden_root() {
				return Err(TreeError::AlreadyHasParent { node: child });
			}
			if child_data.state == NodeState::Building {
				return Err(TreeError::StillBuilding { node: child });
			}

			let mut cur = Some(parent);
			while let Some(key) = cur {
				if key == child {
					return Err(TreeError::WouldCycle { node: child });
				}
				cur = nodes.get(key).and_then(|data| data.parent);
			}

			parent_data.mounted
		};
		self.check_mutation(mounted)?;
		if mounted {
			self.check_enter(&[child], &HashMap::from([(child, parent)]))?;
		}

		self.link(parent, child, index);
		if mounted {
			self.world().batch(|| self.enter_tree(child));
		}

		Ok(())
	}

	/// Detaches `child` from `parent`, unmounting it first
	pub(crate) fn detach(&self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
		let mounted = {
			let nodes = self.nodes().borrow();
			if !nodes.contains_key(parent) {
				return Err(TreeError::AlreadyFreed { node: parent });
			}
			let child_data = nodes.get(child).ok_or(TreeError::AlreadyFreed { node: child })?;
			if child_data.parent != Some(parent) {
				return Err(TreeError::NotAChild { parent, child });
			}

			child_data.mounted
		};
		self.check_mutation(mounted)?;

		self.world().batch(|| self.exit_tree(child));
		self.unlink(child);

		Ok(())
	}

	/// Reorders the children of `parent`
	pub(crate) fn arrange(&self, parent: NodeKey, children: Vec<NodeKey>) -> Result<(), TreeError> {
		let mut nodes = self.nodes().borrow_mut();
		let data = nodes.get(parent).ok_or(TreeError::AlreadyFreed { node: parent })?;
		self.check_mutation(data.mounted)?;

		if let Some(&child) = children.iter().duplicates().next() {
			return Err(TreeError::AlreadyHasParent { node: child });
		}
		let cur_children = data.children.iter().copied().collect::<HashSet<_>>();
		let new_children = children.iter().copied().collect::<HashSet<_>>();
		if let Some(&child) = new_children.symmetric_difference(&cur_children).next() {
			return Err(TreeError::NotAChild { parent, child });
		}

		if let Some(data) = nodes.get_mut(parent) {
			data.children = children;
		}

		Ok(())
	}

	/// Frees a node and all of it's children
	pub(crate) fn free(&self, key: NodeKey) -> Result<(), TreeError> {
		let mounted = self.with_node(key, |data| data.mounted)?;
		self.check_mutation(mounted)?;

		self.world().batch(|| self.free_node(key));
		Ok(())
	}

	/// Frees a node and all of it's children, without any checks.
	///
	/// Unmounts this node only, then disposes of it's scope and detaches it,
	/// and only then frees each child.
	pub(crate) fn free_node(&self, key: NodeKey) {
		let (scope, children) = {
			let mut nodes = self.nodes().borrow_mut();
			let Some(data) = nodes.get_mut(key) else {
				return;
			};
			if data.state == NodeState::Freed {
				return;
			}
			data.state = NodeState::Freed;

			(data.scope.clone(), data.children.clone())
		};

		tracing::trace!(?key, "Freeing node");
		_ = self.exit_node(key);
		scope.dispose();
		self.unlink(key);
		for child in children {
			self.free_node(child);
		}

		// Note: The data must be dropped after the borrow ends, since
		//       dropping it may drop user values.
		let data = self.nodes().borrow_mut().remove(key);
		drop(data);
	}

	/// Mounts a node and all of it's children.
	///
	/// Registers the id, initializes all context readers, then mounts all
	/// lifecycle effects, before mounting the children.
	pub(crate) fn enter_tree(&self, key: NodeKey) {
		let (id, readers, effects, children) = {
			let mut nodes = self.nodes().borrow_mut();
			let Some(data) = nodes.get_mut(key) else {
				return;
			};
			if data.mounted {
				return;
			}
			data.mounted = true;

			let data = &nodes[key];
			let readers = data
				.readers
				.iter()
				.map(|reader| {
					let slot = context::lookup(&nodes, data.parent, reader.context_type(), &HashMap::new())
						.ok_or(TreeError::MissingContext {
							node: key,
							ty:   reader.context_name(),
						})
						.or_panic();
					(Rc::clone(reader), slot)
				})
				.collect::<Vec<_>>();

			(data.id.clone(), readers, data.effects.clone(), data.children.clone())
		};

		tracing::trace!(?key, "Entering tree");
		if let Some(id) = id {
			self.register_id(key, id).or_panic();
		}
		for (reader, slot) in readers {
			reader.init(slot);
		}
		for effect in effects {
			effect.mount();
		}
		for child in children {
			self.enter_tree(child);
		}
	}

	/// Unmounts a node and all of it's children
	pub(crate) fn exit_tree(&self, key: NodeKey) {
		for child in self.exit_node(key) {
			self.exit_tree(child);
		}
	}

	/// Unmounts a node, but not it's children.
	///
	/// Unmounts all lifecycle effects, then uninitializes all context readers,
	/// then deregisters the id. Returns the children, if the node was mounted.
	pub(crate) fn exit_node(&self, key: NodeKey) -> Vec<NodeKey> {
		let (id, readers, effects, children) = {
			let mut nodes = self.nodes().borrow_mut();
			let Some(data) = nodes.get_mut(key) else {
				return vec![];
			};
			if !data.mounted {
				return vec![];
			}
			data.mounted = false;

			(
				data.id.clone(),
				data.readers.clone(),
				data.effects.clone(),
				data.children.clone(),
			)
		};

		tracing::trace!(?key, "Exiting tree");
		for effect in effects {
			effect.unmount();
		}
		for reader in readers {
			reader.uninit();
		}
		if let Some(id) = id {
			let mut ids = self.ids().borrow_mut();
			if ids.get(&id) == Some(&key) {
				ids.remove(&id);
			}
		}

		children
	}

	/// Sets the id of a node, registering it if mounted
	pub(crate) fn set_id(&self, key: NodeKey, id: String) -> Result<(), TreeError> {
		let (mounted, prev_id) = self.with_node(key, |data| (data.mounted, data.id.clone()))?;
		if mounted {
			self.register_id(key, id.clone())?;
			if let Some(prev_id) = prev_id.filter(|prev_id| *prev_id != id) {
				self.ids().borrow_mut().remove(&prev_id);
			}
		}

		if let Some(data) = self.nodes().borrow_mut().get_mut(key) {
			data.id = Some(id);
		}

		Ok(())
	}

	/// Registers the id of a node
	fn register_id(&self, key: NodeKey, id: String) -> Result<(), TreeError> {
		let mut ids = self.ids().borrow_mut();
		match ids.get(&id) {
			Some(&owner) if owner != key => Err(TreeError::DuplicateId { id }),
			_ => {
				ids.insert(id, key);
				Ok(())
			},
		}
	}

	/// Checks that the subtrees of `roots` may be mounted.
	///
	/// `parents` overrides the parents of any nodes, for nodes that are about to be moved.
	///
	/// Checks that no ids are taken, and that every context reader has a provider.
	pub(crate) fn check_enter(&self, roots: &[NodeKey], parents: &HashMap<NodeKey, NodeKey>) -> Result<(), TreeError> {
		let nodes = self.nodes().borrow();
		let ids = self.ids().borrow();

		let mut seen_ids = HashSet::new();
		let mut stack = roots.to_vec();
		while let Some(key) = stack.pop() {
			let Some(data) = nodes.get(key) else {
				continue;
			};

			if let Some(id) = &data.id {
				let taken = ids.get(id).is_some_and(|&owner| owner != key);
				if taken || !seen_ids.insert(id.as_str()) {
					return Err(TreeError::DuplicateId { id: id.clone() });
				}
			}

			let parent = parents.get(&key).copied().or(data.parent);
			for reader in &data.readers {
				if context::lookup(&nodes, parent, reader.context_type(), parents).is_none() {
					return Err(TreeError::MissingContext {
						node: key,
						ty:   reader.context_name(),
					});
				}
			}

			stack.extend(&data.children);
		}

		Ok(())
	}

	/// Links `child` under `parent`, at `index`, or at the end
	pub(crate) fn link(&self, parent: NodeKey, child: NodeKey, index: Option<usize>) {
		let mut nodes = self.nodes().borrow_mut();
		if let Some(parent_data) = nodes.get_mut(parent) {
			let index = index.map_or(parent_data.children.len(), |index| {
				index.min(parent_data.children.len())
			});
			parent_data.children.insert(index, child);
		}
		if let Some(child_data) = nodes.get_mut(child) {
			child_data.parent = Some(parent);
		}
	}

	/// Unlinks a node from it's parent.
	///
	/// Returns the index it was at.
	pub(crate) fn unlink(&self, child: NodeKey) -> Option<usize> {
		let mut nodes = self.nodes().borrow_mut();
		let parent = nodes.get_mut(child)?.parent.take()?;
		let parent_data = nodes.get_mut(parent)?;
		let index = parent_data.children.iter().position(|&cur| cur == child)?;
		parent_data.children.remove(index);

		Some(index)
	}

	/// Uses the data of a node
	pub(crate) fn with_node<F, O>(&self, key: NodeKey, f: F) -> Result<O, TreeError>
	where
		F: FnOnce(&NodeData) -> O,
	{
		let nodes = self.nodes().borrow();
		let data = nodes.get(key).ok_or(TreeError::AlreadyFreed { node: key })?;
		if data.state == NodeState::Freed {
			return Err(TreeError::AlreadyFreed { node: key });
		}

		Ok(f(data))
	}
}
