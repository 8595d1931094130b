//! Decoration
//!
//! Inserting and removing a generation of the tree, without rebuilding
//! the nodes around it.

// Imports
use {
	crate::{Component, NodeKey, Tree, TreeError},
	std::collections::HashMap,
};

impl Tree {
	/// Wraps a node with a node built from `component`, returning the new node
	pub(crate) fn decorate_up(&self, key: NodeKey, component: &Component) -> Result<NodeKey, TreeError> {
		let (parent, mounted) = self.with_node(key, |data| (data.parent, data.mounted))?;
		let parent = parent.ok_or(TreeError::NoParent { node: key })?;
		self.check_mutation(mounted)?;

		self.world().batch(|| {
			let decorator = self.build_node(component);
			self.with_node(decorator, |_| ())?;
			if mounted {
				let parents = HashMap::from([(decorator, parent), (key, decorator)]);
				if let Err(err) = self.check_enter(&[decorator, key], &parents) {
					self.free_node(decorator);
					return Err(err);
				}
			}

			tracing::trace!(?key, ?decorator, "Decorating node up");
			self.exit_tree(key);
			let index = self.unlink(key);
			self.link(parent, decorator, index);
			self.link(decorator, key, None);
			if mounted {
				self.enter_tree(decorator);
			}

			Ok(decorator)
		})
	}

	/// Inserts a node built from `component` between a node and it's children, returning the new node
	pub(crate) fn decorate_down(&self, key: NodeKey, component: &Component) -> Result<NodeKey, TreeError> {
		let (children, mounted) = self.with_node(key, |data| (data.children.clone(), data.mounted))?;
		self.check_mutation(mounted)?;

		self.world().batch(|| {
			let decorator = self.build_node(component);
			self.with_node(decorator, |_| ())?;
			if mounted {
				let roots = [decorator].into_iter().chain(children.iter().copied()).collect::<Vec<_>>();
				let parents = children
					.iter()
					.map(|&child| (child, decorator))
					.chain([(decorator, key)])
					.collect();
				if let Err(err) = self.check_enter(&roots, &parents) {
					self.free_node(decorator);
					return Err(err);
				}
			}

			tracing::trace!(?key, ?decorator, "Decorating node down");
			for &child in &children {
				self.exit_tree(child);
				self.unlink(child);
			}
			self.link(key, decorator, None);
			for &child in &children {
				self.link(decorator, child, None);
			}
			if mounted {
				self.enter_tree(decorator);
			}

			Ok(decorator)
		})
	}

	/// Removes a node from between it's parent and it's children, and queues it for freeing
	pub(crate) fn undecorate(&self, key: NodeKey) -> Result<(), TreeError> {
		let (parent, children, mounted) =
			self.with_node(key, |data| (data.parent, data.children.clone(), data.mounted))?;
		let parent = parent.ok_or(TreeError::NoParent { node: key })?;
		self.check_mutation(mounted)?;
		if mounted {
			let parents = children.iter().map(|&child| (child, parent)).collect();
			self.check_enter(&children, &parents)?;
		}

		tracing::trace!(?key, "Undecorating node");
		self.world().batch(|| {
			self.exit_tree(key);
			let index = self.unlink(key);
			for &child in &children {
				self.unlink(child);
			}
			for (offset, &child) in children.iter().enumerate() {
				self.link(parent, child, index.map(|index| index + offset));
			}
			if mounted {
				for &child in &children {
					self.enter_tree(child);
				}
			}
		});
		self.node(key).queue_free();

		Ok(())
	}
}
