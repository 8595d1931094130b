//! Keyed list children
//!
//! Each item of the list is identified by a key. When the list changes,
//! nodes of items whose key is kept are reused and moved into the new order,
//! nodes of removed items are freed, and nodes are only built for new items.

// Imports
use {
	super::Coalesce,
	crate::{Component, Node, NodeState, TreeError, error},
	arbor_reactive::{SignalGetCloned, SignalWith},
	core::{cell::RefCell, fmt, hash::Hash},
	itertools::Itertools,
	std::{
		collections::{HashMap, HashSet},
		rc::Rc,
	},
};

impl Component {
	/// Creates a component with a child for each item of `items`.
	///
	/// Each item is identified by `key`, and it's child built by `render`.
	///
	/// # Panics
	/// Panics if any two items have the same key.
	pub fn keyed_list<S, T, K, KF, R>(items: S, key: KF, render: R) -> Self
	where
		S: SignalWith<Value = Vec<T>> + 'static,
		T: Clone + 'static,
		K: Hash + Eq + fmt::Debug + 'static,
		KF: Fn(&T) -> K + 'static,
		R: Fn(&T) -> Component + 'static,
	{
		let list = Rc::new(List { items, key, render });
		Self::named("keyed_list", move |node| {
			// Note: Each node built from this component keeps it's own entries.
			let coalesce = Coalesce::new();
			let entries = Rc::new(Entries::<K>::default());
			let list = Rc::clone(&list);
			node.effect({
				let node = node.clone();
				move || {
					// Note: We only read it here to subscribe, the update
					//       itself reads the latest items.
					list.items.with(|_| ());

					let list = Rc::clone(&list);
					let entries = Rc::clone(&entries);
					coalesce.update(&node, move |node| {
						list.reconcile(node, &entries, &list.items.get_cloned_raw());
					});
				}
			});
		})
	}
}

/// Realized entries of a keyed list node, in order
type Entries<K> = RefCell<Vec<(K, Node)>>;

/// Keyed list
struct List<S, KF, R> {
	/// Items
	items: S,

	/// Key getter
	key: KF,

	/// Renderer
	render: R,
}

impl<S, KF, R> List<S, KF, R> {
	/// Reconciles the children of `node`, currently `entries`, with `items`
	#[track_caller]
	fn reconcile<T, K>(&self, node: &Node, entries: &Entries<K>, items: &[T])
	where
		K: Hash + Eq + fmt::Debug,
		KF: Fn(&T) -> K,
		R: Fn(&T) -> Component,
	{
		let keys = items.iter().map(&self.key).collect::<Vec<_>>();
		if let Some(key) = keys.iter().duplicates().next() {
			error::on_tree_error(&TreeError::DuplicateKey { key: format!("{key:?}") });
		}

		// Free all removed entries first, and keep the rest.
		// Note: Entries whose node was freed by someone else are rebuilt.
		let new_keys = keys.iter().collect::<HashSet<_>>();
		let mut kept = HashMap::new();
		for (key, child) in entries.take() {
			if new_keys.contains(&key) && child.state() != NodeState::Freed {
				kept.insert(key, child);
			} else {
				child.safe_free();
			}
		}

		let kept_len = kept.len();
		let new_entries = items
			.iter()
			.zip(keys)
			.map(|(item, key)| {
				let child = kept
					.remove(&key)
					.unwrap_or_else(|| node.create_child(&(self.render)(item)));
				(key, child)
			})
			.collect::<Vec<_>>();
		tracing::trace!(?node, kept=kept_len, total=new_entries.len(), "Reconciled keyed list");

		let children = new_entries.iter().map(|(_, child)| child.clone()).collect::<Vec<_>>();
		node.arrange_children(&children);
		*entries.borrow_mut() = new_entries;
	}
}
