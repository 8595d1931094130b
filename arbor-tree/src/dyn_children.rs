//! Dynamic children
//!
//! Components whose children change with a signal.
//!
//! The first value is applied immediately, while the node is built. Every
//! later change is deferred to the next update, since the tree may not be
//! restructured while a signal is still notifying it's subscribers. Any
//! changes before that update are coalesced, and only the latest value is
//! applied.

// Modules
pub mod conditional;
pub mod keyed_list;

// Imports
use {
	crate::{Node, NodeState},
	core::cell::Cell,
	std::rc::Rc,
};

/// Coalesces the updates of a dynamic node
#[derive(Debug)]
struct Coalesce {
	/// Whether the next update is the first one
	first: Cell<bool>,

	/// Whether an update is pending
	pending: Cell<bool>,
}

impl Coalesce {
	/// Creates a new coalescer
	fn new() -> Rc<Self> {
		Rc::new(Self {
			first:   Cell::new(true),
			pending: Cell::new(false),
		})
	}

	/// Updates `node` with `f`.
	///
	/// The first update runs immediately. Later updates are deferred to
	/// the next tree update, unless one is already pending.
	fn update<F>(self: &Rc<Self>, node: &Node, f: F)
	where
		F: FnOnce(&Node) + 'static,
	{
		let Ok(tree) = node.try_tree() else {
			return;
		};
		if self.first.replace(false) {
			// Note: Whatever the children read while being built mustn't
			//       be tracked by the effect updating them.
			tree.world().untrack(|| f(node));
			return;
		}

		if self.pending.replace(true) {
			return;
		}

		let this = Rc::clone(self);
		let node = node.clone();
		tree.call_deferred(move |_| {
			this.pending.set(false);
			if node.state() == NodeState::Freed {
				tracing::warn!(?node, "Dynamic node was freed before it could be updated");
				return;
			}

			f(&node);
		});
	}
}
