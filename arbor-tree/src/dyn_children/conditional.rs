//! Conditional children

// Imports
use {
	super::Coalesce,
	crate::{Component, IntoChildren, Node},
	arbor_reactive::{SignalGet, SignalWith},
	core::cell::Cell,
	std::rc::Rc,
};

impl Component {
	/// Creates a component whose children only exist while `cond` is true.
	///
	/// When `cond` becomes true, the children are built, and when it becomes
	/// false, they're freed.
	pub fn conditional<S, C>(cond: S, children: C) -> Self
	where
		S: SignalWith<Value = bool> + 'static,
		C: IntoChildren,
	{
		let cond = Rc::new(cond);
		let children = Rc::new(children.into_children());
		Self::named("conditional", move |node| {
			let shown = Rc::new(Cell::new(false));
			let coalesce = Coalesce::new();

			let cond = Rc::clone(&cond);
			let children = Rc::clone(&children);
			node.effect({
				let node = node.clone();
				move || {
					// Note: We only read it here to subscribe, the update
					//       itself reads the latest value.
					_ = cond.get();

					let cond = Rc::clone(&cond);
					let children = Rc::clone(&children);
					let shown = Rc::clone(&shown);
					coalesce.update(&node, move |node| self::sync(node, &shown, cond.get_raw(), &children));
				}
			});
		})
	}
}

/// Builds or frees the children of `node`
fn sync(node: &Node, shown: &Cell<bool>, show: bool, children: &[Component]) {
	if shown.replace(show) == show {
		return;
	}

	tracing::trace!(?node, show, "Updating conditional children");
	if show {
		for child in children {
			node.create_child(child);
		}
	} else {
		for child in node.children() {
			child.safe_free();
		}
	}
}
