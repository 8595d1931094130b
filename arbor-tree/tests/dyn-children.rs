//! Dynamic children tests

// Imports
use {
	arbor_reactive::{Signal, SignalSet},
	arbor_tree::{Component, Node, NodeState, Tree},
	core::cell::{Cell, RefCell},
	std::rc::Rc,
};

#[test]
fn conditional() {
	arbor_logger::init();

	let tree = Tree::new();
	let show = Signal::new(tree.world(), false);
	let builds = Rc::new(Cell::new(0_usize));
	let child = Component::named("child", {
		let builds = Rc::clone(&builds);
		move |_: &Node| builds.set(builds.get() + 1)
	});
	let node = tree.attach_to_root(&Component::conditional(show.clone(), child));
	assert!(node.children().is_empty());

	show.set(true);
	assert!(node.children().is_empty(), "Conditional changed before updating");

	tree.update();
	assert_eq!(node.children().len(), 1);
	assert!(node.children()[0].is_mounted());
	assert_eq!(builds.get(), 1);

	show.set(false);
	tree.update();
	assert!(node.children().is_empty());
}

/// Ensures multiple changes before an update are coalesced into the latest one
#[test]
fn conditional_coalesce() {
	arbor_logger::init();

	let tree = Tree::new();
	let show = Signal::new(tree.world(), true);
	let builds = Rc::new(Cell::new(0_usize));
	let child = Component::named("child", {
		let builds = Rc::clone(&builds);
		move |_: &Node| builds.set(builds.get() + 1)
	});
	let node = tree.attach_to_root(&Component::conditional(show.clone(), child));
	assert_eq!(node.children().len(), 1);
	let first = node.children()[0].clone();

	show.set(false);
	show.set(true);
	show.set(false);
	show.set(true);
	tree.update();
	assert_eq!(node.children(), [first.clone()], "Child was rebuilt");
	assert_eq!(builds.get(), 1);

	show.set(false);
	show.set(true);
	show.set(false);
	tree.update();
	assert!(node.children().is_empty());
	assert_eq!(first.state(), NodeState::Freed);
}

#[test]
fn conditional_freed() {
	arbor_logger::init();

	let tree = Tree::new();
	let show = Signal::new(tree.world(), false);
	let node = tree.attach_to_root(&Component::conditional(show.clone(), Component::empty()));

	show.set(true);
	node.free();
	tree.update();
	assert_eq!(tree.len(), 2);
}

/// Ensures kept keys reuse their nodes, removed keys are freed and new keys are built
#[test]
fn keyed_list() {
	arbor_logger::init();

	let tree = Tree::new();
	let items = Signal::new(tree.world(), vec!['a', 'b', 'c']);
	let built = Rc::new(RefCell::new(vec![]));
	let list = Component::keyed_list(items.clone(), |&item: &char| item, {
		let built = Rc::clone(&built);
		move |&item: &char| {
			built.borrow_mut().push(item);
			Component::named(item.to_string(), |_| ())
		}
	});
	let node = tree.attach_to_root(&list);
	let names = || {
		node.children()
			.iter()
			.map(|child| child.name().unwrap_or_default())
			.collect::<Vec<_>>()
	};
	assert_eq!(names(), ["a", "b", "c"]);

	let [a, b, c] = <[Node; 3]>::try_from(node.children()).expect("List should have 3 children");
	items.set(vec!['c', 'a', 'd']);
	tree.update();

	assert_eq!(names(), ["c", "a", "d"]);
	let children = node.children();
	assert_eq!(children[0], c, "Node of `c` was rebuilt");
	assert_eq!(children[1], a, "Node of `a` was rebuilt");
	assert_eq!(b.state(), NodeState::Freed);
	assert!(children[2].is_mounted());
	assert_eq!(*built.borrow(), ['a', 'b', 'c', 'd']);
}

#[test]
fn keyed_list_shared() {
	arbor_logger::init();

	let tree = Tree::new();
	let items = Signal::new(tree.world(), vec![1_u32, 2]);
	let list = Component::keyed_list(items.clone(), |&item: &u32| item, |_: &u32| Component::empty());
	let lhs = tree.attach_to_root(&list);
	let rhs = tree.attach_to_root(&list);
	assert_eq!(lhs.children().len(), 2);
	assert_eq!(rhs.children().len(), 2);

	let lhs_first = lhs.children()[0].clone();
	let rhs_first = rhs.children()[0].clone();
	assert_ne!(lhs_first, rhs_first, "Both lists share their children");

	items.set(vec![2, 1, 3]);
	tree.update();
	for node in [&lhs, &rhs] {
		assert_eq!(node.children().len(), 3);
		assert!(node.children().iter().all(|child| child.parent().as_ref() == Some(node)));
	}
	assert_eq!(lhs.children()[1], lhs_first, "Kept item was rebuilt");
	assert_eq!(rhs.children()[1], rhs_first, "Kept item was rebuilt");
}

#[test]
fn keyed_list_empty() {
	arbor_logger::init();

	let tree = Tree::new();
	let items = Signal::new(tree.world(), vec![1_u32, 2, 3]);
	let list = Component::keyed_list(items.clone(), |&item: &u32| item, |_: &u32| Component::empty());
	let node = tree.attach_to_root(&list);
	assert_eq!(node.children().len(), 3);

	items.set(vec![]);
	tree.update();
	assert!(node.children().is_empty());
	assert_eq!(tree.len(), 3);

	items.set(vec![4]);
	tree.update();
	assert_eq!(node.children().len(), 1);
}

#[test]
#[should_panic = "Duplicate key"]
fn keyed_list_duplicate() {
	arbor_logger::init();

	let tree = Tree::new();
	let items = Signal::new(tree.world(), vec!['a', 'b', 'a']);
	let list = Component::keyed_list(items, |&item: &char| item, |_: &char| Component::empty());
	tree.attach_to_root(&list);
}
