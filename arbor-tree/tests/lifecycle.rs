//! Node lifecycle tests

// Imports
use {
	arbor_reactive::{Dependency, Signal, SignalGet, SignalSet},
	arbor_tree::{Component, Node, NodeState, Tree, TreeError},
	core::cell::{Cell, RefCell},
	std::rc::Rc,
};

/// Creates a component that counts how many times it's cleaned up
fn counted(name: &str, cleanups: &Rc<Cell<usize>>) -> Component {
	let cleanups = Rc::clone(cleanups);
	Component::named(name, move |node: &Node| {
		let cleanups = Rc::clone(&cleanups);
		node.on_cleanup(move || cleanups.set(cleanups.get() + 1));
	})
}

#[test]
fn add_remove() {
	arbor_logger::init();

	let tree = Tree::new();
	let node = tree.build(&Component::named("node", |_| ()));
	assert_eq!(node.state(), NodeState::Built);
	assert!(!node.is_mounted());

	tree.root().add_child(&node);
	assert!(node.is_mounted());
	assert_eq!(node.parent(), Some(tree.root()));

	tree.root().remove_child(&node);
	assert!(!node.is_mounted(), "Removed node is still mounted");
	assert_eq!(node.parent(), None);
	assert_eq!(node.state(), NodeState::Built, "Removing a node freed it");
	assert!(tree.root().children().is_empty());

	node.free();
	assert_eq!(node.state(), NodeState::Freed);
}

#[test]
fn already_has_parent() {
	arbor_logger::init();

	let tree = Tree::new();
	let parent = tree.attach_to_root(&Component::named("parent", |_| ()));
	let node = tree.attach_to_root(&Component::named("node", |_| ()));

	assert_eq!(
		parent.try_add_child(&node),
		Err(TreeError::AlreadyHasParent { node: node.key() })
	);
	assert_eq!(node.parent(), Some(tree.root()), "Failed add changed the parent");
	assert!(parent.children().is_empty());
}

#[test]
fn would_cycle() {
	arbor_logger::init();

	let tree = Tree::new();
	let node = tree.build(&Component::named("node", |_| Component::named("child", |_| ())));
	let child = node.children()[0].clone();

	assert_eq!(child.try_add_child(&node), Err(TreeError::WouldCycle { node: node.key() }));
	assert_eq!(node.parent(), None);
}

#[test]
fn build_before_mount() {
	arbor_logger::init();

	let log = Rc::new(RefCell::new(vec![]));
	let component = |name: &'static str, children: Vec<Component>| {
		let log = Rc::clone(&log);
		Component::named(name, move |node: &Node| {
			log.borrow_mut().push(format!("build {name}"));
			node.use_effect((), {
				let log = Rc::clone(&log);
				move || log.borrow_mut().push(format!("mount {name}"))
			});
			children.clone()
		})
	};

	let tree = Tree::new();
	let grandchild = component("grandchild", vec![]);
	let child = component("child", vec![grandchild]);
	let parent = component("parent", vec![child]);
	tree.attach_to_root(&parent);

	assert_eq!(*log.borrow(), [
		"build parent",
		"build child",
		"build grandchild",
		"mount parent",
		"mount child",
		"mount grandchild",
	]);
}

#[test]
fn free() {
	arbor_logger::init();

	let tree = Tree::new();
	let cleanups = Rc::new(Cell::new(0));
	let node = tree.attach_to_root(&counted("node", &cleanups));
	let child = node.create_child(&counted("child", &cleanups));

	node.free();
	assert_eq!(node.state(), NodeState::Freed);
	assert_eq!(child.state(), NodeState::Freed, "Child wasn't freed with it's parent");
	assert_eq!(cleanups.get(), 2);
	assert!(tree.root().children().is_empty());
	assert_eq!(tree.len(), 2, "Freed nodes are still in the tree");

	assert_eq!(node.try_free(), Err(TreeError::AlreadyFreed { node: node.key() }));
	node.safe_free();
	assert_eq!(cleanups.get(), 2, "Freeing twice ran the cleanups again");
}

/// Ensures queued frees only happen on update, and exactly once
#[test]
fn queue_free() {
	arbor_logger::init();

	let tree = Tree::new();
	let cleanups = Rc::new(Cell::new(0));
	let node = tree.attach_to_root(&counted("node", &cleanups));

	node.queue_free();
	node.queue_free();
	assert_eq!(node.state(), NodeState::QueuedToDeletion);
	assert_eq!(node.parent(), Some(tree.root()), "Queued node was detached before updating");
	assert_eq!(tree.root().children(), [node.clone()]);
	assert_eq!(cleanups.get(), 0);

	tree.update();
	assert_eq!(node.state(), NodeState::Freed);
	assert_eq!(cleanups.get(), 1, "Cleanup didn't run exactly once");
	assert!(tree.root().children().is_empty());
}

#[test]
fn queue_free_after_parent_freed() {
	arbor_logger::init();

	let tree = Tree::new();
	let cleanups = Rc::new(Cell::new(0));
	let node = tree.attach_to_root(&counted("node", &cleanups));
	let child = node.create_child(&counted("child", &cleanups));

	child.queue_free();
	node.free();
	tree.update();
	assert_eq!(child.state(), NodeState::Freed);
	assert_eq!(cleanups.get(), 2);
}

#[test]
fn ids() {
	arbor_logger::init();

	let tree = Tree::new();
	let node = tree.attach_to_root(&Component::new(|node: &Node| node.set_id("node")));
	assert_eq!(tree.node_by_id("node"), Some(node.clone()));

	let duplicate = tree
		.root()
		.try_create_child(&Component::new(|node: &Node| node.set_id("node")));
	assert_eq!(duplicate, Err(TreeError::DuplicateId { id: "node".to_owned() }));
	assert_eq!(tree.len(), 3, "Failed child wasn't freed");

	tree.root().remove_child(&node);
	assert_eq!(tree.node_by_id("node"), None, "Unmounted node kept it's id");

	tree.root().add_child(&node);
	assert_eq!(tree.node_by_id("node"), Some(node.clone()));

	node.set_id("other");
	assert_eq!(tree.node_by_id("node"), None);
	assert_eq!(tree.node_by_id("other"), Some(node.clone()));

	node.free();
	assert_eq!(tree.node_by_id("other"), None, "Freed node kept it's id");
}

#[test]
fn insert_arrange() {
	arbor_logger::init();

	let tree = Tree::new();
	let root = tree.root();
	let a = tree.attach_to_root(&Component::named("a", |_| ()));
	let b = tree.attach_to_root(&Component::named("b", |_| ()));
	let c = tree.build(&Component::named("c", |_| ()));

	root.insert_child(1, &c);
	assert_eq!(root.children(), [a.clone(), c.clone(), b.clone()]);

	root.arrange_children(&[b.clone(), a.clone(), c.clone()]);
	assert_eq!(root.children(), [b.clone(), a.clone(), c.clone()]);

	assert_eq!(
		root.try_arrange_children(&[a.clone(), b.clone()]),
		Err(TreeError::NotAChild {
			parent: root.key(),
			child:  c.key(),
		})
	);
	assert_eq!(root.children(), [b, a, c], "Failed arrange changed the children");
}

#[test]
fn singletons() {
	arbor_logger::init();

	let tree = Tree::new();
	assert_eq!(tree.set_singleton(5_u32), None);
	assert_eq!(tree.root().use_singleton::<u32>(), Rc::new(5));
	assert_eq!(tree.set_singleton(6_u32), Some(Rc::new(5)));
	assert_eq!(tree.try_singleton::<i64>(), None);
}

#[test]
#[should_panic = "was never set"]
fn missing_singleton() {
	arbor_logger::init();

	let tree = Tree::new();
	_ = tree.use_singleton::<i64>();
}

#[test]
fn shutdown() {
	arbor_logger::init();

	let tree = Tree::new();
	let cleanups = Rc::new(Cell::new(0));
	let node = tree.attach_to_root(&counted("node", &cleanups));
	node.create_child(&counted("child", &cleanups));
	let queued = tree.attach_to_root(&counted("queued", &cleanups));
	queued.queue_free();

	tree.shutdown();
	assert_eq!(cleanups.get(), 3);
	assert_eq!(tree.root().state(), NodeState::Freed);
	assert_eq!(tree.len(), 1, "Only the hidden root should remain");
}

#[test]
fn add_while_building() {
	arbor_logger::init();

	let tree = Tree::new();
	let res = Rc::new(RefCell::new(None));
	let node = tree.build(&Component::named("node", {
		let res = Rc::clone(&res);
		move |node: &Node| {
			*res.borrow_mut() = Some(node.tree().root().try_add_child(node));
			Component::named("child", |_| ())
		}
	}));
	assert_eq!(
		res.take(),
		Some(Err(TreeError::StillBuilding { node: node.key() })),
		"Node was added while building"
	);
	assert!(!node.is_mounted());
	assert_eq!(node.parent(), None);

	tree.root().add_child(&node);
	let [child] = <[Node; 1]>::try_from(node.children()).expect("Node should have 1 child");
	assert!(node.is_mounted());
	assert!(child.is_mounted(), "Child wasn't mounted with it's parent");
}

#[test]
fn free_while_building() {
	arbor_logger::init();

	let tree = Tree::new();
	let len = tree.len();
	let builds = Rc::new(Cell::new(0_usize));
	let child = Component::named("child", {
		let builds = Rc::clone(&builds);
		move |_: &Node| builds.set(builds.get() + 1)
	});
	let node = tree.build(&Component::named("node", move |node: &Node| {
		node.free();
		child.clone()
	}));

	assert_eq!(node.state(), NodeState::Freed);
	assert_eq!(builds.get(), 0, "Children of a freed node were built");
	assert_eq!(tree.len(), len, "Nodes leaked");
}

#[test]
fn body_reads_untracked() {
	arbor_logger::init();

	let tree = Tree::new();
	let signal = Signal::new(tree.world(), 0_usize);
	let runs = Rc::new(Cell::new(0_usize));
	let node = tree.attach_to_root(&Component::named("node", {
		let signal = signal.clone();
		let runs = Rc::clone(&runs);
		move |_: &Node| {
			_ = signal.get();
			runs.set(runs.get() + 1);
		}
	}));
	assert_eq!(node.scope().dep_count(), 0, "Node scope subscribed to a read in the body");

	signal.set(1);
	tree.update();
	assert_eq!(runs.get(), 1, "Body re-ran");
}

#[test]
fn effect_reinit_scopes() {
	arbor_logger::init();

	let tree = Tree::new();
	let dep = Dependency::new();
	let inits = Rc::new(Cell::new(0_usize));
	let node = tree.attach_to_root(&Component::named("node", |_| ()));
	node.use_effect(&dep, {
		let inits = Rc::clone(&inits);
		move || inits.set(inits.get() + 1)
	});

	let scopes = node.scope().child_count();
	for _ in 0..100 {
		dep.change(|| ());
	}
	assert_eq!(inits.get(), 101);
	assert_eq!(node.scope().child_count(), scopes, "Re-initializing left scopes behind");
}
