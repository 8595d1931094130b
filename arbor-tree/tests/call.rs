//! Call and update tests

// Imports
use {
	arbor_tree::{Component, Node, NodeState, Tree, TreeError},
	core::cell::RefCell,
	std::rc::Rc,
};

/// Message
struct Tick;

/// Creates a chain of a parent and a child, logging `[1, 2, 3, 4]` when called with [`Tick`]
fn chain(log: &Rc<RefCell<Vec<usize>>>) -> Component {
	let logger = |value: usize| {
		let log = Rc::clone(log);
		move |_: &Node, _: &Tick| log.borrow_mut().push(value)
	};

	let child = Component::named("child", {
		let (on, after) = (logger(2), logger(3));
		move |node: &Node| {
			node.on::<Tick, _>(on.clone());
			node.after::<Tick, _>(after.clone());
		}
	});

	let (on, after) = (logger(1), logger(4));
	Component::named("parent", move |node: &Node| {
		node.on::<Tick, _>(on.clone());
		node.after::<Tick, _>(after.clone());
		child.clone()
	})
}

/// Ensures "on" callbacks run parent first, and "after" callbacks child first
#[test]
fn order() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Rc::new(RefCell::new(vec![]));
	tree.attach_to_root(&self::chain(&log));

	tree.call(&Tick);
	tree.update();
	assert_eq!(*log.borrow(), [1, 2, 3, 4]);
}

#[test]
fn queued() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Rc::new(RefCell::new(vec![]));
	tree.attach_to_root(&self::chain(&log));

	tree.queue_call(Tick);
	assert!(log.borrow().is_empty(), "Queued call ran before updating");

	tree.update();
	assert_eq!(*log.borrow(), [1, 2, 3, 4]);

	tree.update();
	assert_eq!(log.borrow().len(), 4, "Queued call ran twice");
}

#[test]
fn unmounted_not_called() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Rc::new(RefCell::new(vec![]));
	let node = tree.build(&self::chain(&log));

	tree.call(&Tick);
	assert!(log.borrow().is_empty(), "Unmounted node was called");

	tree.root().add_child(&node);
	tree.call(&Tick);
	assert_eq!(*log.borrow(), [1, 2, 3, 4]);
}

/// Ensures mounted nodes can't be restructured during a call, but may queue changes
#[test]
fn mutation_during_call() {
	arbor_logger::init();

	let tree = Tree::new();
	let results = Rc::new(RefCell::new(vec![]));
	let node = tree.attach_to_root(&Component::named("node", {
		let results = Rc::clone(&results);
		move |node: &Node| {
			let results = Rc::clone(&results);
			node.on::<Tick, _>(move |node, _| {
				results
					.borrow_mut()
					.push(node.try_create_child(&Component::empty()).map(|_| ()));
				node.queue_free();
			});
		}
	}));

	tree.call(&Tick);
	assert_eq!(*results.borrow(), [Err(TreeError::MutationDuringCall)]);
	assert_eq!(node.state(), NodeState::QueuedToDeletion);
	assert!(node.children().is_empty());

	tree.update();
	assert_eq!(node.state(), NodeState::Freed);

	// Once the call ends, nodes may be restructured again
	tree.root().create_child(&Component::empty());
}

/// Ensures update runs queued calls, then deferred actions, then frees
#[test]
fn update_order() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Rc::new(RefCell::new(vec![]));
	let node = tree.attach_to_root(&Component::named("node", {
		let log = Rc::clone(&log);
		move |node: &Node| {
			let log = Rc::clone(&log);
			node.on::<Tick, _>(move |_, _| log.borrow_mut().push("call"));
		}
	}));

	tree.call_deferred({
		let log = Rc::clone(&log);
		let node = node.clone();
		move |tree: &Tree| {
			log.borrow_mut().push("deferred");
			node.queue_free();

			// Note: Deferred during an update, so it runs on the next one
			let log = Rc::clone(&log);
			tree.call_deferred(move |_| log.borrow_mut().push("next"));
		}
	});
	tree.queue_call(Tick);
	node.on_cleanup({
		let log = Rc::clone(&log);
		move || log.borrow_mut().push("free")
	});

	tree.update();
	assert_eq!(*log.borrow(), ["call", "deferred", "free"]);

	tree.update();
	assert_eq!(*log.borrow(), ["call", "deferred", "free", "next"]);
}
