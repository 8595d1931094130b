//! Context and lifecycle effect tests

// Imports
use {
	arbor_reactive::{Dependency, Signal, SignalGet, SignalSet},
	arbor_tree::{Component, Node, NodeState, Tree, TreeError},
	core::cell::RefCell,
	std::rc::Rc,
};

/// Log
type Log = Rc<RefCell<Vec<(&'static str, i32)>>>;

/// Creates a component that logs the value of it's `i32` context every time it changes
fn reader(name: &'static str, log: &Log, children: Vec<Component>) -> Component {
	let log = Rc::clone(log);
	Component::named(name, move |node: &Node| {
		let value = node.use_context::<i32>();
		let log = Rc::clone(&log);
		node.use_effect(value.dep(), {
			let value = value.clone();
			move || log.borrow_mut().push((name, value.get()))
		});

		children.clone()
	})
}

/// Creates a component that provides an `i32` context
fn provider(name: &'static str, value: i32, children: Vec<Component>) -> Component {
	Component::named(name, move |node: &Node| {
		node.create_context(value);
		children.clone()
	})
}

#[test]
fn lookup() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Log::default();
	tree.attach_to_root(&self::provider("provider", 5, vec![self::reader("reader", &log, vec![])]));
	assert_eq!(*log.borrow(), [("reader", 5)]);
}

/// Ensures a node doesn't read it's own context
#[test]
fn lookup_starts_at_parent() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Log::default();
	let both = Component::named("both", {
		let log = Rc::clone(&log);
		move |node: &Node| {
			node.create_context(2_i32);
			let value = node.use_context::<i32>();
			let log = Rc::clone(&log);
			node.use_effect((), move || log.borrow_mut().push(("both", value.get())));
		}
	});
	tree.attach_to_root(&self::provider("provider", 1, vec![both]));
	assert_eq!(*log.borrow(), [("both", 1)]);
}

#[test]
fn missing() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Log::default();
	let res = tree.root().try_create_child(&self::reader("reader", &log, vec![]));
	assert!(
		matches!(res, Err(TreeError::MissingContext { .. })),
		"Expected missing context, found {res:?}"
	);
	assert!(log.borrow().is_empty());
	assert_eq!(tree.len(), 2, "Failed node wasn't freed");

	// Unmounted nodes can be built without it
	let node = tree.build(&self::reader("reader", &log, vec![]));
	assert!(log.borrow().is_empty());
	assert_eq!(
		tree.root().try_add_child(&node),
		Err(TreeError::MissingContext {
			node: node.key(),
			ty:   "i32",
		})
	);
	assert_eq!(node.parent(), None, "Failed add changed the parent");
}

#[test]
#[should_panic = "Context wasn't initialized"]
fn read_unmounted() {
	arbor_logger::init();

	let tree = Tree::new();
	tree.build(&Component::new(|node: &Node| {
		let value = node.use_context::<i32>();
		_ = value.get();
	}));
}

#[test]
fn duplicate() {
	arbor_logger::init();

	let tree = Tree::new();
	let node = tree.attach_to_root(&self::provider("provider", 1, vec![]));
	assert_eq!(
		node.try_create_context(2_i32),
		Err(TreeError::DuplicateContext {
			node: node.key(),
			ty:   "i32",
		})
	);
}

/// Ensures replacing a context notifies every reader except those below a shadowing node
#[test]
fn replace_shadowed() {
	arbor_logger::init();

	let tree = Tree::new();
	let log = Log::default();
	let provider = tree.attach_to_root(&self::provider("provider", 1, vec![
		self::reader("a", &log, vec![self::reader("a-child", &log, vec![])]),
		self::provider("shadow", 10, vec![self::reader("b", &log, vec![])]),
	]));
	assert_eq!(*log.borrow(), [("a", 1), ("a-child", 1), ("b", 10)]);

	assert_eq!(provider.replace_context(2_i32), 1);
	assert_eq!(*log.borrow(), [("a", 1), ("a-child", 1), ("b", 10), ("a", 2), ("a-child", 2)]);
	assert_eq!(provider.find_context::<i32>(), Err(TreeError::MissingContext {
		node: provider.key(),
		ty:   "i32",
	}));
	assert_eq!(provider.children()[0].find_context::<i32>(), Ok(2));
}

#[test]
fn reactive_read() {
	arbor_logger::init();

	let tree = Tree::new();
	let provider = tree.attach_to_root(&self::provider("provider", 1, vec![]));
	let reader = provider.create_child(&Component::empty());
	let value = reader.use_context::<i32>();

	let seen = Rc::new(RefCell::new(vec![]));
	reader.effect({
		let seen = Rc::clone(&seen);
		move || seen.borrow_mut().push(value.get())
	});

	provider.replace_context(2_i32);
	provider.replace_context(3_i32);
	assert_eq!(*seen.borrow(), [1, 2, 3]);

	reader.free();
	provider.replace_context(4_i32);
	assert_eq!(*seen.borrow(), [1, 2, 3], "Freed node's effect ran");
	assert_eq!(tree.context_reader_count(), 0);
}

/// Ensures a reader used within an effect is dropped whenever the effect re-runs
#[test]
fn effect_reader() {
	arbor_logger::init();

	let tree = Tree::new();
	let provider = tree.attach_to_root(&self::provider("provider", 1, vec![]));
	let reader = provider.create_child(&Component::empty());
	let signal = Signal::new(tree.world(), 0_usize);

	let seen = Rc::new(RefCell::new(vec![]));
	reader.effect({
		let reader = reader.clone();
		let signal = signal.clone();
		let seen = Rc::clone(&seen);
		move || {
			_ = signal.get();
			let value = reader.use_context::<i32>();
			seen.borrow_mut().push(value.get());
		}
	});
	for value in 1..=100 {
		signal.set(value);
	}
	assert_eq!(tree.context_reader_count(), 1, "Effect left stale readers behind");

	provider.replace_context(2_i32);
	assert_eq!(seen.borrow().len(), 102);
	assert_eq!(seen.borrow().last(), Some(&2));
	assert_eq!(tree.context_reader_count(), 1);
}

/// Ensures a lifecycle effect is cleaned up before every re-run, and once more when freed
#[test]
fn effect_dependency() {
	arbor_logger::init();

	let tree = Tree::new();
	let dep = Dependency::new();
	let log = Rc::new(RefCell::new(vec![]));
	let node = tree.attach_to_root(&Component::named("node", {
		let dep = dep.clone();
		let log = Rc::clone(&log);
		move |node: &Node| {
			let log = Rc::clone(&log);
			node.use_effect(dep.clone(), move || {
				log.borrow_mut().push("init");
				let log = Rc::clone(&log);
				move || log.borrow_mut().push("cleanup")
			});
		}
	}));

	dep.change(|| ());
	dep.change(|| ());
	node.free();
	assert_eq!(node.state(), NodeState::Freed);
	assert_eq!(*log.borrow(), ["init", "cleanup", "init", "cleanup", "init", "cleanup"]);

	dep.change(|| ());
	assert_eq!(log.borrow().len(), 6, "Freed effect ran");
	assert_eq!(dep.listener_count(), 0, "Freed effect is still subscribed");
}

/// Ensures a lifecycle effect is cleaned up while it's dependency is changing
#[test]
fn effect_will_change() {
	arbor_logger::init();

	let tree = Tree::new();
	let dep = Dependency::new();
	let log = Rc::new(RefCell::new(vec![]));
	let node = tree.attach_to_root(&Component::empty());
	node.use_effect(&dep, {
		let log = Rc::clone(&log);
		move || {
			log.borrow_mut().push("init");
			let log = Rc::clone(&log);
			move || log.borrow_mut().push("cleanup")
		}
	});

	dep.change(|| log.borrow_mut().push("change"));
	assert_eq!(*log.borrow(), ["init", "cleanup", "change", "init"]);

	tree.root().remove_child(&node);
	assert_eq!(*log.borrow(), ["init", "cleanup", "change", "init", "cleanup"]);

	dep.change(|| ());
	assert_eq!(log.borrow().len(), 5, "Unmounted effect ran");
}
