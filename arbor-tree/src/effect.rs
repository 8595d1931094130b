//! Lifecycle effects
//!
//! A lifecycle effect is initialized when it's node is mounted, and cleaned up
//! when it's unmounted (or freed).
//!
//! Effects may depend on a set of [`Dependency`]s. While mounted, whenever any
//! of them is about to change, the effect is cleaned up, and once it changed,
//! the effect is initialized again.

// Imports
use {
	crate::{Node, error::TreeResultExt},
	arbor_reactive::{Dependency, Deps, Scope, Subscription},
	core::{cell::RefCell, fmt, mem},
	std::rc::Rc,
};

/// Effect cleanup
pub trait EffectCleanup: 'static {
	/// Cleans up the effect
	fn cleanup(self);
}

impl EffectCleanup for () {
	fn cleanup(self) {}
}

impl<F> EffectCleanup for F
where
	F: FnOnce() + 'static,
{
	fn cleanup(self) {
		self();
	}
}

/// Effect initializer
type Init = dyn Fn() -> Box<dyn FnOnce()>;

/// Effect state
#[derive(Default)]
struct State {
	/// Whether we're mounted
	mounted: bool,

	/// Subscriptions to our dependencies, while mounted
	subs: Vec<Subscription>,

	/// Scope and cleanup of the current initialization
	cleanup: Option<(Scope, Box<dyn FnOnce()>)>,
}

/// Lifecycle effect
pub(crate) struct NodeEffect {
	/// Scope of the owning node
	owner: Scope,

	/// Initializer
	init: Box<Init>,

	/// Aggregate dependency
	dep: Dependency,

	/// State
	state: RefCell<State>,
}

impl NodeEffect {
	/// Creates a new, unmounted, effect
	fn new(owner: Scope, deps: &Deps, init: Box<Init>) -> Self {
		Self {
			owner,
			init,
			dep: deps.aggregate(),
			state: RefCell::new(State::default()),
		}
	}

	/// Mounts this effect.
	///
	/// Subscribes to the dependencies, and initializes the effect.
	pub fn mount(self: &Rc<Self>) {
		if self.state.borrow().mounted {
			return;
		}

		let will_change = self.dep.on_will_change({
			let effect = Rc::downgrade(self);
			move || {
				if let Some(effect) = effect.upgrade() {
					effect.cleanup();
				}
			}
		});
		let did_change = self.dep.on_did_change({
			let effect = Rc::downgrade(self);
			move || {
				if let Some(effect) = effect.upgrade() {
					effect.cleanup();
					effect.run();
				}
			}
		});

		{
			let mut state = self.state.borrow_mut();
			state.mounted = true;
			state.subs = vec![will_change, did_change];
		}
		self.run();
	}

	/// Unmounts this effect.
	///
	/// Unsubscribes from the dependencies, and cleans up the effect.
	pub fn unmount(&self) {
		let subs = {
			let mut state = self.state.borrow_mut();
			if !state.mounted {
				return;
			}
			state.mounted = false;
			mem::take(&mut state.subs)
		};
		drop(subs);

		self.cleanup();
	}

	/// Initializes this effect, if not already initialized
	fn run(&self) {
		if self.state.borrow().cleanup.is_some() {
			return;
		}

		let scope = Scope::child_of(&self.owner, || ());
		let cleanup = scope.run_in(|| scope.untrack(|| (self.init)()));
		self.state.borrow_mut().cleanup = Some((scope, cleanup));
	}

	/// Cleans up this effect, if initialized
	fn cleanup(&self) {
		let Some((scope, cleanup)) = self.state.borrow_mut().cleanup.take() else {
			return;
		};

		cleanup();
		scope.dispose();
	}
}

impl fmt::Debug for NodeEffect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("NodeEffect")
			.field("mounted", &state.mounted)
			.field("initialized", &state.cleanup.is_some())
			.field("dep", &self.dep)
			.finish_non_exhaustive()
	}
}

impl Node {
	/// Adds a lifecycle effect to this node.
	///
	/// `init` runs once the node is mounted, and it's output is used to clean up
	/// once the node is unmounted. While mounted, whenever any of `deps` changes,
	/// the effect is cleaned up and initialized again.
	///
	/// If the node is already mounted, `init` runs immediately.
	#[track_caller]
	pub fn use_effect<D, F, C>(&self, deps: D, init: F)
	where
		D: Into<Deps>,
		F: Fn() -> C + 'static,
		C: EffectCleanup,
	{
		let init: Box<Init> = Box::new(move || {
			let cleanup = init();
			let cleanup: Box<dyn FnOnce()> = Box::new(move || cleanup.cleanup());
			cleanup
		});

		let (effect, mounted) = self
			.with_data(|data| {
				let effect = Rc::new(NodeEffect::new(data.scope.clone(), &deps.into(), init));
				(effect, data.mounted)
			})
			.or_panic();

		// Note: We add it before mounting, so that it's unmounted
		//       if the node is freed while it's initializing.
		let tree = self.tree();
		if let Some(data) = tree.nodes().borrow_mut().get_mut(self.key()) {
			data.effects.push(Rc::clone(&effect));
		}
		if mounted {
			effect.mount();
		}
	}
}
