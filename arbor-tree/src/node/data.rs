//! Node data

// Imports
use {
	crate::{NodeKey, callbacks::Callbacks, context::ErasedReader, effect::NodeEffect},
	arbor_reactive::{Scope, World},
	core::any::{Any, TypeId},
	std::{collections::HashMap, rc::Rc},
};

/// Node state
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug, derive_more::Display)]
pub enum NodeState {
	/// Being built, and not yet attachable
	#[display("building")]
	Building,

	/// Built.
	///
	/// Whether it's mounted depends on it's parent.
	#[display("built")]
	Built,

	/// Queued for deletion on the next update
	#[display("queued to deletion")]
	QueuedToDeletion,

	/// Freed
	#[display("freed")]
	Freed,
}

/// Node data, as stored in the tree
pub struct NodeData {
	/// Debug name
	pub name: Option<String>,

	/// State
	pub state: NodeState,

	/// Whether we're mounted
	pub mounted: bool,

	/// Parent
	pub parent: Option<NodeKey>,

	/// Children
	pub children: Vec<NodeKey>,

	/// Scope.
	///
	/// Owns everything created while building and every reactive effect of the node.
	pub scope: Scope,

	/// Contexts we created
	pub contexts: HashMap<TypeId, Rc<dyn Any>>,

	/// Contexts we read
	pub readers: Vec<Rc<dyn ErasedReader>>,

	/// Message callbacks
	pub callbacks: Callbacks,

	/// Lifecycle effects
	pub effects: Vec<Rc<NodeEffect>>,

	/// Id
	pub id: Option<String>,
}

impl NodeData {
	/// Creates the data of a node that's about to be built
	#[track_caller]
	pub fn new(world: &World, name: Option<String>) -> Self {
		Self {
			name,
			state: NodeState::Building,
			mounted: false,
			parent: None,
			children: vec![],
			scope: Scope::new_root(world, || ()),
			contexts: HashMap::new(),
			readers: vec![],
			callbacks: Callbacks::default(),
			effects: vec![],
			id: None,
		}
	}
}
