//! Errors

// Imports
use crate::NodeKey;

/// Tree error.
///
/// Every variant is a broken contract at the call site. The `try_*`
/// operations return it before mutating anything, while the plain
/// operations panic with it.
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum TreeError {
	/// Node already has a parent
	#[error("Node {node:?} already has a parent")]
	AlreadyHasParent { node: NodeKey },

	/// Node is still being built
	#[error("Node {node:?} is still being built, it can only be added once built")]
	StillBuilding { node: NodeKey },

	/// Node would become it's own ancestor
	#[error("Node {node:?} can't be added under it's own descendant")]
	WouldCycle { node: NodeKey },

	/// Id is already registered by another node
	#[error("Id {id:?} is already registered by another node")]
	DuplicateId { id: String },

	/// Context type was already created at a node
	#[error("Node {node:?} already created a context of type {ty}")]
	DuplicateContext { node: NodeKey, ty: &'static str },

	/// Node was already freed
	#[error("Node {node:?} was already freed")]
	AlreadyFreed { node: NodeKey },

	/// No ancestor provides a context type
	#[error("No ancestor of node {node:?} provides a context of type {ty}")]
	MissingContext { node: NodeKey, ty: &'static str },

	/// Node has no parent
	#[error("Node {node:?} has no parent")]
	NoParent { node: NodeKey },

	/// Node isn't a child of another
	#[error("Node {child:?} isn't a child of {parent:?}")]
	NotAChild { parent: NodeKey, child: NodeKey },

	/// Mounted nodes can't be restructured while a call is in progress
	#[error("Mounted nodes can't be restructured during a call, use `call_deferred` or `queue_free`")]
	MutationDuringCall,

	/// Singleton wasn't set
	#[error("Singleton of type {ty} was never set")]
	MissingSingleton { ty: &'static str },

	/// Two items share a key
	#[error("Duplicate key {key}")]
	DuplicateKey { key: String },

	/// Tree was dropped
	#[error("Tree was dropped")]
	Dropped,
}

/// Extension trait to panic on tree errors
#[extend::ext(name = TreeResultExt)]
pub(crate) impl<T> Result<T, TreeError> {
	/// Returns the value, or panics with the error
	#[track_caller]
	fn or_panic(self) -> T {
		match self {
			Ok(value) => value,
			Err(err) => on_tree_error(&err),
		}
	}
}

/// Called when a plain operation fails
#[cold]
#[track_caller]
pub(crate) fn on_tree_error(err: &TreeError) -> ! {
	panic!("{err}")
}
