//! Retained node tree for `arbor`
//!
//! Nodes live in a [`Tree`] arena and are built out of [`Component`]s.
//! Building a component runs it's body once, within the node's scope, and
//! then builds every child it declares. Only once the whole subtree is built
//! is it attached and mounted, all at once.
//!
//! Once mounted, nodes may provide contexts to their descendants, hold
//! lifecycle effects, and react to typed messages sent through [`Tree::call`].
//! Structural changes that can't happen immediately are deferred to the next
//! [`Tree::update`].

// Modules
mod callbacks;
pub mod component;
pub mod context;
pub mod dyn_children;
pub mod effect;
pub mod error;
pub mod node;
pub mod tree;

// Exports
pub use self::{
	component::{Component, IntoChildren},
	context::Context,
	effect::EffectCleanup,
	error::TreeError,
	node::{Node, NodeKey, NodeState},
	tree::{Tree, WeakTree},
};
