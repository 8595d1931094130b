//! Component
//!
//! A component describes how to build a node: it's body runs once, when the
//! node is built, and returns the components of the node's children.
//!
//! The body runs with the node's scope as the current one, so any scopes
//! and cleanups it creates belong to the node. Signals read directly by the
//! body aren't tracked, since the body never re-runs. To react to a signal,
//! read it within [`Node::effect`](crate::Node::effect) or a memo instead.
//!
//! A component holds no state of it's own, so it may be built any number
//! of times.

// Imports
use {
	crate::Node,
	core::fmt,
	std::rc::Rc,
};

/// Component body
type Body = dyn Fn(&Node) -> Vec<Component>;

/// Component
#[derive(Clone)]
pub struct Component {
	/// Debug name
	name: Option<Rc<str>>,

	/// Body
	body: Rc<Body>,
}

impl Component {
	/// Creates a new component
	pub fn new<F, C>(body: F) -> Self
	where
		F: Fn(&Node) -> C + 'static,
		C: IntoChildren,
	{
		let body: Rc<Body> = Rc::new(move |node: &Node| body(node).into_children());
		Self { name: None, body }
	}

	/// Creates a new named component
	pub fn named<F, C>(name: impl Into<Rc<str>>, body: F) -> Self
	where
		F: Fn(&Node) -> C + 'static,
		C: IntoChildren,
	{
		Self::new(body).with_name(name)
	}

	/// Creates a component with no body or children
	#[must_use]
	pub fn empty() -> Self {
		Self::new(|_| ())
	}

	/// Sets the debug name of this component
	#[must_use]
	pub fn with_name(mut self, name: impl Into<Rc<str>>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Returns the debug name of this component
	#[must_use]
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Runs the body of this component
	pub(crate) fn run(&self, node: &Node) -> Vec<Self> {
		(self.body)(node)
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Types that may be used as the children of a component
pub trait IntoChildren {
	/// Converts this into the children
	fn into_children(self) -> Vec<Component>;
}

impl IntoChildren for () {
	fn into_children(self) -> Vec<Component> {
		vec![]
	}
}

impl IntoChildren for Component {
	fn into_children(self) -> Vec<Component> {
		vec![self]
	}
}

#[duplicate::duplicate_item(
	Ty;
	[Vec<Component>];
	[Option<Component>];
)]
impl IntoChildren for Ty {
	fn into_children(self) -> Vec<Component> {
		self.into_iter().collect()
	}
}

impl<const N: usize> IntoChildren for [Component; N] {
	fn into_children(self) -> Vec<Component> {
		self.into()
	}
}
