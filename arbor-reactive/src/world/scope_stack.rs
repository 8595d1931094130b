//! Scope stack

// Imports
use {crate::Scope, core::cell::RefCell};

/// Stack of the scopes currently running.
///
/// The top of the stack is the scope that signal reads and newly
/// created child scopes register themselves with.
#[derive(Default)]
pub struct ScopeStack {
	/// Stack
	stack: RefCell<Vec<Scope>>,
}

impl ScopeStack {
	/// Creates an empty stack
	#[must_use]
	pub const fn new() -> Self {
		Self {
			stack: RefCell::new(vec![]),
		}
	}

	/// Pushes a scope onto the stack.
	pub fn push(&self, scope: Scope) {
		self.stack.borrow_mut().push(scope);
	}

	/// Pops the top scope from the stack
	pub fn pop(&self) {
		self.stack.borrow_mut().pop().expect("Missing pushed scope");
	}

	/// Returns the top scope of the stack
	#[must_use]
	pub fn top(&self) -> Option<Scope> {
		self.stack.borrow().last().cloned()
	}

	/// Returns the number of running scopes
	#[must_use]
	pub fn depth(&self) -> usize {
		self.stack.borrow().len()
	}
}

/// Guard that pops the scope it pushed when dropped.
///
/// Keeps the stack balanced even if the computation panics.
pub(crate) struct ScopeStackGuard<'a> {
	/// Stack
	stack: &'a ScopeStack,
}

impl<'a> ScopeStackGuard<'a> {
	/// Pushes `scope` onto `stack` until the guard is dropped
	pub(crate) fn new(stack: &'a ScopeStack, scope: Scope) -> Self {
		stack.push(scope);
		Self { stack }
	}
}

impl Drop for ScopeStackGuard<'_> {
	fn drop(&mut self) {
		self.stack.pop();
	}
}
