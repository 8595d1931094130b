//! Run queue

// Imports
use {
	crate::WeakScope,
	core::{cell::RefCell, cmp::Reverse},
	priority_queue::PriorityQueue,
};

/// Inner type for the queue
struct Inner {
	/// Queue
	// Note: The priority is the insertion index, so that scopes
	//       run in the order they were first queued.
	queue: PriorityQueue<WeakScope, Reverse<usize>>,

	/// Next index
	next: usize,
}

/// Deduplicating queue of scopes pending a re-run.
///
/// Used by batches: pushing a scope that is already queued
/// keeps its original position, so it only runs once.
pub struct RunQueue {
	/// Inner
	inner: RefCell<Inner>,
}

impl RunQueue {
	/// Creates an empty queue
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: RefCell::new(Inner {
				queue: PriorityQueue::new(),
				next:  0,
			}),
		}
	}

	/// Pushes a scope to the queue.
	///
	/// If the scope is already queued, this is a no-op.
	pub fn push(&self, scope: WeakScope) {
		let mut inner = self.inner.borrow_mut();

		let next = Reverse(inner.next);
		inner.queue.push_increase(scope, next);
		inner.next += 1;
	}

	/// Pops a scope from the front of the queue
	pub fn pop(&self) -> Option<WeakScope> {
		let mut inner = self.inner.borrow_mut();
		let (scope, _) = inner.queue.pop()?;

		// Reset the index once we're empty to avoid it growing forever
		if inner.queue.is_empty() {
			inner.next = 0;
		}

		Some(scope)
	}

	/// Returns the number of queued scopes
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.borrow().queue.len()
	}

	/// Returns if the queue is empty
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.inner.borrow().queue.is_empty()
	}
}

impl Default for RunQueue {
	fn default() -> Self {
		Self::new()
	}
}
