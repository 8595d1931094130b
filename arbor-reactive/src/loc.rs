//! Source locations

// Imports
use core::fmt;
#[cfg(debug_assertions)]
use core::panic::Location;

/// Location a reactive item was created at.
///
/// Only tracked with `debug_assertions`, otherwise this is a ZST.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct Loc {
	#[cfg(debug_assertions)]
	location: &'static Location<'static>,
}

impl Loc {
	/// Gets the caller's location
	#[must_use]
	#[track_caller]
	pub const fn caller() -> Self {
		Self {
			#[cfg(debug_assertions)]
			location:                          Location::caller(),
		}
	}
}

impl fmt::Display for Loc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		#[cfg(debug_assertions)]
		{
			write!(f, "{}", self.location)
		}

		#[cfg(not(debug_assertions))]
		f.pad("<unknown>")
	}
}

impl fmt::Debug for Loc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}
