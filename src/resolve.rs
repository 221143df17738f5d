//! Cycle detection for recursive resolution
//!
//! Each public graph operation starts from a fresh [`ResolutionPath`], so
//! detection is deterministic and needs no thread-local state: a cycle is
//! exactly a key re-entered on the same call stack.

use crate::error::{DiError, DiResult};
use crate::key::BindingKey;
use std::collections::HashSet;

/// Maximum resolution depth (guards against pathological chains)
const MAX_RESOLUTION_DEPTH: usize = 100;

/// The chain of keys currently under construction on this call stack.
///
/// A `HashSet` gives O(1) membership checks; the parallel `Vec` preserves
/// order for the `A -> B -> A` diagnostic path.
pub(crate) struct ResolutionPath {
	in_progress: HashSet<BindingKey>,
	path: Vec<BindingKey>,
}

impl ResolutionPath {
	pub(crate) fn new() -> Self {
		Self {
			in_progress: HashSet::new(),
			path: Vec::new(),
		}
	}

	/// Record that `key` is now being constructed.
	///
	/// Fails if the key is already on the path (a cycle) or the depth
	/// guard trips.
	pub(crate) fn enter(&mut self, key: &BindingKey) -> DiResult<()> {
		if self.path.len() >= MAX_RESOLUTION_DEPTH {
			return Err(DiError::MaxDepthExceeded(self.path.len() + 1));
		}
		if self.in_progress.contains(key) {
			return Err(DiError::CyclicDependency {
				key: key.to_string(),
				path: self.display_cycle(key),
			});
		}
		self.in_progress.insert(key.clone());
		self.path.push(key.clone());
		Ok(())
	}

	/// Pop the most recent frame. Paired with every successful `enter`.
	pub(crate) fn exit(&mut self) {
		if let Some(key) = self.path.pop() {
			self.in_progress.remove(&key);
		}
	}

	/// The key whose construction triggered the current lookup, if any.
	pub(crate) fn requesting_site(&self) -> Option<&'static str> {
		self.path.last().map(BindingKey::type_name)
	}

	fn display_cycle(&self, repeated: &BindingKey) -> String {
		let start = self
			.path
			.iter()
			.position(|key| key == repeated)
			.unwrap_or(0);
		let mut names: Vec<&str> = self.path[start..]
			.iter()
			.map(|key| key.type_name())
			.collect();
		names.push(repeated.type_name());
		names.join(" -> ")
	}
}
