//! Binding keys: what a request for a dependency is keyed by

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named qualifier distinguishing multiple bindings of the same type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Qualifier(&'static str);

impl Qualifier {
	pub const fn named(name: &'static str) -> Self {
		Self(name)
	}

	pub const fn name(&self) -> &'static str {
		self.0
	}
}

impl fmt::Display for Qualifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "@{}", self.0)
	}
}

/// Identity of one resolvable binding: a concrete type, an optional
/// qualifier, and whether the request is for a deferred accessor.
///
/// Keys are immutable value objects. The human-readable type name is
/// carried for diagnostics only and excluded from equality and hashing,
/// so two keys for the same `TypeId` always collapse to one binding.
#[derive(Clone, Debug)]
pub struct BindingKey {
	type_id: TypeId,
	type_name: &'static str,
	qualifier: Option<Qualifier>,
	deferred: bool,
}

impl BindingKey {
	/// Key for a direct, unqualified request of `T`.
	pub fn of<T: 'static>() -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: std::any::type_name::<T>(),
			qualifier: None,
			deferred: false,
		}
	}

	/// Key for a qualified request of `T`.
	pub fn named<T: 'static>(name: &'static str) -> Self {
		Self {
			qualifier: Some(Qualifier::named(name)),
			..Self::of::<T>()
		}
	}

	pub(crate) fn from_parts(type_id: TypeId, type_name: &'static str) -> Self {
		Self {
			type_id,
			type_name,
			qualifier: None,
			deferred: false,
		}
	}

	/// The same key, requested as a deferred accessor.
	#[must_use]
	pub fn as_deferred(mut self) -> Self {
		self.deferred = true;
		self
	}

	/// The same key with the deferred flag cleared.
	#[must_use]
	pub fn as_direct(mut self) -> Self {
		self.deferred = false;
		self
	}

	/// Replace the qualifier, keeping type and deferredness.
	#[must_use]
	pub fn with_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
		self.qualifier = qualifier;
		self
	}

	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn qualifier(&self) -> Option<Qualifier> {
		self.qualifier
	}

	pub fn is_deferred(&self) -> bool {
		self.deferred
	}
}

impl PartialEq for BindingKey {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
			&& self.qualifier == other.qualifier
			&& self.deferred == other.deferred
	}
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.type_id.hash(state);
		self.qualifier.hash(state);
		self.deferred.hash(state);
	}
}

impl fmt::Display for BindingKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(qualifier) = self.qualifier {
			write!(f, "{qualifier} ")?;
		}
		if self.deferred {
			write!(f, "Provider<{}>", self.type_name)
		} else {
			f.write_str(self.type_name)
		}
	}
}
