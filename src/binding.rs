//! Binding descriptors: the registry's unit of knowledge

use crate::error::DiResult;
use crate::key::BindingKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved value as it travels through the graph, type-erased and
/// shareable across threads.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A freshly constructed value before it is shared. Kept boxed so member
/// injection can still mutate it.
pub(crate) type BoxedInstance = Box<dyn Any + Send + Sync>;

/// Erased factory stored in a [`BindingDescriptor`]. Receives the resolved
/// dependencies in declared order.
pub type Factory = Arc<dyn Fn(&[Instance]) -> DiResult<Instance> + Send + Sync>;

/// Erased factory producing a still-mutable value; used for constructor
/// bindings whose members are assigned before the value is shared.
pub(crate) type BoxFactory = Arc<dyn Fn(&[Instance]) -> DiResult<BoxedInstance> + Send + Sync>;

/// Lifetime of a binding's values within one graph.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
	/// A fresh value per resolution.
	Unscoped,
	/// One memoized value per graph, constructed at most once.
	Singleton,
}

/// Where a binding came from, for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BindingOrigin {
	/// Declared by a base module's `configure`.
	Module(&'static str),
	/// Declared by an override module's `configure`.
	Override(&'static str),
	/// Synthesized on demand from an injectable type record.
	JustInTime,
}

impl fmt::Display for BindingOrigin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Module(name) => write!(f, "module `{name}`"),
			Self::Override(name) => write!(f, "override module `{name}`"),
			Self::JustInTime => f.write_str("just-in-time binding"),
		}
	}
}

/// Everything the engine needs to produce a value for one key: the
/// dependency keys to resolve first, the scope, and the erased factory.
#[derive(Clone)]
pub struct BindingDescriptor {
	pub(crate) key: BindingKey,
	pub(crate) dependencies: Vec<BindingKey>,
	pub(crate) scope: Scope,
	pub(crate) origin: BindingOrigin,
	pub(crate) factory: Factory,
}

impl BindingDescriptor {
	pub fn new(
		key: BindingKey,
		dependencies: Vec<BindingKey>,
		scope: Scope,
		origin: BindingOrigin,
		factory: Factory,
	) -> Self {
		Self {
			key,
			dependencies,
			scope,
			origin,
			factory,
		}
	}

	pub fn key(&self) -> &BindingKey {
		&self.key
	}

	/// Dependency keys in the order the factory expects them.
	pub fn dependencies(&self) -> &[BindingKey] {
		&self.dependencies
	}

	pub fn scope(&self) -> Scope {
		self.scope
	}

	pub fn origin(&self) -> BindingOrigin {
		self.origin
	}

	pub(crate) fn factory(&self) -> &Factory {
		&self.factory
	}
}

impl fmt::Debug for BindingDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BindingDescriptor")
			.field("key", &self.key)
			.field("dependencies", &self.dependencies)
			.field("scope", &self.scope)
			.field("origin", &self.origin)
			.finish_non_exhaustive()
	}
}
