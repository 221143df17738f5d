//! Modules: the factory-method side of binding declaration

use crate::binding::{BindingDescriptor, BindingOrigin, Scope};
use crate::key::{BindingKey, Qualifier};
use crate::provide::{Callable, DepList, erase_factory};
use std::any::TypeId;

/// A bundle of bindings and entry-point declarations.
///
/// Modules are plain values; [`configure`](Module::configure) is called
/// once per [`ObjectGraph::build`](crate::ObjectGraph::build) and may
/// capture module state in the factories it registers.
pub trait Module: Send + Sync {
	/// Register this module's bindings and entry points.
	fn configure(&self, bindings: &mut Bindings);

	/// Override modules unconditionally replace same-key bindings from
	/// base modules; among overrides the last one given to `build` wins.
	fn is_override(&self) -> bool {
		false
	}

	/// Name used in duplicate-binding diagnostics.
	fn name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}

/// An entry-point declaration: a type callers may request from the graph
/// facade.
#[derive(Clone, Copy, Debug)]
pub struct EntryPoint {
	pub(crate) type_id: TypeId,
	pub(crate) type_name: &'static str,
}

impl EntryPoint {
	pub fn of<T: 'static>() -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: std::any::type_name::<T>(),
		}
	}
}

/// Collector passed to [`Module::configure`]. Declaration order is
/// preserved.
pub struct Bindings {
	module: &'static str,
	is_override: bool,
	descriptors: Vec<BindingDescriptor>,
	entry_points: Vec<EntryPoint>,
}

impl Bindings {
	pub(crate) fn new(module: &'static str, is_override: bool) -> Self {
		Self {
			module,
			is_override,
			descriptors: Vec::new(),
			entry_points: Vec::new(),
		}
	}

	/// Register a factory binding for the closure's return type.
	///
	/// Each closure parameter becomes a dependency key, resolved in
	/// parameter order before the factory runs. The returned guard
	/// adjusts scope and qualifiers:
	///
	/// ```ignore
	/// bindings.provide(|| Database::connect()).singleton();
	/// bindings.provide(|db: Arc<Database>| Repository { db });
	/// bindings.provide(|| "primary".to_string()).named("shard");
	/// ```
	pub fn provide<Out, Args, F>(&mut self, factory: F) -> Provide<'_>
	where
		Out: Send + Sync + 'static,
		Args: DepList,
		F: Callable<Args, Out> + Send + Sync + 'static,
	{
		let (dependencies, factory) = erase_factory(factory);
		let origin = if self.is_override {
			BindingOrigin::Override(self.module)
		} else {
			BindingOrigin::Module(self.module)
		};
		let index = self.descriptors.len();
		self.descriptors.push(BindingDescriptor::new(
			BindingKey::of::<Out>(),
			dependencies,
			Scope::Unscoped,
			origin,
			factory,
		));
		Provide {
			descriptor: &mut self.descriptors[index],
		}
	}

	/// Register a pre-built descriptor. Escape hatch for descriptor
	/// producers other than typed closures.
	pub fn declare(&mut self, descriptor: BindingDescriptor) {
		self.descriptors.push(descriptor);
	}

	/// Declare `T` as requestable through
	/// [`ObjectGraph::get`](crate::ObjectGraph::get) and
	/// [`ObjectGraph::provider`](crate::ObjectGraph::provider).
	pub fn entry_point<T: Send + Sync + 'static>(&mut self) {
		self.entry_points.push(EntryPoint::of::<T>());
	}

	pub(crate) fn into_parts(self) -> (Vec<BindingDescriptor>, Vec<EntryPoint>) {
		(self.descriptors, self.entry_points)
	}
}

/// Builder guard returned by [`Bindings::provide`].
pub struct Provide<'a> {
	descriptor: &'a mut BindingDescriptor,
}

impl Provide<'_> {
	/// Memoize the provided value for the lifetime of the graph.
	pub fn singleton(self) -> Self {
		self.descriptor.scope = Scope::Singleton;
		self
	}

	/// Qualify the provided key with `name`.
	pub fn named(self, name: &'static str) -> Self {
		self.descriptor.key = self
			.descriptor
			.key
			.clone()
			.with_qualifier(Some(Qualifier::named(name)));
		self
	}

	/// Qualify the dependency at `index` (zero-based factory parameter
	/// order) with `name`.
	pub fn named_dependency(self, index: usize, name: &'static str) -> Self {
		debug_assert!(
			index < self.descriptor.dependencies.len(),
			"dependency index out of range"
		);
		if let Some(dependency) = self.descriptor.dependencies.get_mut(index) {
			*dependency = dependency
				.clone()
				.with_qualifier(Some(Qualifier::named(name)));
		}
		self
	}
}
