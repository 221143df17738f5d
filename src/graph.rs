//! The object graph: build-time assembly and the recursive resolution
//! engine behind `get`, `provider`, `inject` and `validate`

use crate::binding::{BindingDescriptor, Instance, Scope};
use crate::error::{DiError, DiResult};
use crate::key::BindingKey;
use crate::module::{Bindings, Module};
use crate::provide::{Deferred, Provider};
use crate::registry::BindingRegistry;
use crate::resolve::ResolutionPath;
use crate::scope::SingletonScope;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// An immutable set of bindings plus the singleton values resolved from
/// them.
///
/// Built once from modules, then shared (`Clone` is an `Arc` bump) and
/// used concurrently for the life of the application. Callers reach
/// values only through declared entry points.
pub struct ObjectGraph {
	inner: Arc<GraphInner>,
}

impl Clone for ObjectGraph {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

pub(crate) struct GraphInner {
	pub(crate) registry: BindingRegistry,
	singletons: SingletonScope,
	entry_points: HashMap<TypeId, &'static str>,
}

impl ObjectGraph {
	/// Assemble a graph from module instances.
	///
	/// Base modules register first and may not collide on a key; override
	/// modules then replace freely, last one in argument order winning.
	/// Entry-point declarations are unioned across all modules. No
	/// factory runs and nothing is resolved here, so the only possible
	/// failure is [`DiError::DuplicateBinding`].
	pub fn build(modules: &[&dyn Module]) -> DiResult<Self> {
		let registry = BindingRegistry::new();
		let mut entry_points = HashMap::new();
		for overriding in [false, true] {
			for module in modules.iter().filter(|m| m.is_override() == overriding) {
				let mut bindings = Bindings::new(module.name(), overriding);
				module.configure(&mut bindings);
				let (descriptors, declared) = bindings.into_parts();
				debug!(
					module = module.name(),
					bindings = descriptors.len(),
					overrides = overriding,
					"module configured"
				);
				for descriptor in descriptors {
					registry.register(descriptor, overriding)?;
				}
				for entry_point in declared {
					let _ = entry_points.insert(entry_point.type_id, entry_point.type_name);
				}
			}
		}
		Ok(Self {
			inner: Arc::new(GraphInner {
				registry,
				singletons: SingletonScope::new(),
				entry_points,
			}),
		})
	}

	/// Resolve an instance of a declared entry-point type.
	///
	/// Unscoped bindings yield a fresh value per call; singleton bindings
	/// the memoized one.
	pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
		self.require_entry_point::<T>()?;
		let key = BindingKey::of::<T>();
		let instance = GraphInner::resolve_root(&self.inner, &key)?;
		instance.downcast::<T>().map_err(|_| DiError::TypeMismatch {
			key: key.to_string(),
		})
	}

	/// Deferred variant of [`get`](ObjectGraph::get): hands out an
	/// accessor immediately, constructing nothing until its first `get`.
	pub fn provider<T: Send + Sync + 'static>(&self) -> DiResult<Provider<T>> {
		self.require_entry_point::<T>()?;
		Ok(Provider::new(Deferred {
			graph: Arc::clone(&self.inner),
			key: BindingKey::of::<T>(),
		}))
	}

	/// Assign `target`'s injectable members from the graph, base-type
	/// members first.
	///
	/// A type with no injectable record has nothing to assign and the
	/// call is a no-op success. Entry-point gating does not apply;
	/// injection works on caller-owned values of any registered shape.
	pub fn inject<T: Send + Sync + 'static>(&self, target: &mut T) -> DiResult<()> {
		let Some(members) = self.inner.registry.members_for(TypeId::of::<T>()) else {
			trace!(
				type_name = std::any::type_name::<T>(),
				"no member-injection set; nothing to assign"
			);
			return Ok(());
		};
		let mut path = ResolutionPath::new();
		path.enter(&BindingKey::of::<T>())?;
		for member in members.iter() {
			trace!(
				type_name = std::any::type_name::<T>(),
				member = member.name,
				key = %member.key,
				"injecting member"
			);
			let value = GraphInner::resolve(&self.inner, &member.key, &mut path)?;
			(member.assign)(target, value)?;
		}
		path.exit();
		Ok(())
	}

	/// Statically check that every declared binding and entry point can
	/// be satisfied, without invoking a single factory.
	///
	/// The walk covers all module-declared dependency keys plus
	/// everything reachable from entry points, synthesizing just-in-time
	/// descriptors where resolution would. Entry points that are pure
	/// member-injection targets are checked through their member keys;
	/// entry points needing no injection at all pass. Deferred keys are
	/// validated against their direct counterpart.
	pub fn validate(&self) -> DiResult<()> {
		debug!(entry_points = self.inner.entry_points.len(), "validating graph");
		let mut visited: HashSet<BindingKey> = HashSet::new();
		let mut pending: Vec<(BindingKey, String)> = Vec::new();

		for descriptor in self.inner.registry.snapshot() {
			for dependency in descriptor.dependencies() {
				pending.push((
					dependency.clone(),
					descriptor.key().type_name().to_string(),
				));
			}
		}

		for (&type_id, &type_name) in &self.inner.entry_points {
			let key = BindingKey::from_parts(type_id, type_name);
			match self.inner.registry.lookup_or_synthesize(&key, Some("entry point")) {
				Ok(descriptor) => {
					for dependency in descriptor.dependencies() {
						pending.push((dependency.clone(), type_name.to_string()));
					}
				}
				// An entry point need not be instantiable; it may be a pure
				// member-injection target, or need no injection at all.
				Err(DiError::UnresolvedBinding { .. } | DiError::UnsupportedType { .. }) => {}
				Err(other) => return Err(other),
			}
			if let Some(members) = self.inner.registry.members_for(type_id) {
				for member in members.iter() {
					pending.push((
						member.key.clone(),
						format!("member `{}` of {type_name}", member.name),
					));
				}
			}
		}

		while let Some((key, requested_by)) = pending.pop() {
			let direct = key.as_direct();
			if !visited.insert(direct.clone()) {
				continue;
			}
			let descriptor = self
				.inner
				.registry
				.lookup_or_synthesize(&direct, Some(&requested_by))?;
			for dependency in descriptor.dependencies() {
				pending.push((dependency.clone(), direct.type_name().to_string()));
			}
		}
		debug!("graph validated");
		Ok(())
	}

	fn require_entry_point<T: 'static>(&self) -> DiResult<()> {
		if self.inner.entry_points.contains_key(&TypeId::of::<T>()) {
			Ok(())
		} else {
			Err(DiError::NotAnEntryPoint {
				type_name: std::any::type_name::<T>(),
			})
		}
	}
}

impl GraphInner {
	/// Resolution entry for a fresh call stack (facade operations and
	/// deferred accessors).
	pub(crate) fn resolve_root(this: &Arc<Self>, key: &BindingKey) -> DiResult<Instance> {
		let mut path = ResolutionPath::new();
		Self::resolve(this, key, &mut path)
	}

	/// Recursive resolution step.
	///
	/// Deferred keys short-circuit to an accessor over the direct key,
	/// touching neither registry nor caches. Everything else looks up or
	/// synthesizes a descriptor, then constructs through the singleton
	/// scope or directly. The cycle check wraps the scope consultation
	/// so a singleton cycle is reported rather than self-blocking on its
	/// own slot.
	pub(crate) fn resolve(
		this: &Arc<Self>,
		key: &BindingKey,
		path: &mut ResolutionPath,
	) -> DiResult<Instance> {
		trace!(key = %key, "resolving");
		if key.is_deferred() {
			let deferred = Deferred {
				graph: Arc::clone(this),
				key: key.clone().as_direct(),
			};
			return Ok(Arc::new(deferred) as Instance);
		}
		let requested_by = path.requesting_site();
		let descriptor = this.registry.lookup_or_synthesize(key, requested_by)?;
		path.enter(key)?;
		let result = match descriptor.scope() {
			Scope::Singleton => this
				.singletons
				.get_or_create(key, || Self::construct(this, &descriptor, path)),
			Scope::Unscoped => Self::construct(this, &descriptor, path),
		};
		path.exit();
		result
	}

	/// Resolve dependencies in declared order, then invoke the factory.
	fn construct(
		this: &Arc<Self>,
		descriptor: &BindingDescriptor,
		path: &mut ResolutionPath,
	) -> DiResult<Instance> {
		let mut resolved = Vec::with_capacity(descriptor.dependencies().len());
		for dependency in descriptor.dependencies() {
			resolved.push(Self::resolve(this, dependency, path)?);
		}
		trace!(key = %descriptor.key(), origin = %descriptor.origin(), "invoking factory");
		(descriptor.factory())(&resolved)
	}
}
