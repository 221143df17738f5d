//! Binding registry: build-time registration, lookup, and just-in-time
//! synthesis from injectable type records

use crate::binding::{BindingDescriptor, BindingOrigin, BoxFactory, Factory, Instance};
use crate::error::{DiError, DiResult};
use crate::injectable::{self, Member, TypeDescriptor};
use crate::key::BindingKey;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// One graph's binding table plus its member-injection cache.
///
/// Module bindings are inserted at build time; just-in-time bindings are
/// synthesized on first request and cached alongside them.
pub(crate) struct BindingRegistry {
	bindings: RwLock<HashMap<BindingKey, Arc<BindingDescriptor>>>,
	// `None` caches "this type has no injectable record".
	members: RwLock<HashMap<TypeId, Option<Arc<[Member]>>>>,
}

impl BindingRegistry {
	pub(crate) fn new() -> Self {
		Self {
			bindings: RwLock::new(HashMap::new()),
			members: RwLock::new(HashMap::new()),
		}
	}

	/// Insert a module-declared binding.
	///
	/// Without `allow_override`, a second binding for the same key is a
	/// [`DiError::DuplicateBinding`] naming both origins. With it, the
	/// new binding unconditionally replaces the old one.
	pub(crate) fn register(
		&self,
		descriptor: BindingDescriptor,
		allow_override: bool,
	) -> DiResult<()> {
		let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
		let key = descriptor.key().clone();
		if let Some(existing) = bindings.get(&key) {
			if !allow_override {
				return Err(DiError::DuplicateBinding {
					key: key.to_string(),
					first: existing.origin().to_string(),
					second: descriptor.origin().to_string(),
				});
			}
			debug!(key = %key, replaced = %existing.origin(), by = %descriptor.origin(), "binding overridden");
		} else {
			debug!(key = %key, origin = %descriptor.origin(), "binding registered");
		}
		let _ = bindings.insert(key, Arc::new(descriptor));
		Ok(())
	}

	pub(crate) fn lookup(&self, key: &BindingKey) -> Option<Arc<BindingDescriptor>> {
		self.bindings
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.cloned()
	}

	/// Find the descriptor for `key`, synthesizing a just-in-time binding
	/// when the key is unqualified, direct, and names a registered
	/// injectable type. Synthesis never invokes a factory.
	pub(crate) fn lookup_or_synthesize(
		&self,
		key: &BindingKey,
		requested_by: Option<&str>,
	) -> DiResult<Arc<BindingDescriptor>> {
		if let Some(found) = self.lookup(key) {
			return Ok(found);
		}
		// Qualified and deferred keys never fall back to synthesis.
		if key.qualifier().is_some() || key.is_deferred() {
			return Err(unresolved(key, requested_by));
		}
		let record =
			injectable::find(key.type_id()).ok_or_else(|| unresolved(key, requested_by))?;
		let synthesized = synthesize(key, record.describe())?;
		debug!(key = %key, "just-in-time binding synthesized");
		let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
		Ok(Arc::clone(
			bindings
				.entry(key.clone())
				.or_insert_with(|| Arc::new(synthesized)),
		))
	}

	/// The accumulated member-injection set for a type, ancestor-first,
	/// or `None` when the type has no injectable record.
	pub(crate) fn members_for(&self, type_id: TypeId) -> Option<Arc<[Member]>> {
		if let Some(cached) = self
			.members
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&type_id)
		{
			return cached.clone();
		}
		let computed = injectable::find(type_id).map(|record| record.describe().members);
		let _ = self
			.members
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(type_id, computed.clone());
		computed
	}

	/// All currently registered descriptors, for validation walks.
	pub(crate) fn snapshot(&self) -> Vec<Arc<BindingDescriptor>> {
		self.bindings
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.values()
			.cloned()
			.collect()
	}
}

fn unresolved(key: &BindingKey, requested_by: Option<&str>) -> DiError {
	DiError::UnresolvedBinding {
		key: key.to_string(),
		requested_by: requested_by.unwrap_or("direct request").to_string(),
	}
}

/// Turn an injectable type record into a provision descriptor: construct
/// (constructor or default path), then assign members, then share.
fn synthesize(key: &BindingKey, descriptor: TypeDescriptor) -> DiResult<BindingDescriptor> {
	let TypeDescriptor {
		constructor,
		members,
		scope,
		default_fn,
	} = descriptor;

	let (mut dependencies, construct): (Vec<BindingKey>, BoxFactory) =
		if let Some(constructor) = constructor {
			(constructor.dependencies, constructor.construct)
		} else if members.is_empty() {
			return Err(DiError::UnsupportedType {
				type_name: key.type_name(),
				reason: "no injectable constructor and no injectable members",
			});
		} else if let Some(default_fn) = default_fn {
			(
				Vec::new(),
				Arc::new(move |_: &[Instance]| Ok(default_fn())),
			)
		} else {
			return Err(DiError::UnsupportedType {
				type_name: key.type_name(),
				reason: "members-only injection target with no default construction path",
			});
		};

	let member_offset = dependencies.len();
	dependencies.extend(members.iter().map(|member| member.key.clone()));

	let factory: Factory = Arc::new(move |values: &[Instance]| {
		let mut value = construct(&values[..member_offset])?;
		for (member, resolved) in members.iter().zip(&values[member_offset..]) {
			(member.assign)(&mut *value, Arc::clone(resolved))?;
		}
		Ok(Arc::from(value))
	});

	Ok(BindingDescriptor::new(
		key.clone(),
		dependencies,
		scope,
		BindingOrigin::JustInTime,
		factory,
	))
}
