//! Injectable type records: a process-wide, statically collected index of
//! types the graph may construct or member-inject without a module binding
//!
//! Each record supplies an optional constructor, an ordered member list,
//! and a class-level scope. The [`injectable!`] macro writes the record
//! for the common shapes; hand-written [`TypeDescriptor`]s through the
//! builder are equally valid.

use crate::binding::{BoxFactory, BoxedInstance, Instance, Scope};
use crate::error::{DiError, DiResult};
use crate::key::{BindingKey, Qualifier};
use crate::provide::{Callable, DepList, FromInstance, erase_constructor};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

/// One registered injectable type, collected at program start.
///
/// The fields are function pointers rather than values so records can be
/// placed in statics; the descriptor itself is produced lazily on first
/// lookup.
pub struct InjectableType {
	type_id: fn() -> TypeId,
	type_name: fn() -> &'static str,
	describe: fn() -> TypeDescriptor,
}

impl InjectableType {
	pub const fn new(
		type_id: fn() -> TypeId,
		type_name: fn() -> &'static str,
		describe: fn() -> TypeDescriptor,
	) -> Self {
		Self {
			type_id,
			type_name,
			describe,
		}
	}

	pub fn type_name(&self) -> &'static str {
		(self.type_name)()
	}

	pub(crate) fn describe(&self) -> TypeDescriptor {
		(self.describe)()
	}
}

inventory::collect!(InjectableType);

/// `TypeId -> record` index over everything submitted, built once on
/// first use.
static INDEX: LazyLock<HashMap<TypeId, &'static InjectableType>> = LazyLock::new(|| {
	let mut index = HashMap::new();
	for record in inventory::iter::<InjectableType> {
		let _ = index.insert((record.type_id)(), record);
	}
	index
});

pub(crate) fn find(type_id: TypeId) -> Option<&'static InjectableType> {
	INDEX.get(&type_id).copied()
}

/// What the graph knows about constructing and member-injecting one type.
pub struct TypeDescriptor {
	pub(crate) constructor: Option<Constructor>,
	pub(crate) members: Arc<[Member]>,
	pub(crate) scope: Scope,
	pub(crate) default_fn: Option<fn() -> BoxedInstance>,
}

impl TypeDescriptor {
	pub fn builder<T: Send + Sync + 'static>() -> TypeDescriptorBuilder<T> {
		TypeDescriptorBuilder {
			constructor: None,
			members: Vec::new(),
			scope: Scope::Unscoped,
			default_fn: None,
			_marker: PhantomData,
		}
	}
}

pub(crate) struct Constructor {
	pub(crate) dependencies: Vec<BindingKey>,
	pub(crate) construct: BoxFactory,
}

/// One injectable member: its dependency key, the field name for
/// diagnostics, and an erased assignment into the target value.
#[derive(Clone)]
pub(crate) struct Member {
	pub(crate) key: BindingKey,
	pub(crate) name: &'static str,
	pub(crate) assign: Arc<dyn Fn(&mut dyn Any, Instance) -> DiResult<()> + Send + Sync>,
}

/// Builds a [`TypeDescriptor`] for `T`.
pub struct TypeDescriptorBuilder<T> {
	constructor: Option<Constructor>,
	members: Vec<Member>,
	scope: Scope,
	default_fn: Option<fn() -> BoxedInstance>,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
	/// Declare the injectable constructor. Parameter keys are taken from
	/// the closure's parameter types, in order.
	pub fn constructor<Args, F>(mut self, construct: F) -> Self
	where
		Args: DepList,
		F: Callable<Args, T> + Send + Sync + 'static,
	{
		let (dependencies, construct) = erase_constructor(construct);
		self.constructor = Some(Constructor {
			dependencies,
			construct,
		});
		self
	}

	/// Declare one injectable member, assigned after construction and on
	/// every [`inject`](crate::ObjectGraph::inject) call.
	pub fn member<V: FromInstance>(
		mut self,
		name: &'static str,
		qualifier: Option<&'static str>,
		assign: fn(&mut T, V),
	) -> Self {
		let key = V::key().with_qualifier(qualifier.map(Qualifier::named));
		let erased = Arc::new(move |target: &mut dyn Any, value: Instance| {
			let target = target
				.downcast_mut::<T>()
				.ok_or_else(|| DiError::TypeMismatch {
					key: BindingKey::of::<T>().to_string(),
				})?;
			assign(target, V::from_instance(value)?);
			Ok(())
		});
		self.members.push(Member {
			key,
			name,
			assign: erased,
		});
		self
	}

	/// Prepend the member set of an embedded base type, so base members
	/// are always injected before this type's own.
	pub fn inherit<B: Send + Sync + 'static>(mut self, project: fn(&mut T) -> &mut B) -> Self {
		let base_members: Vec<Member> = find(TypeId::of::<B>())
			.map(|record| record.describe().members.to_vec())
			.unwrap_or_default();
		let mut members: Vec<Member> = base_members
			.into_iter()
			.map(|member| {
				let base_assign = Arc::clone(&member.assign);
				let erased = Arc::new(move |target: &mut dyn Any, value: Instance| {
					let target = target
						.downcast_mut::<T>()
						.ok_or_else(|| DiError::TypeMismatch {
							key: BindingKey::of::<T>().to_string(),
						})?;
					(base_assign)(project(target), value)
				});
				Member {
					key: member.key,
					name: member.name,
					assign: erased,
				}
			})
			.collect();
		members.append(&mut self.members);
		self.members = members;
		self
	}

	/// Mark the synthesized binding singleton-scoped.
	pub fn singleton(mut self) -> Self {
		self.scope = Scope::Singleton;
		self
	}

	/// Allow synthesis for a members-only type through `Default`.
	pub fn default_constructed(mut self) -> Self
	where
		T: Default,
	{
		self.default_fn = Some(|| -> BoxedInstance { Box::new(T::default()) });
		self
	}

	pub fn build(self) -> TypeDescriptor {
		TypeDescriptor {
			constructor: self.constructor,
			members: self.members.into(),
			scope: self.scope,
			default_fn: self.default_fn,
		}
	}
}

/// Registers a type as an injection target.
///
/// Constructor injection, optionally singleton-scoped and optionally with
/// members assigned after construction:
///
/// ```ignore
/// injectable!(Repository, (db: Arc<Database>) => Repository::new(db));
/// injectable!(singleton ConnectionPool, () => ConnectionPool::default());
/// injectable!(Widget, () => Widget { label: None }, members {
///     label: Option<Arc<String>> = "widget.label",
/// });
/// ```
///
/// Members-only targets (used by `inject`, and constructible just-in-time
/// when a `default` path is declared):
///
/// ```ignore
/// injectable!(members Screen { renderer: Option<Arc<Renderer>> });
/// injectable!(members default Panel { renderer: Option<Arc<Renderer>> });
/// ```
///
/// An embedded base type's members are inherited ancestor-first with
/// `inherit field: BaseType`.
#[macro_export]
macro_rules! injectable {
	(singleton $Ty:ty, ($($arg:ident : $ArgTy:ty),* $(,)?) => $ctor:expr, members { $($members:tt)* }) => {
		$crate::injectable!(@submit $Ty, |builder: $crate::TypeDescriptorBuilder<$Ty>| {
			let builder = builder
				.constructor(|$($arg: $ArgTy),*| $ctor)
				.singleton();
			$crate::injectable!(@members $Ty, builder, $($members)*)
		});
	};
	(singleton $Ty:ty, ($($arg:ident : $ArgTy:ty),* $(,)?) => $ctor:expr) => {
		$crate::injectable!(@submit $Ty, |builder: $crate::TypeDescriptorBuilder<$Ty>| {
			builder.constructor(|$($arg: $ArgTy),*| $ctor).singleton()
		});
	};
	($Ty:ty, ($($arg:ident : $ArgTy:ty),* $(,)?) => $ctor:expr, members { $($members:tt)* }) => {
		$crate::injectable!(@submit $Ty, |builder: $crate::TypeDescriptorBuilder<$Ty>| {
			let builder = builder.constructor(|$($arg: $ArgTy),*| $ctor);
			$crate::injectable!(@members $Ty, builder, $($members)*)
		});
	};
	($Ty:ty, ($($arg:ident : $ArgTy:ty),* $(,)?) => $ctor:expr) => {
		$crate::injectable!(@submit $Ty, |builder: $crate::TypeDescriptorBuilder<$Ty>| {
			builder.constructor(|$($arg: $ArgTy),*| $ctor)
		});
	};
	(members default $Ty:ty { $($members:tt)* }) => {
		$crate::injectable!(@submit $Ty, |builder: $crate::TypeDescriptorBuilder<$Ty>| {
			let builder = builder.default_constructed();
			$crate::injectable!(@members $Ty, builder, $($members)*)
		});
	};
	(members $Ty:ty { $($members:tt)* }) => {
		$crate::injectable!(@submit $Ty, |builder: $crate::TypeDescriptorBuilder<$Ty>| {
			$crate::injectable!(@members $Ty, builder, $($members)*)
		});
	};
	(@members $Ty:ty, $builder:expr, ) => { $builder };
	(@members $Ty:ty, $builder:expr, inherit $base:ident : $Base:ty $(, $($rest:tt)*)?) => {
		$crate::injectable!(
			@members $Ty,
			$builder.inherit::<$Base>(|target: &mut $Ty| &mut target.$base),
			$($($rest)*)?
		)
	};
	(@members $Ty:ty, $builder:expr, $field:ident : $FTy:ty = $name:literal $(, $($rest:tt)*)?) => {
		$crate::injectable!(
			@members $Ty,
			$builder.member::<$FTy>(
				stringify!($field),
				Some($name),
				|target: &mut $Ty, value: $FTy| target.$field = value,
			),
			$($($rest)*)?
		)
	};
	(@members $Ty:ty, $builder:expr, $field:ident : $FTy:ty $(, $($rest:tt)*)?) => {
		$crate::injectable!(
			@members $Ty,
			$builder.member::<$FTy>(
				stringify!($field),
				None,
				|target: &mut $Ty, value: $FTy| target.$field = value,
			),
			$($($rest)*)?
		)
	};
	(@submit $Ty:ty, $configure:expr) => {
		$crate::inventory::submit! {
			$crate::InjectableType::new(
				::std::any::TypeId::of::<$Ty>,
				::std::any::type_name::<$Ty>,
				|| {
					let configure = $configure;
					configure($crate::TypeDescriptor::builder::<$Ty>()).build()
				},
			)
		}
	};
}
