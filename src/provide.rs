//! Typed ergonomics over the erased core: factory parameters, tuple
//! expansion for closures, and deferred accessors

use crate::binding::{BoxFactory, BoxedInstance, Factory, Instance};
use crate::error::{DiError, DiResult};
use crate::graph::GraphInner;
use crate::key::BindingKey;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A deferred accessor to one binding.
///
/// Obtaining a `Provider` never constructs anything; the underlying value
/// is resolved on each [`get`](Provider::get). For a singleton binding all
/// invocations return the same instance; for an unscoped binding each
/// invocation constructs a fresh one.
pub struct Provider<T> {
	deferred: Deferred,
	_marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Provider<T> {
	fn clone(&self) -> Self {
		Self {
			deferred: self.deferred.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T> fmt::Debug for Provider<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Provider<{}>", std::any::type_name::<T>())
	}
}

impl<T: Send + Sync + 'static> Provider<T> {
	pub(crate) fn new(deferred: Deferred) -> Self {
		Self {
			deferred,
			_marker: PhantomData,
		}
	}

	/// Resolve the underlying binding now.
	pub fn get(&self) -> DiResult<Arc<T>> {
		let instance = self.deferred.resolve()?;
		instance.downcast::<T>().map_err(|_| DiError::TypeMismatch {
			key: self.deferred.key.to_string(),
		})
	}
}

/// Untyped deferred accessor. This is the erased value the engine hands
/// out for a deferred key; it keeps the graph alive until dropped.
#[derive(Clone)]
pub(crate) struct Deferred {
	pub(crate) graph: Arc<GraphInner>,
	pub(crate) key: BindingKey,
}

impl Deferred {
	fn resolve(&self) -> DiResult<Instance> {
		GraphInner::resolve_root(&self.graph, &self.key)
	}
}

/// How one typed factory parameter is keyed and recovered from an erased
/// instance.
pub trait FromInstance: Sized + Send + Sync + 'static {
	/// The key this parameter asks the graph for.
	fn key() -> BindingKey;

	/// Recover the typed value from the erased instance resolved for
	/// [`key`](FromInstance::key).
	fn from_instance(instance: Instance) -> DiResult<Self>;
}

impl<T: Send + Sync + 'static> FromInstance for Arc<T> {
	fn key() -> BindingKey {
		BindingKey::of::<T>()
	}

	fn from_instance(instance: Instance) -> DiResult<Self> {
		instance.downcast::<T>().map_err(|_| DiError::TypeMismatch {
			key: Self::key().to_string(),
		})
	}
}

impl<T: Send + Sync + 'static> FromInstance for Provider<T> {
	fn key() -> BindingKey {
		BindingKey::of::<T>().as_deferred()
	}

	fn from_instance(instance: Instance) -> DiResult<Self> {
		let deferred = instance
			.downcast::<Deferred>()
			.map_err(|_| DiError::TypeMismatch {
				key: Self::key().to_string(),
			})?;
		Ok(Provider::new((*deferred).clone()))
	}
}

/// Lets member-injection targets hold `Option<Arc<T>>` fields that start
/// out `None`; a successful resolution always assigns `Some`.
impl<V: FromInstance> FromInstance for Option<V> {
	fn key() -> BindingKey {
		V::key()
	}

	fn from_instance(instance: Instance) -> DiResult<Self> {
		V::from_instance(instance).map(Some)
	}
}

/// An ordered list of typed factory parameters, implemented for tuples of
/// 0 to 8 [`FromInstance`] elements.
pub trait DepList: Sized {
	/// The dependency keys, in parameter order.
	fn keys() -> Vec<BindingKey>;

	/// Recover the typed tuple from instances resolved in key order.
	fn from_instances(values: &[Instance]) -> DiResult<Self>;
}

/// A callable taking its parameters as one tuple; implemented for plain
/// closures of 0 to 8 parameters so factories read naturally at the call
/// site.
pub trait Callable<Args, Out> {
	fn call(&self, args: Args) -> Out;
}

fn next_instance<V: FromInstance>(values: &mut std::slice::Iter<'_, Instance>) -> DiResult<V> {
	let instance = values.next().cloned().ok_or_else(|| DiError::TypeMismatch {
		key: V::key().to_string(),
	})?;
	V::from_instance(instance)
}

macro_rules! callable_tuple {
	( $($param:ident)* ) => {
		impl<Func, Out, $($param,)*> Callable<($($param,)*), Out> for Func
		where
			Func: Fn($($param),*) -> Out,
		{
			#[inline]
			#[allow(non_snake_case)]
			fn call(&self, ($($param,)*): ($($param,)*)) -> Out {
				(self)($($param,)*)
			}
		}

		#[allow(non_snake_case, unused_variables, unused_mut)]
		impl<$($param: FromInstance,)*> DepList for ($($param,)*) {
			fn keys() -> Vec<BindingKey> {
				vec![$($param::key(),)*]
			}

			fn from_instances(values: &[Instance]) -> DiResult<Self> {
				let mut values = values.iter();
				Ok(($(next_instance::<$param>(&mut values)?,)*))
			}
		}
	};
}

callable_tuple!();
callable_tuple!(A);
callable_tuple!(A B);
callable_tuple!(A B C);
callable_tuple!(A B C D);
callable_tuple!(A B C D E);
callable_tuple!(A B C D E F);
callable_tuple!(A B C D E F G);
callable_tuple!(A B C D E F G H);

/// Erase a typed factory into dependency keys plus a shared-value factory.
pub(crate) fn erase_factory<Out, Args, F>(factory: F) -> (Vec<BindingKey>, Factory)
where
	Out: Send + Sync + 'static,
	Args: DepList,
	F: Callable<Args, Out> + Send + Sync + 'static,
{
	let erased: Factory = Arc::new(move |values: &[Instance]| {
		let args = Args::from_instances(values)?;
		Ok(Arc::new(factory.call(args)) as Instance)
	});
	(Args::keys(), erased)
}

/// Erase a typed constructor into dependency keys plus a boxed-value
/// factory, leaving the value mutable for member injection.
pub(crate) fn erase_constructor<Out, Args, F>(construct: F) -> (Vec<BindingKey>, BoxFactory)
where
	Out: Send + Sync + 'static,
	Args: DepList,
	F: Callable<Args, Out> + Send + Sync + 'static,
{
	let erased: BoxFactory = Arc::new(move |values: &[Instance]| {
		let args = Args::from_instances(values)?;
		Ok(Box::new(construct.call(args)) as BoxedInstance)
	});
	(Args::keys(), erased)
}
