//! Singleton scope: per-graph memoization of singleton-keyed values

use crate::binding::Instance;
use crate::error::DiResult;
use crate::key::BindingKey;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Memoizes singleton-scoped values for the lifetime of one graph.
///
/// Each key gets its own compute-once slot, so a first-access race
/// constructs exactly one value: the loser blocks on the winner's slot
/// and receives the winner's instance. Unrelated singletons never
/// serialize each other; the map lock only guards slot creation.
pub(crate) struct SingletonScope {
	slots: RwLock<HashMap<BindingKey, Arc<OnceCell<Instance>>>>,
}

impl SingletonScope {
	pub(crate) fn new() -> Self {
		Self {
			slots: RwLock::new(HashMap::new()),
		}
	}

	/// Return the memoized value for `key`, computing it at most once.
	///
	/// A failed computation publishes nothing; the slot stays empty and a
	/// later access retries.
	pub(crate) fn get_or_create(
		&self,
		key: &BindingKey,
		init: impl FnOnce() -> DiResult<Instance>,
	) -> DiResult<Instance> {
		let slot = self.slot(key);
		let mut computed = false;
		let value = slot.get_or_try_init(|| {
			computed = true;
			init()
		})?;
		if computed {
			debug!(key = %key, "singleton published");
		}
		Ok(Arc::clone(value))
	}

	fn slot(&self, key: &BindingKey) -> Arc<OnceCell<Instance>> {
		if let Some(slot) = self
			.slots
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
		{
			return Arc::clone(slot);
		}
		let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
		Arc::clone(slots.entry(key.clone()).or_default())
	}

	#[cfg(test)]
	fn is_published(&self, key: &BindingKey) -> bool {
		self.slots
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.is_some_and(|slot| slot.get().is_some())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::DiError;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct Token;

	fn token_instance() -> Instance {
		Arc::new(Token)
	}

	#[rstest]
	fn computes_once_per_key() {
		// Arrange
		let scope = SingletonScope::new();
		let key = BindingKey::of::<Token>();
		let calls = AtomicUsize::new(0);

		// Act
		let first = scope.get_or_create(&key, || {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(token_instance())
		});
		let second = scope.get_or_create(&key, || {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(token_instance())
		});

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
	}

	#[rstest]
	fn distinct_keys_use_distinct_slots() {
		// Arrange
		let scope = SingletonScope::new();
		let plain = BindingKey::of::<Token>();
		let named = BindingKey::named::<Token>("spare");

		// Act
		let first = scope.get_or_create(&plain, || Ok(token_instance())).unwrap();
		let second = scope.get_or_create(&named, || Ok(token_instance())).unwrap();

		// Assert
		assert!(!Arc::ptr_eq(&first, &second));
	}

	#[rstest]
	fn failed_init_publishes_nothing_and_retries() {
		// Arrange
		let scope = SingletonScope::new();
		let key = BindingKey::of::<Token>();

		// Act
		let failed = scope.get_or_create(&key, || {
			Err(DiError::MaxDepthExceeded(1))
		});

		// Assert
		assert!(failed.is_err());
		assert!(!scope.is_published(&key));

		// Act: a later access retries and succeeds
		let retried = scope.get_or_create(&key, || Ok(token_instance()));
		assert!(retried.is_ok());
		assert!(scope.is_published(&key));
	}

	#[rstest]
	fn concurrent_first_access_computes_once() {
		// Arrange
		let scope = Arc::new(SingletonScope::new());
		let key = BindingKey::of::<Token>();
		let calls = Arc::new(AtomicUsize::new(0));
		let barrier = Arc::new(std::sync::Barrier::new(8));

		// Act
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let scope = Arc::clone(&scope);
				let key = key.clone();
				let calls = Arc::clone(&calls);
				let barrier = Arc::clone(&barrier);
				std::thread::spawn(move || {
					barrier.wait();
					scope
						.get_or_create(&key, || {
							calls.fetch_add(1, Ordering::SeqCst);
							std::thread::sleep(std::time::Duration::from_millis(10));
							Ok(token_instance())
						})
						.unwrap()
				})
			})
			.collect();
		let instances: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		for instance in &instances[1..] {
			assert!(Arc::ptr_eq(&instances[0], instance));
		}
	}
}
