//! Property-based tests for object-graph invariants

use grappelli::{Bindings, Module, ObjectGraph};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Value(&'static str);

struct CountingModule {
	constructions: Arc<AtomicUsize>,
	singleton: bool,
}

impl Module for CountingModule {
	fn configure(&self, bindings: &mut Bindings) {
		let constructions = Arc::clone(&self.constructions);
		let provide = bindings.provide(move || {
			constructions.fetch_add(1, Ordering::SeqCst);
			Value("base")
		});
		if self.singleton {
			let _ = provide.singleton();
		}
		bindings.entry_point::<Value>();
	}
}

struct OverridingModule(&'static str);

impl Module for OverridingModule {
	fn configure(&self, bindings: &mut Bindings) {
		let label = self.0;
		bindings.provide(move || Value(label));
	}

	fn is_override(&self) -> bool {
		true
	}
}

proptest! {
	/// However many times a singleton entry point is requested, the
	/// factory runs once and every caller sees the same instance.
	#[test]
	fn singleton_resolution_is_idempotent(requests in 1usize..32) {
		let constructions = Arc::new(AtomicUsize::new(0));
		let module = CountingModule {
			constructions: Arc::clone(&constructions),
			singleton: true,
		};
		let graph = ObjectGraph::build(&[&module]).unwrap();

		let instances: Vec<Arc<Value>> = (0..requests)
			.map(|_| graph.get::<Value>().unwrap())
			.collect();

		prop_assert_eq!(constructions.load(Ordering::SeqCst), 1);
		for instance in &instances[1..] {
			prop_assert!(Arc::ptr_eq(&instances[0], instance));
		}
	}

	/// Unscoped resolution constructs exactly one fresh value per request.
	#[test]
	fn unscoped_resolution_is_linear_in_requests(requests in 1usize..32) {
		let constructions = Arc::new(AtomicUsize::new(0));
		let module = CountingModule {
			constructions: Arc::clone(&constructions),
			singleton: false,
		};
		let graph = ObjectGraph::build(&[&module]).unwrap();

		let instances: Vec<Arc<Value>> = (0..requests)
			.map(|_| graph.get::<Value>().unwrap())
			.collect();

		prop_assert_eq!(constructions.load(Ordering::SeqCst), requests);
		for (index, instance) in instances.iter().enumerate() {
			for other in &instances[index + 1..] {
				prop_assert!(!Arc::ptr_eq(instance, other));
			}
		}
	}

	/// The override's value wins no matter where the override module sits
	/// in the argument list.
	#[test]
	fn override_precedence_is_order_independent(position in 0usize..2) {
		let constructions = Arc::new(AtomicUsize::new(0));
		let base = CountingModule {
			constructions: Arc::clone(&constructions),
			singleton: false,
		};
		let replacement = OverridingModule("replacement");

		let graph = match position {
			0 => ObjectGraph::build(&[&base, &replacement]).unwrap(),
			_ => ObjectGraph::build(&[&replacement, &base]).unwrap(),
		};

		prop_assert_eq!(graph.get::<Value>().unwrap().0, "replacement");
		prop_assert_eq!(constructions.load(Ordering::SeqCst), 0);
	}

	/// Validation is repeatable and free of side effects.
	#[test]
	fn validation_has_no_side_effects(validations in 1usize..8) {
		let constructions = Arc::new(AtomicUsize::new(0));
		let module = CountingModule {
			constructions: Arc::clone(&constructions),
			singleton: true,
		};
		let graph = ObjectGraph::build(&[&module]).unwrap();

		for _ in 0..validations {
			prop_assert!(graph.validate().is_ok());
		}
		prop_assert_eq!(constructions.load(Ordering::SeqCst), 0);
	}
}
