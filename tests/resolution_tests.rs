//! Recursive resolution: construction order, freshness, qualifiers,
//! unresolved keys and cycles

use grappelli::{Bindings, DiError, Module, ObjectGraph};
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Engine;

struct Car {
	engine: Arc<Engine>,
}

#[derive(Default)]
struct ChainModule {
	log: Arc<Mutex<Vec<&'static str>>>,
}

impl Module for ChainModule {
	fn configure(&self, bindings: &mut Bindings) {
		let log = Arc::clone(&self.log);
		bindings.provide(move || {
			log.lock().unwrap().push("engine");
			Engine
		});
		let log = Arc::clone(&self.log);
		bindings.provide(move |engine: Arc<Engine>| {
			log.lock().unwrap().push("car");
			Car { engine }
		});
		bindings.entry_point::<Car>();
	}
}

#[rstest]
fn dependencies_construct_bottom_up() {
	// Arrange
	let module = ChainModule::default();
	let log = Arc::clone(&module.log);
	let graph = ObjectGraph::build(&[&module]).unwrap();

	// Act
	let _car = graph.get::<Car>().unwrap();

	// Assert
	assert_eq!(*log.lock().unwrap(), vec!["engine", "car"]);
}

#[rstest]
fn unscoped_bindings_yield_fresh_instances() {
	// Arrange
	let module = ChainModule::default();
	let graph = ObjectGraph::build(&[&module]).unwrap();

	// Act
	let first = graph.get::<Car>().unwrap();
	let second = graph.get::<Car>().unwrap();

	// Assert: both the value and its dependency are fresh
	assert!(!Arc::ptr_eq(&first, &second));
	assert!(!Arc::ptr_eq(&first.engine, &second.engine));
}

struct Counted;

struct CountingModule {
	constructions: Arc<AtomicUsize>,
}

impl Module for CountingModule {
	fn configure(&self, bindings: &mut Bindings) {
		let constructions = Arc::clone(&self.constructions);
		bindings.provide(move || {
			constructions.fetch_add(1, Ordering::SeqCst);
			Counted
		});
		bindings.entry_point::<Counted>();
	}
}

#[rstest]
fn each_unscoped_request_reruns_the_factory() {
	// Arrange
	let constructions = Arc::new(AtomicUsize::new(0));
	let module = CountingModule {
		constructions: Arc::clone(&constructions),
	};
	let graph = ObjectGraph::build(&[&module]).unwrap();

	// Act
	for _ in 0..3 {
		let _ = graph.get::<Counted>().unwrap();
	}

	// Assert
	assert_eq!(constructions.load(Ordering::SeqCst), 3);
}

struct Shard(u32);

struct ShardConsumer {
	plain: Arc<Shard>,
	primary: Arc<Shard>,
	replica: Arc<Shard>,
}

struct QualifiedModule;

impl Module for QualifiedModule {
	fn configure(&self, bindings: &mut Bindings) {
		bindings.provide(|| Shard(0));
		bindings.provide(|| Shard(1)).named("primary");
		bindings.provide(|| Shard(2)).named("replica");
		bindings
			.provide(|plain: Arc<Shard>, primary: Arc<Shard>, replica: Arc<Shard>| {
				ShardConsumer {
					plain,
					primary,
					replica,
				}
			})
			.named_dependency(1, "primary")
			.named_dependency(2, "replica");
		bindings.entry_point::<ShardConsumer>();
	}
}

#[rstest]
fn qualified_bindings_resolve_by_name() {
	// Arrange
	let graph = ObjectGraph::build(&[&QualifiedModule]).unwrap();

	// Act
	let consumer = graph.get::<ShardConsumer>().unwrap();

	// Assert
	assert_eq!(consumer.plain.0, 0);
	assert_eq!(consumer.primary.0, 1);
	assert_eq!(consumer.replica.0, 2);
}

#[derive(Debug)]
struct Missing;

#[derive(Debug)]
struct Needy {
	#[allow(dead_code)]
	missing: Arc<Missing>,
}

struct NeedyModule;

impl Module for NeedyModule {
	fn configure(&self, bindings: &mut Bindings) {
		bindings.provide(|missing: Arc<Missing>| Needy { missing });
		bindings.entry_point::<Needy>();
	}
}

#[rstest]
fn unresolved_dependency_names_the_requesting_site() {
	// Arrange
	let graph = ObjectGraph::build(&[&NeedyModule]).unwrap();

	// Act
	let error = graph.get::<Needy>().unwrap_err();

	// Assert
	match error {
		DiError::UnresolvedBinding { key, requested_by } => {
			assert!(key.contains("Missing"));
			assert!(requested_by.contains("Needy"));
		}
		other => panic!("expected UnresolvedBinding, got {other:?}"),
	}
}

#[derive(Debug)]
struct Chicken {
	#[allow(dead_code)]
	egg: Arc<Egg>,
}

#[derive(Debug)]
struct Egg {
	#[allow(dead_code)]
	chicken: Arc<Chicken>,
}

struct CyclicModule;

impl Module for CyclicModule {
	fn configure(&self, bindings: &mut Bindings) {
		bindings.provide(|egg: Arc<Egg>| Chicken { egg });
		bindings.provide(|chicken: Arc<Chicken>| Egg { chicken });
		bindings.entry_point::<Chicken>();
	}
}

#[rstest]
fn cyclic_dependencies_are_reported_with_their_path() {
	// Arrange
	let graph = ObjectGraph::build(&[&CyclicModule]).unwrap();

	// Act
	let error = graph.get::<Chicken>().unwrap_err();

	// Assert
	match error {
		DiError::CyclicDependency { path, .. } => {
			assert!(path.contains("Chicken"));
			assert!(path.contains("Egg"));
			assert!(path.contains(" -> "));
		}
		other => panic!("expected CyclicDependency, got {other:?}"),
	}
}
