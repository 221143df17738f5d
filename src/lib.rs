//! Grappelli - a module-driven dependency-injection object graph
//!
//! Modules declare factory bindings and entry points; injectable types
//! register constructor and member metadata through a static, distributed
//! index; `ObjectGraph` ties both together with recursive resolution,
//! singleton memoization, deferred accessors, override modules, cycle
//! detection and a side-effect-free validation pass.
//!
//! # Features
//!
//! - **Typed factories**: bindings are plain closures; each parameter
//!   becomes a dependency resolved before the factory runs
//! - **Scopes**: unscoped (fresh value per resolution) and singleton
//!   (at-most-once construction per graph, safe under concurrent first
//!   access)
//! - **Just-in-time bindings**: types declared with [`injectable!`] are
//!   constructible without a module binding
//! - **Member injection**: [`ObjectGraph::inject`] assigns registered
//!   members into caller-owned values, base types first
//! - **Deferred accessors**: [`Provider<T>`] postpones construction and
//!   breaks cycles
//! - **Overrides**: override modules replace base bindings, for tests and
//!   environment swaps
//! - **Validation**: [`ObjectGraph::validate`] walks the whole graph
//!   without invoking a single factory
//!
//! # Example
//!
//! ```
//! use grappelli::{Bindings, Module, ObjectGraph};
//! use std::sync::Arc;
//!
//! struct Database { url: String }
//! struct Repository { db: Arc<Database> }
//!
//! struct AppModule;
//!
//! impl Module for AppModule {
//! 	fn configure(&self, bindings: &mut Bindings) {
//! 		bindings
//! 			.provide(|| Database { url: "postgres://localhost".into() })
//! 			.singleton();
//! 		bindings.provide(|db: Arc<Database>| Repository { db });
//! 		bindings.entry_point::<Repository>();
//! 	}
//! }
//!
//! # fn main() -> grappelli::DiResult<()> {
//! let graph = ObjectGraph::build(&[&AppModule])?;
//! graph.validate()?;
//!
//! let repository = graph.get::<Repository>()?;
//! assert_eq!(repository.db.url, "postgres://localhost");
//! # Ok(())
//! # }
//! ```
//!
//! Resolution is synchronous and lock-light: the registry takes a write
//! lock only when caching a just-in-time binding, and each singleton key
//! has its own compute-once slot, so unrelated singletons never serialize
//! each other.

mod binding;
mod error;
mod graph;
mod injectable;
mod key;
mod module;
mod provide;
mod registry;
mod resolve;
mod scope;

pub use binding::{BindingDescriptor, BindingOrigin, Factory, Instance, Scope};
pub use error::{DiError, DiResult};
pub use graph::ObjectGraph;
pub use injectable::{InjectableType, TypeDescriptor, TypeDescriptorBuilder};
pub use key::{BindingKey, Qualifier};
pub use module::{Bindings, EntryPoint, Module, Provide};
pub use provide::{Callable, DepList, FromInstance, Provider};

// Re-exported for `injectable!` expansions.
pub use inventory;
