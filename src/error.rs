//! Error types for graph construction and resolution

use thiserror::Error;

/// Convenient result alias for all graph operations.
pub type DiResult<T> = Result<T, DiError>;

/// Errors raised while building or resolving an object graph.
///
/// Every failure is reported synchronously to the caller that triggered it;
/// nothing is retried and no partial value is ever published.
#[derive(Debug, Error)]
pub enum DiError {
	/// Two non-override modules declared a binding for the same key.
	#[error(
		"duplicate binding for {key}\n  first declared by {first}\n  also declared by {second}\nMark one of the modules as an override if the replacement is intentional."
	)]
	DuplicateBinding {
		key: String,
		first: String,
		second: String,
	},

	/// A requested key has no binding and no just-in-time fallback.
	#[error("no binding found for {key}\n  required by: {requested_by}")]
	UnresolvedBinding { key: String, requested_by: String },

	/// The type is a registered injection target but cannot be constructed
	/// by the graph.
	#[error("cannot construct {type_name}: {reason}")]
	UnsupportedType {
		type_name: &'static str,
		reason: &'static str,
	},

	/// Resolution revisited a key already under construction.
	#[error("circular dependency detected for {key}\n  resolution path: {path}")]
	CyclicDependency { key: String, path: String },

	/// The resolution stack grew past the depth guard.
	#[error(
		"maximum resolution depth exceeded ({0} levels)\nThis usually indicates an extremely deep or unintentionally recursive dependency chain."
	)]
	MaxDepthExceeded(usize),

	/// `get`/`provider` was called for a type no module declared as an
	/// entry point.
	#[error("{type_name} is not a declared entry point of this graph")]
	NotAnEntryPoint { type_name: &'static str },

	/// A resolved value did not have the concrete type its key promised.
	#[error("value resolved for {key} has an unexpected concrete type")]
	TypeMismatch { key: String },
}
