//! Eddy policy layer
//!
//! Policy decisions are an injected capability: the gateway hands a
//! [`DecisionInput`] describing the attempted operation to a [`PolicyHandle`]
//! and gets back a plain allow/deny boolean. Nothing here knows how a policy
//! reaches its answer, so alternative decision backends (an embedded rules
//! engine, a compiled artifact runtime) can be substituted without touching
//! the gateway's state machine.
//!
//! Loaded policies live in a [`StaticPolicyResolver`]: built once at process
//! startup, immutable afterwards, and safely shared for concurrent read-only
//! evaluation.

#![forbid(unsafe_code)]

/// Decision input and the evaluator/resolver contracts
pub mod decision;

/// Load-once policy registry
pub mod registry;

/// Built-in evaluators
pub mod builtin;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builtin::{AllowAll, DenyAll, RoleGated};
pub use decision::{DecisionInput, Operation, PolicyHandle, PolicyResolver};
pub use registry::StaticPolicyResolver;

// Re-export core types
pub use eddy_core::{ActorId, DocId, EddyError, Result, RoleSet};
