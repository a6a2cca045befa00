//! Eddy core types
//!
//! Shared vocabulary for the eddy collaboration backend: identifier newtypes
//! for documents, actors, invites and bearer tokens, role-set helpers, and
//! the unified `EddyError` used across all crates.
//!
//! Changes themselves have no type here on purpose: the store and gateway
//! treat a change as an opaque `Vec<u8>` produced by an external CRDT engine
//! and never look inside it.

#![forbid(unsafe_code)]

/// Identifier newtypes for documents, actors, invites and tokens
pub mod identifiers;

/// Unified error type and result alias
pub mod errors;

/// Role-set helpers
pub mod roles;

pub use errors::{EddyError, Result};
pub use identifiers::{ActorId, AuthToken, DocId, InviteId};
pub use roles::{RoleSet, ADMIN_ROLE};
