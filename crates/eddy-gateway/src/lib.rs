//! Eddy authorization gateway
//!
//! The gateway is the coordination layer between a transport (HTTP or
//! otherwise) and the durable change log: it authenticates bearer tokens,
//! consults the document's policy at every checkpoint, and only then lets
//! the store apply the durable effect. It holds no persistent state of its
//! own; each operation is a fresh pass through the same three stages:
//!
//! 1. **Authenticate** — token → actor (skipped for document creation, not
//!    required for invite consumption).
//! 2. **Authorize** — resolve the document's policy id, evaluate it against
//!    a description of the attempted operation; `false` is `Forbidden`, an
//!    evaluation failure is `Internal` and never defaults to allow or deny.
//! 3. **Execute** — delegate to the store and return its result verbatim.

#![forbid(unsafe_code)]

/// Bearer-token extraction helpers
pub mod auth;

/// The gateway itself
pub mod controller;

pub use auth::bearer_from_header;
pub use controller::{CreateDocumentRequest, Gateway};

// Re-export the surface a transport layer needs
pub use eddy_core::{ActorId, AuthToken, DocId, EddyError, InviteId, Result, RoleSet};
pub use eddy_policy::{Operation, PolicyResolver};
pub use eddy_store::{
    AppendOutcome, ChangeBatch, ChangeStore, DocumentCreated, InviteCreated, InviteConsumed,
    StoredChange,
};
