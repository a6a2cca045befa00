//! `ChangeStore` trait definition and its row/result types.

use async_trait::async_trait;
use eddy_core::{ActorId, AuthToken, DocId, InviteId, Result, RoleSet};
use serde::{Deserialize, Serialize};

/// Identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Document the token is scoped to
    pub doc_id: DocId,
    /// Actor the token authenticates
    pub actor_id: ActorId,
    /// Roles held by that actor
    pub roles: RoleSet,
}

/// Parameters for creating a document with its initial admin actor.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Identifier of the initial actor (caller-supplied)
    pub actor_id: ActorId,
    /// Initial changes contributed by that actor; may be empty
    pub changes: Vec<Vec<u8>>,
    /// Policy governing the document, fixed for its lifetime
    pub policy_id: String,
}

/// Result of creating a document.
#[derive(Debug, Clone)]
pub struct DocumentCreated {
    /// Generated document identifier
    pub doc_id: DocId,
    /// Identifier of the admin actor
    pub actor_id: ActorId,
    /// Fresh bearer token for the admin actor
    pub token: AuthToken,
    /// Offset the next appended change will receive
    pub next_offset: u64,
}

/// Result of appending changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Number of changes inserted by this call
    pub changes_added: u64,
    /// Offset the next appended change will receive
    pub next_offset: u64,
}

/// One stored change, with its attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChange {
    /// 1-based position in the document's append log; stable once assigned
    pub offset: u64,
    /// Actor the change is attributed to
    pub actor_id: ActorId,
    /// Insertion time, unix seconds
    pub created_at: i64,
    /// Opaque change bytes, exactly as supplied
    pub payload: Vec<u8>,
}

/// Result of a fetch: a consistent snapshot of changes at or above the
/// requested offset, plus the next offset as of that snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Matching changes in ascending offset order
    pub changes: Vec<StoredChange>,
    /// One more than the highest offset stored for the document
    pub next_offset: u64,
}

/// Result of creating an invite.
#[derive(Debug, Clone)]
pub struct InviteCreated {
    /// Generated invite identifier
    pub invite_id: InviteId,
    /// Roles the invite grants on consumption
    pub roles: RoleSet,
    /// Free-text note, if any
    pub note: Option<String>,
    /// Remaining uses (1 for a fresh single-use invite)
    pub uses_remaining: u32,
}

/// Result of consuming an invite.
#[derive(Debug, Clone)]
pub struct InviteConsumed {
    /// Fresh bearer token for the newly created actor
    pub token: AuthToken,
    /// Remaining uses after this consumption
    pub uses_remaining: u32,
}

/// Abstract transactional storage for documents, actors, changes and invites.
///
/// Every operation is atomic: fully applied or fully rolled back. Callers
/// must treat each call as potentially suspending (the durable backend does
/// real I/O) and must not hold one open across unrelated work.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ChangeStore: Send + Sync + 'static {
    /// Resolves a bearer token to the identity it authenticates.
    ///
    /// Read-only; `Ok(None)` when the token is unknown.
    async fn resolve_token(&self, token: &AuthToken) -> Result<Option<AuthContext>>;

    /// Returns the policy identifier governing a document.
    ///
    /// Read-only; `Ok(None)` when the document does not exist.
    async fn document_policy(&self, doc_id: DocId) -> Result<Option<String>>;

    /// Atomically creates a document, its admin actor (role `admin`, fresh
    /// token) and the actor's initial changes.
    ///
    /// Never partially applies: there is no document without its admin
    /// actor, and no actor without its token.
    async fn create_document(&self, new_doc: NewDocument) -> Result<DocumentCreated>;

    /// Atomically inserts changes attributed to the given actor, assigning
    /// each a distinct offset strictly greater than all previously stored
    /// offsets for the document, in the order supplied.
    ///
    /// Fails with a storage error when the document (or the actor within it)
    /// does not exist; existence is enforced inside the same transaction as
    /// the insert, not pre-validated.
    async fn append_changes(
        &self,
        doc_id: DocId,
        actor_id: &ActorId,
        changes: Vec<Vec<u8>>,
    ) -> Result<AppendOutcome>;

    /// Returns every change with offset ≥ `from_offset` (inclusive) in
    /// ascending order, plus the current next offset, from one consistent
    /// snapshot.
    ///
    /// `from_offset` equal to the current next offset yields an empty batch
    /// with the same next offset: the idempotent "nothing new yet" read.
    async fn get_changes(&self, doc_id: DocId, from_offset: u64) -> Result<ChangeBatch>;

    /// Creates a single-use invite attributed to `created_by`.
    async fn create_invite(
        &self,
        doc_id: DocId,
        created_by: &ActorId,
        roles: RoleSet,
        note: Option<String>,
    ) -> Result<InviteCreated>;

    /// Atomically checks `uses_remaining > 0`, decrements it, and creates a
    /// new actor carrying the invite's roles and a fresh token.
    ///
    /// An absent invite and an exhausted one both fail as `NotFound` with no
    /// state change; exactly one of any set of concurrent consumers wins the
    /// last remaining use.
    async fn consume_invite(
        &self,
        doc_id: DocId,
        invite_id: InviteId,
        new_actor_id: ActorId,
    ) -> Result<InviteConsumed>;
}
