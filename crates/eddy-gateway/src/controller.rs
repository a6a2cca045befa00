//! The gateway controller: authenticate, authorize, execute.

use eddy_core::{ActorId, AuthToken, DocId, EddyError, InviteId, Result, RoleSet};
use eddy_policy::{DecisionInput, Operation, PolicyHandle, PolicyResolver};
use eddy_store::{
    AppendOutcome, AuthContext, ChangeBatch, ChangeStore, DocumentCreated, InviteCreated,
    InviteConsumed, NewDocument,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Parameters for the document-creation operation.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    /// Identifier the caller chose for the initial admin actor
    pub actor_id: ActorId,
    /// Initial changes; may be empty
    pub changes: Vec<Vec<u8>>,
    /// Policy governing the new document; must be loaded in the resolver
    pub policy_id: String,
}

/// Authorization gateway over the change log store.
///
/// Pure coordination: resolves tokens, evaluates policies, delegates to the
/// store. Cheap to clone and share across request handlers.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn ChangeStore>,
    policies: Arc<dyn PolicyResolver>,
}

impl Gateway {
    /// Build a gateway over the given store and policy resolver.
    pub fn new(store: Arc<dyn ChangeStore>, policies: Arc<dyn PolicyResolver>) -> Self {
        Self { store, policies }
    }

    /// Create a document with its initial admin actor and changes.
    ///
    /// Bootstrap operation: no authentication. The supplied policy id must
    /// resolve before anything is written, so an unknown policy leaves the
    /// store untouched.
    #[instrument(skip(self, request), fields(policy_id = %request.policy_id))]
    pub async fn create_document(&self, request: CreateDocumentRequest) -> Result<DocumentCreated> {
        let policy = self.policies.get_policy(&request.policy_id)?;
        let input = DecisionInput {
            actor_id: request.actor_id.clone(),
            roles: RoleSet::admin(),
            operation: Operation::CreateDocument,
            doc_id: None,
        };
        enforce(policy.as_ref(), &input).await?;

        self.store
            .create_document(NewDocument {
                actor_id: request.actor_id,
                changes: request.changes,
                policy_id: request.policy_id,
            })
            .await
    }

    /// Append changes to a document as the authenticated actor.
    #[instrument(skip(self, bearer, changes), fields(%doc_id, count = changes.len()))]
    pub async fn append_changes(
        &self,
        bearer: Option<&str>,
        doc_id: DocId,
        changes: Vec<Vec<u8>>,
    ) -> Result<AppendOutcome> {
        let ctx = self.authenticate(bearer, doc_id).await?;
        self.authorize(doc_id, &ctx.actor_id, ctx.roles.clone(), Operation::AppendChanges)
            .await?;
        self.store.append_changes(doc_id, &ctx.actor_id, changes).await
    }

    /// Fetch changes with offset ≥ `from_offset` as the authenticated actor.
    #[instrument(skip(self, bearer), fields(%doc_id, from_offset))]
    pub async fn fetch_changes(
        &self,
        bearer: Option<&str>,
        doc_id: DocId,
        from_offset: u64,
    ) -> Result<ChangeBatch> {
        let ctx = self.authenticate(bearer, doc_id).await?;
        self.authorize(doc_id, &ctx.actor_id, ctx.roles.clone(), Operation::FetchChanges)
            .await?;
        self.store.get_changes(doc_id, from_offset).await
    }

    /// Create a single-use invite as the authenticated actor.
    #[instrument(skip(self, bearer, roles, note), fields(%doc_id))]
    pub async fn create_invite(
        &self,
        bearer: Option<&str>,
        doc_id: DocId,
        roles: RoleSet,
        note: Option<String>,
    ) -> Result<InviteCreated> {
        let ctx = self.authenticate(bearer, doc_id).await?;
        self.authorize(doc_id, &ctx.actor_id, ctx.roles.clone(), Operation::CreateInvite)
            .await?;
        self.store
            .create_invite(doc_id, &ctx.actor_id, roles, note)
            .await
    }

    /// Consume an invite, joining the document as `new_actor_id`.
    ///
    /// The invite id is the capability, so no bearer token is required; the
    /// document's policy is still consulted with the prospective actor
    /// (empty role set) as subject.
    #[instrument(skip(self), fields(%doc_id, %invite_id))]
    pub async fn consume_invite(
        &self,
        doc_id: DocId,
        invite_id: InviteId,
        new_actor_id: ActorId,
    ) -> Result<InviteConsumed> {
        self.authorize(doc_id, &new_actor_id, RoleSet::empty(), Operation::ConsumeInvite)
            .await?;
        self.store
            .consume_invite(doc_id, invite_id, new_actor_id)
            .await
    }

    /// Token → actor. Missing credential and bad credential are distinct
    /// failures; a token scoped to a different document does not apply here.
    async fn authenticate(&self, bearer: Option<&str>, doc_id: DocId) -> Result<AuthContext> {
        let token = bearer
            .ok_or_else(|| EddyError::unauthenticated("no bearer token supplied"))?;
        let ctx = self
            .store
            .resolve_token(&AuthToken::new(token))
            .await?
            .ok_or_else(|| EddyError::unauthorized("bearer token does not resolve"))?;
        if ctx.doc_id != doc_id {
            warn!(actor_id = %ctx.actor_id, "token presented against a foreign document");
            return Err(EddyError::unauthorized(
                "bearer token does not grant access to this document",
            ));
        }
        Ok(ctx)
    }

    /// Resolve the document's policy and evaluate it for the described
    /// operation. Must fully pass before any store mutation begins.
    async fn authorize(
        &self,
        doc_id: DocId,
        actor_id: &ActorId,
        roles: RoleSet,
        operation: Operation,
    ) -> Result<()> {
        let policy_id = self
            .store
            .document_policy(doc_id)
            .await?
            .ok_or_else(|| EddyError::not_found(format!("document {doc_id} not found")))?;
        let policy = self.policies.get_policy(&policy_id)?;
        let input = DecisionInput {
            actor_id: actor_id.clone(),
            roles,
            operation,
            doc_id: Some(doc_id),
        };
        enforce(policy.as_ref(), &input).await
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

/// Run one policy evaluation and map the outcome.
///
/// An evaluation failure surfaces as `Internal`: it is never collapsed into
/// an allow or a deny.
async fn enforce(policy: &dyn PolicyHandle, input: &DecisionInput) -> Result<()> {
    let allowed = policy.evaluate(input).await.map_err(|err| {
        warn!(operation = %input.operation, error = %err, "policy evaluation failed");
        EddyError::internal(format!("policy evaluation failed: {err}"))
    })?;
    if allowed {
        debug!(operation = %input.operation, actor_id = %input.actor_id, "policy allowed");
        Ok(())
    } else {
        Err(EddyError::forbidden(format!(
            "policy denied {} for actor {}",
            input.operation, input.actor_id
        )))
    }
}
