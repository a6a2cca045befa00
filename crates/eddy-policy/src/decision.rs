//! Decision input and the evaluator/resolver contracts

use async_trait::async_trait;
use eddy_core::{ActorId, DocId, Result, RoleSet};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The kind of operation a policy is asked to rule on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    /// Create a new document (the subject is the prospective admin actor)
    CreateDocument,
    /// Append changes to an existing document
    AppendChanges,
    /// Fetch changes from a document
    FetchChanges,
    /// Create an invite for a document
    CreateInvite,
    /// Consume an invite (the subject is the prospective new actor)
    ConsumeInvite,
}

impl Operation {
    /// Whether the operation mutates durable state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::FetchChanges)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateDocument => "create_document",
            Self::AppendChanges => "append_changes",
            Self::FetchChanges => "fetch_changes",
            Self::CreateInvite => "create_invite",
            Self::ConsumeInvite => "consume_invite",
        };
        write!(f, "{name}")
    }
}

/// Structured description of an attempted operation, handed to a policy.
///
/// `doc_id` is `None` only for document creation, where the target document
/// does not exist yet.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionInput {
    /// Requesting (or prospective) actor
    pub actor_id: ActorId,
    /// Roles held by the subject; empty for a prospective invite consumer
    pub roles: RoleSet,
    /// Operation being attempted
    pub operation: Operation,
    /// Target document, when it already exists
    pub doc_id: Option<DocId>,
}

/// A loaded policy decision function.
///
/// Evaluation must be deterministic for identical input and side-effect free
/// from the store's perspective. An evaluation failure is surfaced as an
/// error and never collapsed to allow or deny by the caller.
#[async_trait]
pub trait PolicyHandle: Send + Sync + fmt::Debug {
    /// Evaluate the policy against the described operation.
    async fn evaluate(&self, input: &DecisionInput) -> Result<bool>;
}

/// Lookup of loaded policies by identifier.
pub trait PolicyResolver: Send + Sync {
    /// Identifiers of the currently loaded policies.
    fn policy_ids(&self) -> Vec<String>;

    /// Resolve an identifier to an evaluator; `NotFound` if unregistered.
    fn get_policy(&self, policy_id: &str) -> Result<Arc<dyn PolicyHandle>>;
}
