//! Built-in policy evaluators
//!
//! Small decision functions covering the common cases; deployments with
//! richer rules plug in their own [`PolicyHandle`] implementations.

use crate::decision::{DecisionInput, PolicyHandle};
use async_trait::async_trait;
use eddy_core::Result;
use tracing::trace;

/// Permits every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PolicyHandle for AllowAll {
    async fn evaluate(&self, _input: &DecisionInput) -> Result<bool> {
        Ok(true)
    }
}

/// Denies every operation. Useful for freezing a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl PolicyHandle for DenyAll {
    async fn evaluate(&self, _input: &DecisionInput) -> Result<bool> {
        Ok(false)
    }
}

/// Allows reads for any member; gates mutating operations behind a role.
///
/// Document creation and invite consumption are also mutating, so a document
/// governed by this policy only accepts new members whose prospective role
/// set already carries the required role (i.e. invites granting it).
#[derive(Debug, Clone)]
pub struct RoleGated {
    required_role: String,
}

impl RoleGated {
    /// Gate mutating operations behind the given role.
    pub fn new(required_role: impl Into<String>) -> Self {
        Self {
            required_role: required_role.into(),
        }
    }
}

#[async_trait]
impl PolicyHandle for RoleGated {
    async fn evaluate(&self, input: &DecisionInput) -> Result<bool> {
        if !input.operation.is_mutating() {
            return Ok(true);
        }
        let allowed = input.roles.contains(&self.required_role);
        trace!(
            operation = %input.operation,
            actor_id = %input.actor_id,
            allowed,
            "role-gated decision"
        );
        Ok(allowed)
    }
}
