//! Load-once policy registry
//!
//! The registry is explicit process-scoped state: policies are registered
//! through the builder during startup, the resolver is built exactly once,
//! and request-handling code can only read from it. There is no lazy loading
//! or mutation after build.

use crate::decision::{PolicyHandle, PolicyResolver};
use eddy_core::{EddyError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Immutable registry mapping policy identifiers to loaded evaluators.
pub struct StaticPolicyResolver {
    policies: HashMap<String, Arc<dyn PolicyHandle>>,
}

impl StaticPolicyResolver {
    /// Start building a resolver.
    pub fn builder() -> StaticPolicyResolverBuilder {
        StaticPolicyResolverBuilder {
            policies: HashMap::new(),
        }
    }
}

impl PolicyResolver for StaticPolicyResolver {
    fn policy_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.policies.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get_policy(&self, policy_id: &str) -> Result<Arc<dyn PolicyHandle>> {
        self.policies
            .get(policy_id)
            .cloned()
            .ok_or_else(|| EddyError::not_found(format!("policy {policy_id} not found")))
    }
}

impl std::fmt::Debug for StaticPolicyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticPolicyResolver")
            .field("policy_ids", &self.policy_ids())
            .finish()
    }
}

/// Builder collecting policies before the registry is frozen.
pub struct StaticPolicyResolverBuilder {
    policies: HashMap<String, Arc<dyn PolicyHandle>>,
}

impl StaticPolicyResolverBuilder {
    /// Register an evaluator under the given identifier.
    ///
    /// Registering the same identifier twice replaces the earlier evaluator,
    /// matching last-wins configuration file semantics.
    pub fn register(
        mut self,
        policy_id: impl Into<String>,
        policy: impl PolicyHandle + 'static,
    ) -> Self {
        let policy_id = policy_id.into();
        debug!(policy_id = %policy_id, "registering policy");
        self.policies.insert(policy_id, Arc::new(policy));
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> Arc<StaticPolicyResolver> {
        Arc::new(StaticPolicyResolver {
            policies: self.policies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{AllowAll, DenyAll};

    #[test]
    fn listed_ids_are_sorted() {
        let resolver = StaticPolicyResolver::builder()
            .register("writers-only", AllowAll)
            .register("allow-all", AllowAll)
            .build();
        assert_eq!(resolver.policy_ids(), vec!["allow-all", "writers-only"]);
    }

    #[test]
    fn unknown_policy_is_not_found() {
        let resolver = StaticPolicyResolver::builder().build();
        let err = resolver.get_policy("nope").unwrap_err();
        assert!(matches!(err, EddyError::NotFound { .. }));
    }

    #[test]
    fn re_registration_replaces() {
        let resolver = StaticPolicyResolver::builder()
            .register("p", AllowAll)
            .register("p", DenyAll)
            .build();
        assert_eq!(resolver.policy_ids(), vec!["p"]);
    }
}
