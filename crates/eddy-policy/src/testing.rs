//! Test fixtures for crates that need a working resolver
//!
//! Enabled with the `testing` feature so integration tests across the
//! workspace share one canonical fixture instead of re-registering policies.

use crate::builtin::{AllowAll, DenyAll, RoleGated};
use crate::registry::StaticPolicyResolver;
use std::sync::Arc;

/// Identifier of the permissive test policy.
pub const ALLOW_ALL: &str = "allow-all";

/// Identifier of the deny-everything test policy.
pub const DENY_ALL: &str = "deny-all";

/// Identifier of the admin-gated test policy.
pub const ADMIN_WRITES: &str = "admin-writes";

/// Resolver with the standard test policies registered.
pub fn test_resolver() -> Arc<StaticPolicyResolver> {
    StaticPolicyResolver::builder()
        .register(ALLOW_ALL, AllowAll)
        .register(DENY_ALL, DenyAll)
        .register(ADMIN_WRITES, RoleGated::new(eddy_core::ADMIN_ROLE))
        .build()
}
