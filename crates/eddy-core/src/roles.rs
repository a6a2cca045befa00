//! Role sets
//!
//! Roles are opaque strings assigned at actor creation time and immutable
//! afterwards; the backend never interprets them beyond set membership, which
//! is all a policy needs to make a decision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role granted to the initial actor of every new document.
pub const ADMIN_ROLE: &str = "admin";

/// An immutable set of opaque role strings held by one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Empty role set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Role set containing only `admin`
    pub fn admin() -> Self {
        Self::from_iter([ADMIN_ROLE])
    }

    /// Whether the set contains the given role
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Iterate over the roles in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of roles in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for role in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{role}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_set_contains_admin() {
        let roles = RoleSet::admin();
        assert!(roles.contains(ADMIN_ROLE));
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn duplicates_collapse() {
        let roles: RoleSet = ["editor", "editor", "viewer"].into_iter().collect();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles.to_string(), "editor,viewer");
    }
}
