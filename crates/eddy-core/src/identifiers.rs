//! Core identifier types used across the eddy backend
//!
//! Documents and invites are identified by generated UUIDs. Actor identifiers
//! are caller-supplied opaque strings (CRDT engines bring their own actor-id
//! formats), and bearer tokens are generated opaque strings used directly as
//! lookup keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Document identifier
///
/// Generated at document creation and immutable thereafter. Each document
/// owns its actors, its change log and its invites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(pub Uuid);

impl DocId {
    /// Create a new random document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for DocId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DocId> for Uuid {
    fn from(doc_id: DocId) -> Self {
        doc_id.0
    }
}

/// Invite identifier
///
/// Generated when an invite is created; scoped to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InviteId(pub Uuid);

impl InviteId {
    /// Create a new random invite ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InviteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InviteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for InviteId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<InviteId> for Uuid {
    fn from(invite_id: InviteId) -> Self {
        invite_id.0
    }
}

/// Actor identifier, unique within one document
///
/// Caller-supplied in most flows (the CRDT engine decides how it names
/// actors); `generate()` produces a fresh UUID-shaped one when the caller
/// does not care.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    /// Wrap a caller-supplied identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random actor ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Bearer token authenticating one actor
///
/// Globally unique, generated once at actor creation and never rotated. Used
/// directly as a lookup key, so the inner string is never logged.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthToken(pub String);

impl AuthToken {
    /// Wrap a token received from a caller
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Redacted Debug: tokens are credentials and must not leak into logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(..)")
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_round_trips_through_display() {
        let id = DocId::new();
        let parsed: DocId = id.to_string().parse().expect("display form parses");
        assert_eq!(id, parsed);
    }

    #[test]
    fn generated_tokens_are_unique() {
        let a = AuthToken::generate();
        let b = AuthToken::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::generate();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains(token.as_str()));
    }
}
