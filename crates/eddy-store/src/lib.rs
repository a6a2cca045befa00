//! Eddy change log store
//!
//! Durable, transactional storage of documents, actors, changes and invites.
//! This crate owns offset assignment and atomicity: every operation is fully
//! applied or fully rolled back, and per-document offsets are contiguous
//! (`1..=N`) because the document row carries an explicit next-offset counter
//! updated in the same transaction as the inserts it describes.
//!
//! The durable backend is [redb]: write transactions are serialized, which is
//! the sole mechanism preventing duplicate offsets and double-spent invites
//! under concurrency; read transactions observe an MVCC snapshot, so fetches
//! stay consistent while appends run.
//!
//! Change payloads are opaque byte blobs produced by an external CRDT engine;
//! nothing in this crate decodes them.

#![forbid(unsafe_code)]

/// The `ChangeStore` contract and its row/result types
pub mod traits;

/// Store configuration
pub mod config;

/// redb-backed store implementation
pub mod redb_store;

pub use config::StoreConfig;
pub use redb_store::RedbStore;
pub use traits::{
    AppendOutcome, AuthContext, ChangeBatch, ChangeStore, DocumentCreated, InviteCreated,
    InviteConsumed, NewDocument, StoredChange,
};

// Re-export core types
pub use eddy_core::{ActorId, AuthToken, DocId, EddyError, InviteId, Result, RoleSet};
