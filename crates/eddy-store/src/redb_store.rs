//! redb-backed implementation of [`ChangeStore`].
//!
//! Table layout (keys are UUIDs as `u128`, values are bincode-encoded rows):
//!
//! - `docs`:    doc_id            -> { policy_id, next_offset }
//! - `tokens`:  token string      -> { doc_id, actor_id }
//! - `actors`:  (doc_id, actor)   -> { roles, token }
//! - `changes`: (doc_id, offset)  -> { actor_id, created_at, payload }
//! - `invites`: (doc_id, invite)  -> { roles, note, uses_remaining, ... }
//!
//! The `next_offset` counter lives on the document row and is read and
//! advanced inside the same write transaction as the change inserts, so
//! offsets are contiguous per document and two concurrent appends can never
//! observe overlapping offset windows. redb serializes write transactions,
//! which also makes invite consumption exactly-once without extra locking.
//!
//! redb is a synchronous library; all transactions run on the blocking
//! thread pool so store calls stay awaitable.

use crate::config::StoreConfig;
use crate::traits::{
    AppendOutcome, AuthContext, ChangeBatch, ChangeStore, DocumentCreated, InviteCreated,
    InviteConsumed, NewDocument, StoredChange,
};
use async_trait::async_trait;
use eddy_core::{ActorId, AuthToken, DocId, EddyError, InviteId, Result, RoleSet};
use redb::{
    Database, ReadTransaction, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const DOCS: TableDefinition<u128, &[u8]> = TableDefinition::new("docs");
const TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("tokens");
const ACTORS: TableDefinition<(u128, &str), &[u8]> = TableDefinition::new("actors");
const CHANGES: TableDefinition<(u128, u64), &[u8]> = TableDefinition::new("changes");
const INVITES: TableDefinition<(u128, u128), &[u8]> = TableDefinition::new("invites");

#[derive(Debug, Serialize, Deserialize)]
struct DocRow {
    policy_id: String,
    next_offset: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRow {
    doc_id: Uuid,
    actor_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActorRow {
    roles: RoleSet,
    token: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChangeRow {
    actor_id: String,
    created_at: i64,
    payload: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InviteRow {
    roles: RoleSet,
    note: Option<String>,
    uses_remaining: u32,
    created_at: i64,
    created_by: String,
}

fn store_err<E: std::fmt::Display>(err: E) -> EddyError {
    EddyError::storage(err.to_string())
}

fn encode<T: Serialize>(row: &T) -> Result<Vec<u8>> {
    bincode::serialize(row).map_err(|err| EddyError::internal(format!("row encode: {err}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|err| EddyError::internal(format!("row decode: {err}")))
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Durable [`ChangeStore`] backed by a redb database file.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open (or create) the database at the configured path.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db = Database::create(&config.path).map_err(store_err)?;
        Self::with_database(db)
    }

    /// Open a store that lives only in memory. Intended for tests.
    pub fn open_ephemeral() -> Result<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(store_err)?;
        Self::with_database(db)
    }

    fn with_database(db: Database) -> Result<Self> {
        // Create all tables up front so later read transactions never hit
        // a missing-table error.
        let txn = db.begin_write().map_err(store_err)?;
        {
            txn.open_table(DOCS).map_err(store_err)?;
            txn.open_table(TOKENS).map_err(store_err)?;
            txn.open_table(ACTORS).map_err(store_err)?;
            txn.open_table(CHANGES).map_err(store_err)?;
            txn.open_table(INVITES).map_err(store_err)?;
        }
        txn.commit().map_err(store_err)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Number of documents currently stored. Intended for diagnostics.
    pub async fn document_count(&self) -> Result<u64> {
        self.read(|txn| {
            let docs = txn.open_table(DOCS).map_err(store_err)?;
            docs.len().map_err(store_err)
        })
        .await
    }

    async fn write<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&WriteTransaction) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write().map_err(store_err)?;
            // An error here drops the transaction, rolling back everything
            // it wrote.
            let out = op(&txn)?;
            txn.commit().map_err(store_err)?;
            Ok(out)
        })
        .await
        .map_err(|err| EddyError::internal(format!("storage task failed: {err}")))?
    }

    async fn read<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ReadTransaction) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read().map_err(store_err)?;
            op(&txn)
        })
        .await
        .map_err(|err| EddyError::internal(format!("storage task failed: {err}")))?
    }
}

fn doc_key(doc_id: DocId) -> u128 {
    doc_id.uuid().as_u128()
}

fn load_doc(txn: &WriteTransaction, doc_id: DocId) -> Result<DocRow> {
    let docs = txn.open_table(DOCS).map_err(store_err)?;
    let guard = docs
        .get(doc_key(doc_id))
        .map_err(store_err)?
        .ok_or_else(|| EddyError::storage(format!("document {doc_id} does not exist")))?;
    decode(guard.value())
}

fn require_actor(txn: &WriteTransaction, doc_id: DocId, actor_id: &ActorId) -> Result<()> {
    let actors = txn.open_table(ACTORS).map_err(store_err)?;
    actors
        .get((doc_key(doc_id), actor_id.as_str()))
        .map_err(store_err)?
        .ok_or_else(|| {
            EddyError::storage(format!("actor {actor_id} does not exist in document {doc_id}"))
        })?;
    Ok(())
}

fn insert_actor(
    txn: &WriteTransaction,
    doc_id: DocId,
    actor_id: &ActorId,
    roles: RoleSet,
) -> Result<AuthToken> {
    let token = AuthToken::generate();
    let actor_row = encode(&ActorRow {
        roles,
        token: token.as_str().to_string(),
    })?;
    let token_row = encode(&TokenRow {
        doc_id: doc_id.uuid(),
        actor_id: actor_id.as_str().to_string(),
    })?;

    let mut actors = txn.open_table(ACTORS).map_err(store_err)?;
    actors
        .insert((doc_key(doc_id), actor_id.as_str()), actor_row.as_slice())
        .map_err(store_err)?;
    let mut tokens = txn.open_table(TOKENS).map_err(store_err)?;
    tokens
        .insert(token.as_str(), token_row.as_slice())
        .map_err(store_err)?;
    Ok(token)
}

fn insert_changes(
    txn: &WriteTransaction,
    doc_id: DocId,
    actor_id: &ActorId,
    first_offset: u64,
    payloads: Vec<Vec<u8>>,
) -> Result<u64> {
    let created_at = now_unix();
    let count = payloads.len() as u64;
    let mut changes = txn.open_table(CHANGES).map_err(store_err)?;
    for (i, payload) in payloads.into_iter().enumerate() {
        let row = encode(&ChangeRow {
            actor_id: actor_id.as_str().to_string(),
            created_at,
            payload,
        })?;
        changes
            .insert((doc_key(doc_id), first_offset + i as u64), row.as_slice())
            .map_err(store_err)?;
    }
    Ok(first_offset + count)
}

fn store_doc(txn: &WriteTransaction, doc_id: DocId, row: &DocRow) -> Result<()> {
    let bytes = encode(row)?;
    let mut docs = txn.open_table(DOCS).map_err(store_err)?;
    docs.insert(doc_key(doc_id), bytes.as_slice())
        .map_err(store_err)?;
    Ok(())
}

#[async_trait]
impl ChangeStore for RedbStore {
    async fn resolve_token(&self, token: &AuthToken) -> Result<Option<AuthContext>> {
        let token = token.clone();
        self.read(move |txn| {
            let tokens = txn.open_table(TOKENS).map_err(store_err)?;
            let Some(guard) = tokens.get(token.as_str()).map_err(store_err)? else {
                return Ok(None);
            };
            let token_row: TokenRow = decode(guard.value())?;
            let doc_id = DocId::from_uuid(token_row.doc_id);

            let actors = txn.open_table(ACTORS).map_err(store_err)?;
            let actor_guard = actors
                .get((doc_key(doc_id), token_row.actor_id.as_str()))
                .map_err(store_err)?
                .ok_or_else(|| {
                    EddyError::internal(format!(
                        "token resolves to missing actor {} in document {doc_id}",
                        token_row.actor_id
                    ))
                })?;
            let actor_row: ActorRow = decode(actor_guard.value())?;

            Ok(Some(AuthContext {
                doc_id,
                actor_id: ActorId::new(token_row.actor_id),
                roles: actor_row.roles,
            }))
        })
        .await
    }

    async fn document_policy(&self, doc_id: DocId) -> Result<Option<String>> {
        self.read(move |txn| {
            let docs = txn.open_table(DOCS).map_err(store_err)?;
            let Some(guard) = docs.get(doc_key(doc_id)).map_err(store_err)? else {
                return Ok(None);
            };
            let row: DocRow = decode(guard.value())?;
            Ok(Some(row.policy_id))
        })
        .await
    }

    async fn create_document(&self, new_doc: NewDocument) -> Result<DocumentCreated> {
        let created = self
            .write(move |txn| {
                let doc_id = DocId::new();
                let next_offset = new_doc.changes.len() as u64 + 1;
                store_doc(
                    txn,
                    doc_id,
                    &DocRow {
                        policy_id: new_doc.policy_id,
                        next_offset,
                    },
                )?;
                let token = insert_actor(txn, doc_id, &new_doc.actor_id, RoleSet::admin())?;
                insert_changes(txn, doc_id, &new_doc.actor_id, 1, new_doc.changes)?;
                Ok(DocumentCreated {
                    doc_id,
                    actor_id: new_doc.actor_id,
                    token,
                    next_offset,
                })
            })
            .await?;
        debug!(doc_id = %created.doc_id, next_offset = created.next_offset, "document created");
        Ok(created)
    }

    async fn append_changes(
        &self,
        doc_id: DocId,
        actor_id: &ActorId,
        changes: Vec<Vec<u8>>,
    ) -> Result<AppendOutcome> {
        let actor_id = actor_id.clone();
        let outcome = self
            .write(move |txn| {
                let mut doc = load_doc(txn, doc_id)?;
                require_actor(txn, doc_id, &actor_id)?;
                let changes_added = changes.len() as u64;
                let next_offset =
                    insert_changes(txn, doc_id, &actor_id, doc.next_offset, changes)?;
                doc.next_offset = next_offset;
                store_doc(txn, doc_id, &doc)?;
                Ok(AppendOutcome {
                    changes_added,
                    next_offset,
                })
            })
            .await?;
        debug!(
            %doc_id,
            changes_added = outcome.changes_added,
            next_offset = outcome.next_offset,
            "changes appended"
        );
        Ok(outcome)
    }

    async fn get_changes(&self, doc_id: DocId, from_offset: u64) -> Result<ChangeBatch> {
        self.read(move |txn| {
            // Both tables are read inside one transaction, so next_offset
            // always reflects the highest offset included in the batch.
            let docs = txn.open_table(DOCS).map_err(store_err)?;
            let next_offset = match docs.get(doc_key(doc_id)).map_err(store_err)? {
                Some(guard) => decode::<DocRow>(guard.value())?.next_offset,
                None => 1,
            };

            let table = txn.open_table(CHANGES).map_err(store_err)?;
            let mut changes = Vec::new();
            let range = table
                .range((doc_key(doc_id), from_offset)..=(doc_key(doc_id), u64::MAX))
                .map_err(store_err)?;
            for entry in range {
                let (key, value) = entry.map_err(store_err)?;
                let (_, offset) = key.value();
                let row: ChangeRow = decode(value.value())?;
                changes.push(StoredChange {
                    offset,
                    actor_id: ActorId::new(row.actor_id),
                    created_at: row.created_at,
                    payload: row.payload,
                });
            }
            Ok(ChangeBatch {
                changes,
                next_offset,
            })
        })
        .await
    }

    async fn create_invite(
        &self,
        doc_id: DocId,
        created_by: &ActorId,
        roles: RoleSet,
        note: Option<String>,
    ) -> Result<InviteCreated> {
        let created_by = created_by.clone();
        let created = self
            .write(move |txn| {
                load_doc(txn, doc_id)?;
                require_actor(txn, doc_id, &created_by)?;

                let invite_id = InviteId::new();
                let row = encode(&InviteRow {
                    roles: roles.clone(),
                    note: note.clone(),
                    uses_remaining: 1,
                    created_at: now_unix(),
                    created_by: created_by.as_str().to_string(),
                })?;
                let mut invites = txn.open_table(INVITES).map_err(store_err)?;
                invites
                    .insert((doc_key(doc_id), invite_id.uuid().as_u128()), row.as_slice())
                    .map_err(store_err)?;
                Ok(InviteCreated {
                    invite_id,
                    roles,
                    note,
                    uses_remaining: 1,
                })
            })
            .await?;
        debug!(%doc_id, invite_id = %created.invite_id, "invite created");
        Ok(created)
    }

    async fn consume_invite(
        &self,
        doc_id: DocId,
        invite_id: InviteId,
        new_actor_id: ActorId,
    ) -> Result<InviteConsumed> {
        let consumed = self
            .write(move |txn| {
                let invite_key = (doc_key(doc_id), invite_id.uuid().as_u128());
                let mut invite: InviteRow = {
                    let invites = txn.open_table(INVITES).map_err(store_err)?;
                    let guard = invites.get(invite_key).map_err(store_err)?.ok_or_else(|| {
                        EddyError::not_found(format!("invite {invite_id} not found"))
                    })?;
                    decode(guard.value())?
                };
                // An exhausted invite is indistinguishable from an absent
                // one.
                if invite.uses_remaining == 0 {
                    return Err(EddyError::not_found(format!("invite {invite_id} not found")));
                }

                {
                    let actors = txn.open_table(ACTORS).map_err(store_err)?;
                    if actors
                        .get((doc_key(doc_id), new_actor_id.as_str()))
                        .map_err(store_err)?
                        .is_some()
                    {
                        return Err(EddyError::conflict(format!(
                            "actor {new_actor_id} already exists in document {doc_id}"
                        )));
                    }
                }

                invite.uses_remaining -= 1;
                let uses_remaining = invite.uses_remaining;
                let roles = invite.roles.clone();
                let row = encode(&invite)?;
                {
                    let mut invites = txn.open_table(INVITES).map_err(store_err)?;
                    invites.insert(invite_key, row.as_slice()).map_err(store_err)?;
                }
                let token = insert_actor(txn, doc_id, &new_actor_id, roles)?;
                Ok(InviteConsumed {
                    token,
                    uses_remaining,
                })
            })
            .await?;
        debug!(%doc_id, %invite_id, uses_remaining = consumed.uses_remaining, "invite consumed");
        Ok(consumed)
    }
}
