// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Note Storage
//!
//! Tenant-scoped persistence for field-encrypted notes.
//!
//! ## Contract
//!
//! Every operation on [`NoteStore`] takes the tenant [`Schema`] and only ever
//! sees that tenant's records. Writes accept only [`Encrypted`] drafts, so a
//! plaintext sensitive field cannot reach storage by accident. Reads return
//! records exactly as stored; decryption is the caller's job.
//!
//! ## Layout
//!
//! The redb backend keeps one table per tenant:
//!
//! ```text
//! notes.redb
//!   notes:{schema}   id (u64) -> JSON-encoded Note
//! ```

pub mod filter;
pub mod note_database;

pub use filter::{FilterError, NoteField, NoteFilter, NoteQuery, SortOrder};
pub use note_database::NoteDatabase;

use crate::context::Schema;
use crate::crypto::Encrypted;
use crate::models::{Note, NoteDraft};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("note {0} not found")]
    NotFound(u64),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Tenant-scoped access to stored notes.
///
/// Implementations must be safe to share between concurrently running
/// requests.
pub trait NoteStore: Send + Sync {
    /// All notes in `schema` passing the filter's storage predicates,
    /// ordered by the filter when it sorts on a storage field.
    /// Returns an empty list when nothing matches.
    fn find_all(&self, filter: &NoteFilter, schema: &Schema) -> StorageResult<Vec<Note>>;

    /// # Errors
    /// [`StorageError::NotFound`] if `id` does not exist in `schema`.
    fn find_by_id(&self, id: u64, schema: &Schema) -> StorageResult<Note>;

    /// Store a new note, assigning its id and timestamps.
    fn create(&self, draft: Encrypted<NoteDraft>, schema: &Schema) -> StorageResult<Note>;

    /// Replace the body of an existing note.
    ///
    /// # Errors
    /// [`StorageError::NotFound`] if `id` does not exist; nothing is written.
    fn update(&self, id: u64, draft: Encrypted<NoteDraft>, schema: &Schema) -> StorageResult<Note>;

    /// # Errors
    /// [`StorageError::NotFound`] if `id` does not exist, including when it
    /// was already deleted.
    fn delete(&self, id: u64, schema: &Schema) -> StorageResult<()>;

    /// Verify the backend can serve reads.
    fn health_check(&self) -> StorageResult<()>;
}
