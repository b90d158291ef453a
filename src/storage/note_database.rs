// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded note database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `notes:{schema}`: note id → serialized [`Note`] (JSON bytes)
//! - `note_seq`: schema → last id handed out in that schema
//!
//! Ids come from the sequence, never from the current maximum, so an id is
//! not reused after its note is deleted.
//!
//! Tables are created lazily by the first write for a tenant. Reads against a
//! tenant that has never written behave like an empty table.

use std::path::Path;

use chrono::Utc;
use redb::{
    backends::InMemoryBackend, Database, ReadableDatabase, ReadableTable, TableDefinition,
    TableError,
};

use super::{NoteFilter, NoteStore, StorageError, StorageResult};
use crate::context::Schema;
use crate::crypto::Encrypted;
use crate::models::{Note, NoteDraft};

/// Name of the database file inside the data directory.
pub const DATABASE_FILE: &str = "notes.redb";

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("note_seq");

fn table_name(schema: &Schema) -> String {
    format!("notes:{schema}")
}

/// Embedded ACID note database.
pub struct NoteDatabase {
    db: Database,
}

impl NoteDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;
        Ok(Self { db })
    }

    /// Open the database file inside `data_dir`.
    pub fn open_in_dir(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    /// Create a database that lives only in memory.
    pub fn in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Ok(Self { db })
    }

    fn decode(bytes: &[u8]) -> StorageResult<Note> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl NoteStore for NoteDatabase {
    fn find_all(&self, filter: &NoteFilter, schema: &Schema) -> StorageResult<Vec<Note>> {
        let name = table_name(schema);
        let definition: TableDefinition<u64, &[u8]> = TableDefinition::new(&name);

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(definition) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut notes = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let note = Self::decode(value.value())?;
            if filter.matches_stored(&note) {
                notes.push(note);
            }
        }

        if filter.sorts_on_storage() {
            notes.sort_by(|a, b| filter.compare(a, b));
        }
        Ok(notes)
    }

    fn find_by_id(&self, id: u64, schema: &Schema) -> StorageResult<Note> {
        let name = table_name(schema);
        let definition: TableDefinition<u64, &[u8]> = TableDefinition::new(&name);

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(definition) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Err(StorageError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };

        let stored = table.get(id)?;
        match stored {
            Some(value) => Self::decode(value.value()),
            None => Err(StorageError::NotFound(id)),
        }
    }

    fn create(&self, draft: Encrypted<NoteDraft>, schema: &Schema) -> StorageResult<Note> {
        let name = table_name(schema);
        let definition: TableDefinition<u64, &[u8]> = TableDefinition::new(&name);
        let draft = draft.into_inner();

        let write_txn = self.db.begin_write()?;
        let note = {
            let mut table = write_txn.open_table(definition)?;
            let mut sequence = write_txn.open_table(SEQUENCE_TABLE)?;

            let issued = sequence.get(schema.as_str())?.map(|v| v.value()).unwrap_or(0);
            let highest = table.last()?.map(|(key, _)| key.value()).unwrap_or(0);
            let id = issued.max(highest) + 1;
            sequence.insert(schema.as_str(), id)?;

            let now = Utc::now();
            let note = Note {
                id,
                created_at: now,
                updated_at: now,
                note: draft.note,
                revision: 1,
            };
            let json = serde_json::to_vec(&note)?;
            table.insert(id, json.as_slice())?;
            note
        };
        write_txn.commit()?;

        tracing::debug!(note_id = note.id, "Stored new note");
        Ok(note)
    }

    fn update(&self, id: u64, draft: Encrypted<NoteDraft>, schema: &Schema) -> StorageResult<Note> {
        let name = table_name(schema);
        let definition: TableDefinition<u64, &[u8]> = TableDefinition::new(&name);
        let draft = draft.into_inner();

        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(definition)?;
            let existing = match table.get(id)? {
                Some(value) => Some(Self::decode(value.value())?),
                None => None,
            };

            match existing {
                Some(existing) => {
                    let note = Note {
                        id,
                        created_at: existing.created_at,
                        updated_at: Utc::now(),
                        note: draft.note,
                        revision: existing.revision.saturating_add(1),
                    };
                    let json = serde_json::to_vec(&note)?;
                    table.insert(id, json.as_slice())?;
                    Some(note)
                }
                None => None,
            }
        };

        match updated {
            Some(note) => {
                write_txn.commit()?;
                Ok(note)
            }
            None => {
                write_txn.abort()?;
                Err(StorageError::NotFound(id))
            }
        }
    }

    fn delete(&self, id: u64, schema: &Schema) -> StorageResult<()> {
        let name = table_name(schema);
        let definition: TableDefinition<u64, &[u8]> = TableDefinition::new(&name);

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(definition)?;
            let removed = table.remove(id)?.is_some();
            removed
        };

        if removed {
            write_txn.commit()?;
            Ok(())
        } else {
            write_txn.abort()?;
            Err(StorageError::NotFound(id))
        }
    }

    fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        read_txn.close()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
