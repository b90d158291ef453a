// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Note Data Models
//!
//! ## Shapes
//!
//! - [`Note`] - the stored record. Its `note` field is ciphertext whenever it
//!   is at rest, and it carries storage bookkeeping (`revision`).
//! - [`NoteDraft`] - the inbound shape built from a client DTO, encrypted
//!   before it is handed to storage.
//! - [`NoteDto`] - the external projection sent inside envelopes. It only
//!   carries plaintext business fields.
//! - [`StatusResponse`] - plain `{code, status, message}` body used for
//!   delete confirmations and errors.
//!
//! ## Projection
//!
//! A [`NoteDto`] can only be built from a [`Decrypted<Note>`], and a
//! [`NoteDraft`] is the only thing built from an inbound DTO. Ciphertext
//! therefore never lands in a DTO field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::crypto::{Decrypted, SensitiveFields};

/// Status label used in successful status bodies.
pub const STATUS_SUCCESS: &str = "Success";

/// Status label used in error bodies.
pub const STATUS_ERROR: &str = "Error";

// =============================================================================
// Stored Record
// =============================================================================

/// A note as persisted in a tenant's table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    /// Identifier, unique within the tenant schema.
    pub id: u64,
    /// When the note was created.
    pub created_at: DateTime<Utc>,
    /// When the note was last written.
    pub updated_at: DateTime<Utc>,
    /// Sensitive note body.
    pub note: String,
    /// Write counter, starting at 1. Internal to storage.
    pub revision: u32,
}

impl SensitiveFields for Note {
    fn sensitive_fields(&mut self) -> Vec<(&'static str, &mut String)> {
        vec![("note", &mut self.note)]
    }
}

/// Inbound note contents before storage assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub note: String,
}

impl SensitiveFields for NoteDraft {
    fn sensitive_fields(&mut self) -> Vec<(&'static str, &mut String)> {
        vec![("note", &mut self.note)]
    }
}

// =============================================================================
// External Projection
// =============================================================================

/// Plaintext note as exchanged with clients inside an envelope.
///
/// On create and update only `note` is read; `id` and timestamps are
/// assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NoteDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub note: String,
}

impl From<Decrypted<Note>> for NoteDto {
    fn from(note: Decrypted<Note>) -> Self {
        let note = note.into_inner();
        Self {
            id: Some(note.id),
            created_at: Some(note.created_at),
            updated_at: Some(note.updated_at),
            note: note.note,
        }
    }
}

impl From<NoteDto> for NoteDraft {
    fn from(dto: NoteDto) -> Self {
        Self { note: dto.note }
    }
}

// =============================================================================
// Status Body
// =============================================================================

/// Plain (never encrypted) status body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StatusResponse {
    /// HTTP status code.
    pub code: u16,
    /// `Success` or `Error`.
    pub status: String,
    /// Human-readable message.
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            status: STATUS_SUCCESS.to_string(),
            message: message.into(),
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status: STATUS_ERROR.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{FieldCipher, FieldKey};

    fn stored_note() -> Note {
        let now = Utc::now();
        Note {
            id: 42,
            created_at: now,
            updated_at: now,
            note: "plain body".to_string(),
            revision: 3,
        }
    }

    #[test]
    fn dto_drops_storage_bookkeeping() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let stored = cipher.encrypt_fields(stored_note()).unwrap().into_inner();
        let dto = NoteDto::from(cipher.decrypt_fields(stored).unwrap());

        assert_eq!(dto.id, Some(42));
        assert_eq!(dto.note, "plain body");

        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("revision").is_none());
    }

    #[test]
    fn create_payload_needs_only_the_note() {
        let dto: NoteDto = serde_json::from_str(r#"{"note":"hello"}"#).unwrap();
        assert_eq!(dto.id, None);

        let draft = NoteDraft::from(dto);
        assert_eq!(draft.note, "hello");
    }

    #[test]
    fn inbound_id_and_timestamps_are_ignored() {
        let dto = NoteDto {
            id: Some(999),
            created_at: Some(Utc::now()),
            updated_at: None,
            note: "body".to_string(),
        };
        assert_eq!(
            NoteDraft::from(dto),
            NoteDraft {
                note: "body".to_string()
            }
        );
    }

    #[test]
    fn status_bodies_serialize_flat() {
        let body = serde_json::to_string(&StatusResponse::success("done")).unwrap();
        assert_eq!(body, r#"{"code":200,"status":"Success","message":"done"}"#);

        let body = StatusResponse::error(404, "missing");
        assert_eq!(body.status, STATUS_ERROR);
        assert_eq!(body.code, 404);
    }
}
