// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Note Pipeline
//!
//! Runs the five note operations through a fixed sequence of stages:
//!
//! ```text
//! ParseInput -> ResolveContext -> DecryptEnvelope -> Execute
//!            -> TransformFields -> ProjectDto -> EncryptEnvelope -> Respond
//! ```
//!
//! The first failing stage ends the request with an [`ApiError`] tagged with
//! that stage. Nothing is retried and no partial result is returned.
//! Update and delete look the note up before mutating it.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::context::{ContextError, TenantContext};
use crate::crypto::{Decrypted, Envelope, FieldCipher};
use crate::error::{ApiError, INVALID_REQUEST_PAYLOAD};
use crate::models::{Note, NoteDraft, NoteDto, StatusResponse};
use crate::storage::{NoteFilter, NoteQuery, NoteStore};

/// Message returned after a successful delete.
pub const DELETE_SUCCESS_MESSAGE: &str = "Note deleted successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseInput,
    ResolveContext,
    DecryptEnvelope,
    Execute,
    TransformFields,
    ProjectDto,
    EncryptEnvelope,
    Respond,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ParseInput => "parse_input",
            Stage::ResolveContext => "resolve_context",
            Stage::DecryptEnvelope => "decrypt_envelope",
            Stage::Execute => "execute",
            Stage::TransformFields => "transform_fields",
            Stage::ProjectDto => "project_dto",
            Stage::EncryptEnvelope => "encrypt_envelope",
            Stage::Respond => "respond",
        }
    }
}

fn at<E: Into<ApiError>>(stage: Stage) -> impl FnOnce(E) -> ApiError {
    move |e| {
        let err: ApiError = e.into();
        err.at(stage)
    }
}

/// Successful pipeline output.
#[derive(Debug)]
pub enum NoteReply {
    /// Encrypted payload for list, get, create and update.
    Envelope(Envelope),
    /// Plain status body for delete.
    Status(StatusResponse),
}

impl IntoResponse for NoteReply {
    fn into_response(self) -> Response {
        match self {
            NoteReply::Envelope(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
            NoteReply::Status(status) => (StatusCode::OK, Json(status)).into_response(),
        }
    }
}

pub type PipelineResult = Result<NoteReply, ApiError>;

/// Parse a path id. Only positive integers are valid.
pub fn parse_id(raw: &str) -> Result<u64, ApiError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request("Invalid note id")),
    }
}

fn parse_envelope(body: &[u8]) -> Result<Envelope, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::bad_request(INVALID_REQUEST_PAYLOAD))
}

fn resolve(context: Result<TenantContext, ContextError>) -> Result<TenantContext, ApiError> {
    context.map_err(at(Stage::ResolveContext))
}

pub struct NotePipeline {
    store: Arc<dyn NoteStore>,
    fields: FieldCipher,
}

impl NotePipeline {
    pub fn new(store: Arc<dyn NoteStore>, fields: FieldCipher) -> Self {
        Self { store, fields }
    }

    /// `GET /notes`
    pub fn list(
        &self,
        query: Result<NoteQuery, ApiError>,
        context: Result<TenantContext, ContextError>,
    ) -> PipelineResult {
        let filter = query
            .and_then(|q| NoteFilter::from_query(q).map_err(ApiError::from))
            .map_err(at(Stage::ParseInput))?;
        let context = resolve(context)?;

        let stored = self
            .store
            .find_all(&filter, context.schema())
            .map_err(at(Stage::Execute))?;
        let notes = stored
            .into_iter()
            .map(|note| self.fields.decrypt_fields(note))
            .collect::<Result<Vec<_>, _>>()
            .map_err(at(Stage::TransformFields))?;

        let dtos: Vec<NoteDto> = filter.finish(notes).into_iter().map(NoteDto::from).collect();
        tracing::debug!(count = dtos.len(), "Listed notes");
        self.seal(&context, &dtos)
    }

    /// `GET /notes/{id}`
    pub fn get(&self, id: &str, context: Result<TenantContext, ContextError>) -> PipelineResult {
        let id = parse_id(id).map_err(at(Stage::ParseInput))?;
        let context = resolve(context)?;

        let stored = self
            .store
            .find_by_id(id, context.schema())
            .map_err(at(Stage::Execute))?;
        let note = self.open_fields(stored)?;
        self.seal(&context, &NoteDto::from(note))
    }

    /// `POST /notes`
    pub fn create(
        &self,
        body: &[u8],
        context: Result<TenantContext, ContextError>,
    ) -> PipelineResult {
        let envelope = parse_envelope(body).map_err(at(Stage::ParseInput))?;
        let context = resolve(context)?;
        let draft = self.open_draft(&envelope, &context)?;

        let sealed = self
            .fields
            .encrypt_fields(draft)
            .map_err(at(Stage::TransformFields))?;
        let stored = self
            .store
            .create(sealed, context.schema())
            .map_err(at(Stage::Execute))?;
        let note = self.open_fields(stored)?;

        tracing::info!(id = note.id, "Note created");
        self.seal(&context, &NoteDto::from(note))
    }

    /// `PUT /notes/{id}`
    pub fn update(
        &self,
        id: &str,
        body: &[u8],
        context: Result<TenantContext, ContextError>,
    ) -> PipelineResult {
        let id = parse_id(id).map_err(at(Stage::ParseInput))?;
        let envelope = parse_envelope(body).map_err(at(Stage::ParseInput))?;
        let context = resolve(context)?;
        let draft = self.open_draft(&envelope, &context)?;

        self.store
            .find_by_id(id, context.schema())
            .map_err(at(Stage::Execute))?;
        let sealed = self
            .fields
            .encrypt_fields(draft)
            .map_err(at(Stage::TransformFields))?;
        let stored = self
            .store
            .update(id, sealed, context.schema())
            .map_err(at(Stage::Execute))?;
        let note = self.open_fields(stored)?;

        tracing::info!(id, revision = note.revision, "Note updated");
        self.seal(&context, &NoteDto::from(note))
    }

    /// `DELETE /notes/{id}`
    pub fn delete(&self, id: &str, context: Result<TenantContext, ContextError>) -> PipelineResult {
        let id = parse_id(id).map_err(at(Stage::ParseInput))?;
        let context = resolve(context)?;

        self.store
            .find_by_id(id, context.schema())
            .map_err(at(Stage::Execute))?;
        self.store
            .delete(id, context.schema())
            .map_err(at(Stage::Execute))?;

        tracing::info!(id, "Note deleted");
        Ok(NoteReply::Status(StatusResponse::success(DELETE_SUCCESS_MESSAGE)))
    }

    fn open_draft(
        &self,
        envelope: &Envelope,
        context: &TenantContext,
    ) -> Result<NoteDraft, ApiError> {
        let dto: NoteDto = envelope
            .open(context.transport_key())
            .map_err(at(Stage::DecryptEnvelope))?;
        Ok(NoteDraft::from(dto))
    }

    fn open_fields(&self, note: Note) -> Result<Decrypted<Note>, ApiError> {
        self.fields
            .decrypt_fields(note)
            .map_err(at(Stage::TransformFields))
    }

    fn seal<T: serde::Serialize + ?Sized>(
        &self,
        context: &TenantContext,
        value: &T,
    ) -> PipelineResult {
        let envelope =
            Envelope::seal(context.transport_key(), value).map_err(at(Stage::EncryptEnvelope))?;
        Ok(NoteReply::Envelope(envelope))
    }
}
