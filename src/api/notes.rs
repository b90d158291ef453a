// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note handlers.
//!
//! Handlers only collect raw inputs and hand them to the
//! [`NotePipeline`](crate::pipeline::NotePipeline). Extractor rejections are
//! taken as values and turned into [`ApiError`]s, so every failure gets the
//! same JSON status body.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
};

use crate::{
    context::{ContextError, TenantContext},
    crypto::Envelope,
    error::ApiError,
    models::StatusResponse,
    pipeline::{NoteReply, Stage},
    state::AppState,
    storage::NoteQuery,
};

fn path_id(id: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|e| ApiError::from(e).at(Stage::ParseInput))
}

fn body_bytes(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|e| ApiError::from(e).at(Stage::ParseInput))
}

#[utoipa::path(
    get,
    path = "/notes",
    params(NoteQuery),
    tag = "Notes",
    responses(
        (status = 200, description = "Envelope of the matching notes", body = Envelope),
        (status = 400, description = "Malformed filter", body = StatusResponse),
        (status = 500, description = "Context, cipher or storage failure", body = StatusResponse)
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    query: Result<Query<NoteQuery>, QueryRejection>,
    context: Result<TenantContext, ContextError>,
) -> Result<NoteReply, ApiError> {
    let query = query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::bad_request(e.body_text()));
    state.notes.list(query, context)
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(("id" = u64, Path, description = "Note id")),
    tag = "Notes",
    responses(
        (status = 200, description = "Envelope of the note", body = Envelope),
        (status = 400, description = "Invalid id", body = StatusResponse),
        (status = 404, description = "Note not found", body = StatusResponse)
    )
)]
pub async fn get_note(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    context: Result<TenantContext, ContextError>,
) -> Result<NoteReply, ApiError> {
    state.notes.get(&path_id(id)?, context)
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = Envelope,
    tag = "Notes",
    responses(
        (status = 200, description = "Envelope of the created note", body = Envelope),
        (status = 400, description = "Invalid request payload", body = StatusResponse),
        (status = 413, description = "Request body too large", body = StatusResponse)
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    context: Result<TenantContext, ContextError>,
    body: Result<Bytes, BytesRejection>,
) -> Result<NoteReply, ApiError> {
    state.notes.create(&body_bytes(body)?, context)
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = u64, Path, description = "Note id")),
    request_body = Envelope,
    tag = "Notes",
    responses(
        (status = 200, description = "Envelope of the updated note", body = Envelope),
        (status = 400, description = "Invalid id or payload", body = StatusResponse),
        (status = 404, description = "Note not found", body = StatusResponse)
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    context: Result<TenantContext, ContextError>,
    body: Result<Bytes, BytesRejection>,
) -> Result<NoteReply, ApiError> {
    let id = path_id(id)?;
    state.notes.update(&id, &body_bytes(body)?, context)
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = u64, Path, description = "Note id")),
    tag = "Notes",
    responses(
        (status = 200, description = "Note deleted", body = StatusResponse),
        (status = 404, description = "Note not found", body = StatusResponse)
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    context: Result<TenantContext, ContextError>,
) -> Result<NoteReply, ApiError> {
    state.notes.delete(&path_id(id)?, context)
}
