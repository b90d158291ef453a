// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API error type.
//!
//! Every component error converts into [`ApiError`], which picks the
//! [`ErrorKind`] and renders a plain `{code, status, message}` body. Error
//! bodies are never wrapped in an envelope, and messages never carry key
//! material, ciphertext or storage internals.

use axum::{
    extract::rejection::{BytesRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::context::ContextError;
use crate::crypto::{EnvelopeError, FieldCipherError};
use crate::models::StatusResponse;
use crate::pipeline::Stage;
use crate::storage::{FilterError, StorageError};

/// Message returned when a request body is not a JSON envelope.
pub const INVALID_REQUEST_PAYLOAD: &str = "Invalid request payload";

/// Error categories surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed id, envelope or query.
    BadRequest,
    /// Request body over the configured size limit.
    PayloadTooLarge,
    /// Tenant context missing or malformed.
    Context,
    /// No such note in this tenant.
    NotFound,
    /// Envelope failed authentication or held a malformed payload.
    Envelope,
    /// A stored field failed authentication or was malformed.
    FieldCipher,
    /// Storage backend failure.
    Storage,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Context
            | ErrorKind::Envelope
            | ErrorKind::FieldCipher
            | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::Context => "context",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Envelope => "envelope",
            ErrorKind::FieldCipher => "field_cipher",
            ErrorKind::Storage => "storage",
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Pipeline stage that failed, when known.
    pub stage: Option<Stage>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Record the stage at which this error ended the pipeline.
    pub fn at(mut self, stage: Stage) -> Self {
        self.stage.get_or_insert(stage);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status_code()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ContextError> for ApiError {
    fn from(e: ContextError) -> Self {
        Self::new(ErrorKind::Context, e.to_string())
    }
}

impl From<EnvelopeError> for ApiError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::Encoding => Self::bad_request(e.to_string()),
            _ => Self::new(ErrorKind::Envelope, e.to_string()),
        }
    }
}

impl From<FieldCipherError> for ApiError {
    fn from(e: FieldCipherError) -> Self {
        Self::new(ErrorKind::FieldCipher, e.to_string())
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(e: BytesRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(ErrorKind::PayloadTooLarge, e.body_text())
        } else {
            Self::bad_request(e.body_text())
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => Self::not_found(e.to_string()),
            other => {
                tracing::error!(error = %other, "Storage backend failure");
                Self::new(ErrorKind::Storage, "storage failure")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let stage = self.stage.map(|s| s.as_str()).unwrap_or("unknown");
        if status.is_server_error() {
            tracing::error!(
                stage,
                kind = self.kind.as_str(),
                message = %self.message,
                "Note request failed"
            );
        } else {
            tracing::info!(
                stage,
                kind = self.kind.as_str(),
                message = %self.message,
                "Note request rejected"
            );
        }

        let body = Json(StatusResponse::error(status.as_u16(), self.message));
        (status, body).into_response()
    }
}

impl IntoResponse for ContextError {
    fn into_response(self) -> Response {
        ApiError::from(self).at(Stage::ResolveContext).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn kinds_map_to_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        for kind in [
            ErrorKind::Context,
            ErrorKind::Envelope,
            ErrorKind::FieldCipher,
            ErrorKind::Storage,
        ] {
            assert_eq!(kind.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn component_errors_convert_to_kinds() {
        assert_eq!(ApiError::from(ContextError::MissingSchema).kind, ErrorKind::Context);
        assert_eq!(ApiError::from(EnvelopeError::Encoding).kind, ErrorKind::BadRequest);
        assert_eq!(ApiError::from(EnvelopeError::Authentication).kind, ErrorKind::Envelope);
        assert_eq!(
            ApiError::from(FieldCipherError::Malformed { field: "note" }).kind,
            ErrorKind::FieldCipher
        );
        assert_eq!(ApiError::from(StorageError::NotFound(4)).kind, ErrorKind::NotFound);
    }

    #[test]
    fn first_stage_wins() {
        let err = ApiError::bad_request("bad")
            .at(Stage::ParseInput)
            .at(Stage::Respond);
        assert_eq!(err.stage, Some(Stage::ParseInput));
    }

    #[tokio::test]
    async fn into_response_returns_plain_status_body() {
        let response = ApiError::not_found("note 9 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"code":404,"status":"Error","message":"note 9 not found"}"#);
    }

    #[tokio::test]
    async fn serde_failures_in_storage_are_not_leaked() {
        let serde_err = serde_json::from_str::<u64>("\"v1.secretish\"").unwrap_err();
        let response = ApiError::from(StorageError::Serde(serde_err)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["message"], "storage failure");
    }
}
