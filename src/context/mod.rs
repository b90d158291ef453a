// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Tenant Context
//!
//! Upstream middleware attaches two raw values to each request's extensions:
//! a [`RawSchema`] naming the tenant partition and a [`RawTransportKey`]
//! holding the session's envelope key. Handlers never read those directly;
//! they extract a [`TenantContext`], which validates both once and fails
//! with [`ContextError`] when either is missing or malformed.
//!
//! ```rust,ignore
//! async fn handler(context: Result<TenantContext, ContextError>) {
//!     let context = context?;
//!     // context.schema(), context.transport_key()
//! }
//! ```
//!
//! The context is never logged and never persisted.

pub mod gateway;

use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};

use crate::crypto::{KeyError, TransportKey};

/// Maximum schema name length.
pub const MAX_SCHEMA_LEN: usize = 63;

/// Unvalidated schema name attached by upstream middleware.
#[derive(Debug, Clone)]
pub struct RawSchema(pub String);

/// Unvalidated base64 transport key attached by upstream middleware.
#[derive(Clone)]
pub struct RawTransportKey(pub String);

impl fmt::Debug for RawTransportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawTransportKey([REDACTED])")
    }
}

/// Tenant context resolution errors.
///
/// All variants indicate a pipeline misconfiguration upstream, so they are
/// surfaced as internal errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("tenant schema missing from request context")]
    MissingSchema,

    #[error("tenant schema in request context is malformed")]
    InvalidSchema,

    #[error("transport key missing from request context")]
    MissingTransportKey,

    #[error("transport key in request context is malformed")]
    InvalidTransportKey(#[source] KeyError),
}

/// Validated tenant partition name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema(String);

impl Schema {
    /// Validate a schema name: 1-63 chars of `[a-z0-9_]`, not starting with a digit.
    pub fn parse(raw: &str) -> Result<Self, ContextError> {
        let mut chars = raw.chars();
        let valid_first = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if valid_first && valid_rest && raw.len() <= MAX_SCHEMA_LEN {
            Ok(Self(raw.to_string()))
        } else {
            Err(ContextError::InvalidSchema)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request tenant context.
#[derive(Debug, Clone)]
pub struct TenantContext {
    schema: Schema,
    transport_key: TransportKey,
}

impl TenantContext {
    pub fn new(schema: Schema, transport_key: TransportKey) -> Self {
        Self {
            schema,
            transport_key,
        }
    }

    /// Resolve and validate the context attached to a request.
    pub fn resolve(extensions: &Extensions) -> Result<Self, ContextError> {
        let RawSchema(raw_schema) = extensions
            .get::<RawSchema>()
            .ok_or(ContextError::MissingSchema)?;
        let schema = Schema::parse(raw_schema)?;

        let RawTransportKey(raw_key) = extensions
            .get::<RawTransportKey>()
            .ok_or(ContextError::MissingTransportKey)?;
        let transport_key =
            TransportKey::from_base64(raw_key).map_err(ContextError::InvalidTransportKey)?;

        Ok(Self::new(schema, transport_key))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn transport_key(&self) -> &TransportKey {
        &self.transport_key
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ContextError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::resolve(&parts.extensions)
    }
}
