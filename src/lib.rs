// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Notes Vault - multi-tenant encrypted notes service
//!
//! Sensitive note fields are encrypted at rest under a server-held field
//! key, and every request and response body travels inside an envelope
//! sealed with the session's transport key.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `context` - Per-request tenant schema and transport key
//! - `crypto` - Transport envelopes and field-level encryption
//! - `pipeline` - Stage-by-stage CRUD orchestration
//! - `storage` - Tenant-scoped note storage (redb)

pub mod api;
pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod state;
pub mod storage;
