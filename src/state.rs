// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::crypto::FieldCipher;
use crate::pipeline::NotePipeline;
use crate::storage::NoteStore;

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NotePipeline>,
    /// Shared storage handle, also used by readiness checks.
    pub store: Arc<dyn NoteStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn NoteStore>, fields: FieldCipher) -> Self {
        Self {
            notes: Arc::new(NotePipeline::new(store.clone(), fields)),
            store,
        }
    }
}
