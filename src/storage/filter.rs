// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! List filters for notes.
//!
//! Clients may filter and order over the allow-listed fields `id`,
//! `created_at`, `updated_at` and `note`. Because `note` is ciphertext at
//! rest, the filter is applied in two passes:
//!
//! 1. [`NoteFilter::matches_stored`] and storage-field ordering run inside
//!    the store, on encrypted records.
//! 2. [`NoteFilter::finish`] runs after field decryption and applies the
//!    `search` predicate, ordering by `note`, then `offset`/`limit`.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::crypto::Decrypted;
use crate::models::Note;

/// Raw list query parameters.
///
/// The capitalized spellings (`Search`, `Order`, `Offset`, `Limit`) are
/// accepted for older clients.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoteQuery {
    /// Case-insensitive substring match on the note body.
    #[serde(default, alias = "Search")]
    pub search: Option<String>,
    /// `"<field> <asc|desc>"`, e.g. `"created_at asc"`. Defaults to `updated_at desc`.
    #[serde(default, alias = "Order")]
    pub order: Option<String>,
    /// Number of matching notes to skip.
    #[serde(default, alias = "Offset")]
    pub offset: Option<usize>,
    /// Maximum number of notes to return.
    #[serde(default, alias = "Limit")]
    pub limit: Option<usize>,
    /// Only the note with this id.
    #[serde(default)]
    pub id: Option<u64>,
    /// RFC 3339 lower bound on `created_at`, e.g. `2026-01-01T00:00:00Z`.
    ///
    /// Use the `Z` form. A numeric offset must have its `+` percent-encoded
    /// (`%2B02:00`), otherwise it decodes to a space and is rejected.
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on `created_at`; same encoding as `created_after`.
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
    /// RFC 3339 lower bound on `updated_at`; same encoding as `created_after`.
    #[serde(default)]
    pub updated_after: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on `updated_at`; same encoding as `created_after`.
    #[serde(default)]
    pub updated_before: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("`{0}_after` must not be later than `{0}_before`")]
    EmptyRange(&'static str),
}

/// Fields a client may filter or order on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Id,
    CreatedAt,
    UpdatedAt,
    Note,
}

impl FromStr for NoteField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "note" => Ok(Self::Note),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: NoteField,
    pub descending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            field: NoteField::UpdatedAt,
            descending: true,
        }
    }
}

impl SortOrder {
    /// Parse `"<field> [asc|desc]"`. Anything outside the allow-list yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let field = parts.next()?.to_ascii_lowercase().parse().ok()?;
        let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { field, descending })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TimeWindow {
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
}

impl TimeWindow {
    fn new(
        name: &'static str,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Self, FilterError> {
        if let (Some(a), Some(b)) = (after, before) {
            if a > b {
                return Err(FilterError::EmptyRange(name));
            }
        }
        Ok(Self { after, before })
    }

    fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.after.is_none_or(|a| ts >= a) && self.before.is_none_or(|b| ts <= b)
    }
}

/// Validated list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub order: SortOrder,
    pub search: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
    pub id: Option<u64>,
    created: TimeWindow,
    updated: TimeWindow,
}

impl NoteFilter {
    pub fn from_query(query: NoteQuery) -> Result<Self, FilterError> {
        let order = match query.order.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
                tracing::debug!(order = raw, "Ignoring order outside allow-list");
                SortOrder::default()
            }),
        };

        Ok(Self {
            order,
            search: query
                .search
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            offset: query.offset.unwrap_or(0),
            limit: query.limit,
            id: query.id,
            created: TimeWindow::new("created", query.created_after, query.created_before)?,
            updated: TimeWindow::new("updated", query.updated_after, query.updated_before)?,
        })
    }

    /// Predicates that can be evaluated on a stored (encrypted) note.
    pub fn matches_stored(&self, note: &Note) -> bool {
        self.id.is_none_or(|id| note.id == id)
            && self.created.contains(note.created_at)
            && self.updated.contains(note.updated_at)
    }

    /// Whether ordering can happen before decryption.
    pub fn sorts_on_storage(&self) -> bool {
        self.order.field != NoteField::Note
    }

    /// Compare two notes by the requested order, falling back to id.
    pub fn compare(&self, a: &Note, b: &Note) -> Ordering {
        let primary = match self.order.field {
            NoteField::Id => a.id.cmp(&b.id),
            NoteField::CreatedAt => a.created_at.cmp(&b.created_at),
            NoteField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            NoteField::Note => a.note.cmp(&b.note),
        }
        .then_with(|| a.id.cmp(&b.id));

        if self.order.descending {
            primary.reverse()
        } else {
            primary
        }
    }

    /// Apply plaintext predicates, plaintext ordering and pagination.
    pub fn finish(&self, notes: Vec<Decrypted<Note>>) -> Vec<Decrypted<Note>> {
        let mut notes: Vec<_> = match &self.search {
            Some(needle) => notes
                .into_iter()
                .filter(|n| n.note.to_lowercase().contains(needle.as_str()))
                .collect(),
            None => notes,
        };

        if !self.sorts_on_storage() {
            notes.sort_by(|a, b| self.compare(a, b));
        }

        notes
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
