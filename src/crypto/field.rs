// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field-level encryption for records at rest.
//!
//! A record type opts in by implementing [`SensitiveFields`], listing each
//! sensitive field by name. [`FieldCipher`] walks that list and replaces the
//! values in place. Stored values look like:
//!
//! ```text
//! v1.<base64(nonce | ciphertext | tag)>
//! ```
//!
//! The field name is bound as associated data, so a ciphertext copied into a
//! different field fails authentication.
//!
//! Results are wrapped in [`Encrypted`] or [`Decrypted`] so the storage and
//! projection layers can demand the right side of the transformation in
//! their signatures.

use std::ops::Deref;

use base64ct::{Base64, Encoding};

use super::{open, seal, FieldKey};

/// Prefix of every encrypted field value.
pub const FIELD_VERSION_PREFIX: &str = "v1.";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FieldCipherError {
    #[error("failed to encrypt sensitive field `{field}`")]
    Encrypt { field: &'static str },

    #[error("sensitive field `{field}` failed authentication")]
    Authentication { field: &'static str },

    #[error("sensitive field `{field}` holds malformed ciphertext")]
    Malformed { field: &'static str },
}

/// Capability implemented by every record variant that carries sensitive data.
pub trait SensitiveFields {
    /// Name and mutable slot of each sensitive field.
    fn sensitive_fields(&mut self) -> Vec<(&'static str, &mut String)>;
}

/// A record whose sensitive fields hold ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted<R>(R);

impl<R> Encrypted<R> {
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R> Deref for Encrypted<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.0
    }
}

/// A record whose sensitive fields hold plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted<R>(R);

impl<R> Decrypted<R> {
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R> Deref for Decrypted<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.0
    }
}

/// Encrypts and decrypts the sensitive fields of records.
#[derive(Debug, Clone)]
pub struct FieldCipher {
    key: FieldKey,
}

impl FieldCipher {
    pub fn new(key: FieldKey) -> Self {
        Self { key }
    }

    /// Replace every sensitive plaintext in `record` with ciphertext.
    pub fn encrypt_fields<R: SensitiveFields>(
        &self,
        mut record: R,
    ) -> Result<Encrypted<R>, FieldCipherError> {
        let cipher = self.key.cipher();
        for (name, value) in record.sensitive_fields() {
            let sealed = seal(&cipher, value.as_bytes(), name.as_bytes())
                .map_err(|_| FieldCipherError::Encrypt { field: name })?;
            *value = format!("{FIELD_VERSION_PREFIX}{}", Base64::encode_string(&sealed));
        }
        Ok(Encrypted(record))
    }

    /// Replace every sensitive ciphertext in `record` with its plaintext.
    pub fn decrypt_fields<R: SensitiveFields>(
        &self,
        mut record: R,
    ) -> Result<Decrypted<R>, FieldCipherError> {
        let cipher = self.key.cipher();
        for (name, value) in record.sensitive_fields() {
            let encoded = value
                .strip_prefix(FIELD_VERSION_PREFIX)
                .ok_or(FieldCipherError::Malformed { field: name })?;
            let sealed = Base64::decode_vec(encoded)
                .map_err(|_| FieldCipherError::Malformed { field: name })?;
            let plaintext = open(&cipher, &sealed, name.as_bytes())
                .map_err(|_| FieldCipherError::Authentication { field: name })?;
            *value = String::from_utf8(plaintext)
                .map_err(|_| FieldCipherError::Malformed { field: name })?;
        }
        Ok(Decrypted(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteDraft;

    #[derive(Debug, Clone, PartialEq)]
    struct Credential {
        label: String,
        username: String,
        password: String,
    }

    impl SensitiveFields for Credential {
        fn sensitive_fields(&mut self) -> Vec<(&'static str, &mut String)> {
            vec![("username", &mut self.username), ("password", &mut self.password)]
        }
    }

    fn credential() -> Credential {
        Credential {
            label: "mail".to_string(),
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn round_trip_restores_plaintext() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let draft = NoteDraft {
            note: "the vault code is 4512".to_string(),
        };

        let encrypted = cipher.encrypt_fields(draft.clone()).unwrap();
        assert!(encrypted.note.starts_with(FIELD_VERSION_PREFIX));
        assert!(!encrypted.note.contains("4512"));

        let decrypted = cipher.decrypt_fields(encrypted.into_inner()).unwrap();
        assert_eq!(decrypted.into_inner(), draft);
    }

    #[test]
    fn only_declared_fields_are_encrypted() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let encrypted = cipher.encrypt_fields(credential()).unwrap();

        assert_eq!(encrypted.label, "mail");
        assert_ne!(encrypted.username, "alice");
        assert_ne!(encrypted.password, "hunter2");

        let decrypted = cipher.decrypt_fields(encrypted.into_inner()).unwrap();
        assert_eq!(decrypted.into_inner(), credential());
    }

    #[test]
    fn ciphertext_moved_between_fields_fails() {
        let cipher = FieldCipher::new(FieldKey::generate());
        let mut swapped = cipher.encrypt_fields(credential()).unwrap().into_inner();
        std::mem::swap(&mut swapped.username, &mut swapped.password);

        assert_eq!(
            cipher.decrypt_fields(swapped).unwrap_err(),
            FieldCipherError::Authentication { field: "username" }
        );
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let encrypted = FieldCipher::new(FieldKey::generate())
            .encrypt_fields(NoteDraft {
                note: "secret".to_string(),
            })
            .unwrap();

        let other = FieldCipher::new(FieldKey::generate());
        assert_eq!(
            other.decrypt_fields(encrypted.into_inner()).unwrap_err(),
            FieldCipherError::Authentication { field: "note" }
        );
    }

    #[test]
    fn plaintext_or_garbage_is_malformed() {
        let cipher = FieldCipher::new(FieldKey::generate());

        let plain = NoteDraft {
            note: "never encrypted".to_string(),
        };
        assert_eq!(
            cipher.decrypt_fields(plain).unwrap_err(),
            FieldCipherError::Malformed { field: "note" }
        );

        let garbage = NoteDraft {
            note: format!("{FIELD_VERSION_PREFIX}***"),
        };
        assert_eq!(
            cipher.decrypt_fields(garbage).unwrap_err(),
            FieldCipherError::Malformed { field: "note" }
        );
    }
}
