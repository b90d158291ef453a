// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key types for the two encryption domains.
//!
//! [`TransportKey`] protects request/response envelopes and lives for one
//! session. [`FieldKey`] protects sensitive record fields at rest and is
//! held by the server. Both are 32 bytes of raw material expanded with
//! HKDF-SHA256 under a domain-specific label, so the same material fed to
//! both types still produces unrelated AES keys.

use aes_gcm::{aead::KeyInit, Aes256Gcm};
use base64ct::{Base64, Encoding};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of raw key material and of derived AES-256 keys.
pub const KEY_LEN: usize = 32;

const TRANSPORT_DOMAIN: &[u8] = b"notes-vault/transport-envelope/v1";
const FIELD_DOMAIN: &[u8] = b"notes-vault/field-at-rest/v1";

/// Errors raised while building a key from external material.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key material is not valid base64")]
    Encoding,

    #[error("key material must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("key derivation failed")]
    Derivation,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    fn derive(material: &[u8], domain: &[u8]) -> Result<Self, KeyError> {
        if material.len() != KEY_LEN {
            return Err(KeyError::InvalidLength {
                expected: KEY_LEN,
                actual: material.len(),
            });
        }

        let mut okm = [0u8; KEY_LEN];
        Hkdf::<Sha256>::new(None, material)
            .expand(domain, &mut okm)
            .map_err(|_| KeyError::Derivation)?;
        Ok(Self(okm))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(&self.0.into())
    }
}

fn decode_material(encoded: &str) -> Result<Vec<u8>, KeyError> {
    Base64::decode_vec(encoded.trim()).map_err(|_| KeyError::Encoding)
}

/// Ephemeral per-session key used only for the wire envelope.
#[derive(Clone)]
pub struct TransportKey(DerivedKey);

impl TransportKey {
    pub fn from_bytes(material: &[u8]) -> Result<Self, KeyError> {
        DerivedKey::derive(material, TRANSPORT_DOMAIN).map(Self)
    }

    /// Parse base64 key material as supplied by the session layer.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&decode_material(encoded)?)
    }

    pub(crate) fn cipher(&self) -> Aes256Gcm {
        self.0.cipher()
    }
}

impl std::fmt::Debug for TransportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransportKey([REDACTED])")
    }
}

/// Static server-held key used only for sensitive fields at rest.
#[derive(Clone)]
pub struct FieldKey(DerivedKey);

impl FieldKey {
    pub fn from_bytes(material: &[u8]) -> Result<Self, KeyError> {
        DerivedKey::derive(material, FIELD_DOMAIN).map(Self)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&decode_material(encoded)?)
    }

    /// Generate fresh random key material.
    #[cfg(test)]
    pub fn generate() -> Self {
        let material = Aes256Gcm::generate_key(&mut aes_gcm::aead::OsRng);
        Self::from_bytes(material.as_slice()).expect("generated key has KEY_LEN bytes")
    }

    pub(crate) fn cipher(&self) -> Aes256Gcm {
        self.0.cipher()
    }
}

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldKey([REDACTED])")
    }
}
