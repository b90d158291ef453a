// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport envelope codec.
//!
//! Every body that crosses the network (except plain status objects) is an
//! [`Envelope`]: `{"data": "<base64 ciphertext>"}`. The ciphertext is the
//! JSON encoding of the payload sealed with the session's [`TransportKey`].

use base64ct::{Base64, Encoding};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

use super::{open, seal, TransportKey};

/// Associated data bound to every envelope ciphertext.
const ENVELOPE_AAD: &[u8] = b"notes-vault/envelope/v1";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The `data` field is not valid base64. Reported as a bad request.
    #[error("envelope data is not valid base64")]
    Encoding,

    #[error("failed to serialize envelope payload")]
    Serialize,

    #[error("envelope failed authentication")]
    Authentication,

    #[error("envelope payload is malformed")]
    MalformedPayload,
}

/// Serialize `value` to JSON and seal it under `key`.
pub fn encrypt<T: Serialize + ?Sized>(
    key: &TransportKey,
    value: &T,
) -> Result<Vec<u8>, EnvelopeError> {
    let plaintext = serde_json::to_vec(value).map_err(|_| EnvelopeError::Serialize)?;
    seal(&key.cipher(), &plaintext, ENVELOPE_AAD).map_err(|_| EnvelopeError::Serialize)
}

/// Authenticate and decrypt `ciphertext`, then deserialize it as `T`.
pub fn decrypt<T: DeserializeOwned>(
    key: &TransportKey,
    ciphertext: &[u8],
) -> Result<T, EnvelopeError> {
    let plaintext =
        open(&key.cipher(), ciphertext, ENVELOPE_AAD).map_err(|_| EnvelopeError::Authentication)?;
    serde_json::from_slice(&plaintext).map_err(|_| EnvelopeError::MalformedPayload)
}

/// Wire-level wrapper carrying an envelope ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Envelope {
    /// Base64-encoded AES-256-GCM ciphertext of the JSON payload.
    pub data: String,
}

impl Envelope {
    /// Seal `value` into a new envelope.
    pub fn seal<T: Serialize + ?Sized>(
        key: &TransportKey,
        value: &T,
    ) -> Result<Self, EnvelopeError> {
        let ciphertext = encrypt(key, value)?;
        Ok(Self {
            data: Base64::encode_string(&ciphertext),
        })
    }

    /// Decode and open the envelope as `T`.
    pub fn open<T: DeserializeOwned>(&self, key: &TransportKey) -> Result<T, EnvelopeError> {
        let ciphertext = Base64::decode_vec(&self.data).map_err(|_| EnvelopeError::Encoding)?;
        decrypt(key, &ciphertext)
    }
}
