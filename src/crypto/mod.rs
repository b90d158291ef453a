// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encryption Layers
//!
//! Two independent AES-256-GCM layers protect note data:
//!
//! - [`envelope`] - wraps every request and response body in a ciphertext
//!   sealed with the per-session [`TransportKey`].
//! - [`field`] - encrypts sensitive record fields before they reach storage,
//!   using the server-held [`FieldKey`].
//!
//! Both layers share the same sealed byte layout:
//!
//! ```text
//! [ nonce (12 bytes) | ciphertext | tag (16 bytes) ]
//! ```
//!
//! A fresh random nonce is drawn from the OS RNG for every seal.

pub mod envelope;
pub mod field;
pub mod keys;

pub use envelope::{Envelope, EnvelopeError};
pub use field::{Decrypted, Encrypted, FieldCipher, FieldCipherError, SensitiveFields};
pub use keys::{FieldKey, KeyError, TransportKey, KEY_LEN};

use aes_gcm::{
    aead::{Aead, AeadCore, OsRng, Payload},
    Aes256Gcm, Nonce,
};

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` and prepend the random nonce.
pub(crate) fn seal(
    cipher: &Aes256Gcm,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, aes_gcm::Error> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher.encrypt(&nonce, Payload { msg: plaintext, aad })?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Authenticate and decrypt bytes produced by [`seal`].
pub(crate) fn open(
    cipher: &Aes256Gcm,
    sealed: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, aes_gcm::Error> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(aes_gcm::Error);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher.decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
}
