//! Sealed message envelopes
//!
//! ```text
//! type 0: [0x00][nonce 12][ciphertext || tag]
//! type 1: [0x01][sender public key 32][nonce 12][ciphertext || tag]
//! ```
//!
//! Payloads are sealed with ChaCha20-Poly1305 under the symmetric key of the
//! topic they travel on.

use crate::error::{CryptoError, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use pairwire_core::effects::EnvelopeType;
use pairwire_core::keys::{AgreementPublicKey, SymmetricKey, KEY_LENGTH};
use rand::{CryptoRng, RngCore};

/// ChaCha20-Poly1305 nonce length
pub const NONCE_LENGTH: usize = 12;

/// A parsed, still encrypted envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Framing of the envelope
    pub envelope_type: EnvelopeType,
    /// AEAD nonce
    pub nonce: [u8; NONCE_LENGTH],
    /// Ciphertext with the authentication tag appended
    pub sealed: Vec<u8>,
}

impl Envelope {
    /// Encrypt `plaintext` under `key`
    pub fn seal<R: RngCore + CryptoRng>(
        rng: &mut R,
        key: &SymmetricKey,
        plaintext: &[u8],
        envelope_type: EnvelopeType,
    ) -> Result<Self> {
        let mut nonce = [0u8; NONCE_LENGTH];
        rng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::Seal("ChaCha20-Poly1305 encryption failed".to_string()))?;

        Ok(Self {
            envelope_type,
            nonce,
            sealed,
        })
    }

    /// Decrypt the envelope with `key`
    pub fn open(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.sealed.as_slice())
            .map_err(|_| CryptoError::Open("authentication tag mismatch".to_string()))
    }

    /// Serialise to wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + KEY_LENGTH + NONCE_LENGTH + self.sealed.len());
        bytes.push(self.envelope_type.tag());
        if let EnvelopeType::Type1 { sender_public_key } = &self.envelope_type {
            bytes.extend_from_slice(sender_public_key.as_bytes());
        }
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.sealed);
        bytes
    }

    /// Parse wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| CryptoError::Open("empty envelope".to_string()))?;

        let (envelope_type, rest) = match tag {
            0 => (EnvelopeType::Type0, rest),
            1 => {
                if rest.len() < KEY_LENGTH {
                    return Err(CryptoError::Open("truncated sender public key".to_string()));
                }
                let (key, rest) = rest.split_at(KEY_LENGTH);
                let mut key_bytes = [0u8; KEY_LENGTH];
                key_bytes.copy_from_slice(key);
                (
                    EnvelopeType::Type1 {
                        sender_public_key: AgreementPublicKey::from_bytes(key_bytes),
                    },
                    rest,
                )
            }
            other => return Err(CryptoError::Open(format!("unknown envelope type {other}"))),
        };

        if rest.len() < NONCE_LENGTH {
            return Err(CryptoError::Open("truncated nonce".to_string()));
        }
        let (nonce_bytes, sealed) = rest.split_at(NONCE_LENGTH);
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            envelope_type,
            nonce,
            sealed: sealed.to_vec(),
        })
    }
}
