//! Agreement key material and topic derivation
//!
//! Only the value types live here; the X25519/HKDF arithmetic that produces
//! them is in `pairwire-crypto`.

use crate::identifiers::Topic;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of X25519 public keys and derived symmetric keys
pub const KEY_LENGTH: usize = 32;

/// Key agreement failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyAgreementError {
    /// Public key input is not a valid 32-byte hex value
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    /// No private key is held for the given public key
    #[error("No private key for public key {0}")]
    UnknownPrivateKey(String),
    /// Secret store failure
    #[error("Key store failure: {0}")]
    Store(String),
}

impl From<KeyAgreementError> for crate::errors::PairwireError {
    fn from(err: KeyAgreementError) -> Self {
        crate::errors::PairwireError::Crypto(err.to_string())
    }
}

/// X25519 public key used for key agreement
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgreementPublicKey([u8; KEY_LENGTH]);

impl AgreementPublicKey {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded key
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyAgreementError> {
        let bytes = hex::decode(hex_key.trim_start_matches("0x"))
            .map_err(|e| KeyAgreementError::InvalidPublicKey(format!("{hex_key}: {e}")))?;
        let bytes: [u8; KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            KeyAgreementError::InvalidPublicKey(format!(
                "expected {KEY_LENGTH} bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Topic a requester listens on for responses: `sha256(public_key)`
    pub fn response_topic(&self) -> Topic {
        Topic::from_sha256(&self.0)
    }
}

impl fmt::Debug for AgreementPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgreementPublicKey({})", self.to_hex())
    }
}

impl TryFrom<String> for AgreementPublicKey {
    type Error = KeyAgreementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<AgreementPublicKey> for String {
    fn from(key: AgreementPublicKey) -> Self {
        key.to_hex()
    }
}

/// Symmetric key derived from a key agreement
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LENGTH]);

impl SymmetricKey {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Topic naming the channel encrypted under this key: `sha256(key)`
    pub fn derived_topic(&self) -> Topic {
        Topic::from_bytes(Sha256::digest(self.0).into())
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Result of a key agreement: the shared key plus our public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementKeys {
    /// Shared symmetric key
    pub shared_key: SymmetricKey,
    /// Our public key used in the agreement
    pub public_key: AgreementPublicKey,
}

impl AgreementKeys {
    /// Topic derived from the shared key
    pub fn derived_topic(&self) -> Topic {
        self.shared_key.derived_topic()
    }
}
