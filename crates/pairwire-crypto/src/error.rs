//! Crypto primitive errors

use pairwire_core::{KeyAgreementError, PairwireError};

/// Failures of the primitives in this crate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Key bytes are malformed
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// Signature bytes are malformed or do not verify
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    /// Recovered signer differs from the claimed one
    #[error("Signer mismatch: expected {expected}, recovered {recovered}")]
    SignerMismatch {
        /// Claimed address
        expected: String,
        /// Address recovered from the signature
        recovered: String,
    },
    /// Encryption failed
    #[error("Sealing failed: {0}")]
    Seal(String),
    /// Decryption or envelope parsing failed
    #[error("Opening failed: {0}")]
    Open(String),
}

/// Result type for crypto primitives
pub type Result<T> = std::result::Result<T, CryptoError>;

impl From<CryptoError> for PairwireError {
    fn from(err: CryptoError) -> Self {
        PairwireError::Crypto(err.to_string())
    }
}

impl From<CryptoError> for KeyAgreementError {
    fn from(err: CryptoError) -> Self {
        KeyAgreementError::InvalidPublicKey(err.to_string())
    }
}
