//! Pairwire Crypto
//!
//! Cryptographic primitives behind the handshake:
//!
//! - [`x25519`]: key agreement and HKDF shared key derivation
//! - [`envelope`]: ChaCha20-Poly1305 type 0 / type 1 envelopes
//! - [`eip191`]: `personal_sign` hashing, signer recovery and signing
//!
//! Topic derivation itself lives on the key types in `pairwire-core`.

#![forbid(unsafe_code)]

pub mod eip191;
pub mod envelope;
pub mod error;
pub mod x25519;

pub use eip191::Eip191Signer;
pub use envelope::Envelope;
pub use error::{CryptoError, Result};
