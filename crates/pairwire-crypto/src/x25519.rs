//! X25519 key agreement and shared key derivation
//!
//! shared key = HKDF-SHA256(ikm = X25519(secret, peer), no salt, empty info)

use crate::error::{CryptoError, Result};
use hkdf::Hkdf;
use pairwire_core::keys::{AgreementPublicKey, SymmetricKey, KEY_LENGTH};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

/// Generate a new long-lived X25519 secret
pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> StaticSecret {
    StaticSecret::random_from_rng(rng)
}

/// Public key of a secret
pub fn public_key(secret: &StaticSecret) -> AgreementPublicKey {
    AgreementPublicKey::from_bytes(PublicKey::from(secret).to_bytes())
}

/// Decode a peer public key from hex
pub fn decode_public_key(public_key: &str) -> Result<PublicKey> {
    let key = AgreementPublicKey::from_hex(public_key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    Ok(PublicKey::from(*key.as_bytes()))
}

/// Derive the shared symmetric key between our secret and a peer public key
pub fn shared_key(secret: &StaticSecret, peer: &PublicKey) -> Result<SymmetricKey> {
    let shared = secret.diffie_hellman(peer);
    // An all-zero output means the peer sent a low-order point
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey(
            "peer public key is a low-order point".to_string(),
        ));
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = [0u8; KEY_LENGTH];
    hkdf.expand(&[], &mut okm)
        .map_err(|e| CryptoError::InvalidKey(format!("HKDF expansion failed: {e}")))?;
    Ok(SymmetricKey::from_bytes(okm))
}
