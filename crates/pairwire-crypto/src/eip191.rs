//! EIP-191 `personal_sign` signatures over secp256k1
//!
//! Signatures are 65 bytes `r || s || v` with `v` in `{0, 1, 27, 28}`. The
//! signer is recovered from the signature and compared against the claimed
//! address, case-insensitively.

use crate::error::{CryptoError, Result};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use sha3::{Digest, Keccak256};

/// Length of a recoverable signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Keccak-256 of the EIP-191 prefixed message
pub fn personal_sign_hash(message: &str) -> [u8; 32] {
    let bytes = message.as_bytes();
    let prefix = format!("\x19Ethereum Signed Message:\n{}", bytes.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(bytes);
    hasher.finalize().into()
}

/// `0x`-prefixed lowercase address of a secp256k1 public key
pub fn address_from_verifying_key(key: &VerifyingKey) -> String {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed point marker
    let digest = Keccak256::digest(&encoded.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

fn normalize_recovery_id(raw: u8) -> Result<RecoveryId> {
    let id = match raw {
        27 | 28 => raw - 27,
        0 | 1 => raw,
        _ => {
            return Err(CryptoError::InvalidSignature(
                "recovery id must be 0/1 or 27/28".to_string(),
            ))
        }
    };
    RecoveryId::try_from(id)
        .map_err(|_| CryptoError::InvalidSignature("recovery id is invalid".to_string()))
}

/// Recover the address that produced `signature_hex` over `message`
pub fn recover_address(message: &str, signature_hex: &str) -> Result<String> {
    let bytes = hex::decode(signature_hex.trim_start_matches("0x"))
        .map_err(|e| CryptoError::InvalidSignature(format!("signature is not hex: {e}")))?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignature(format!(
            "signature must decode to {SIGNATURE_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }

    let signature = Signature::try_from(&bytes[..64])
        .map_err(|e| CryptoError::InvalidSignature(format!("invalid ECDSA bytes: {e}")))?;
    let recovery_id = normalize_recovery_id(bytes[64])?;
    let prehash = personal_sign_hash(message);
    let key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(format!("signer recovery failed: {e}")))?;
    Ok(address_from_verifying_key(&key))
}

/// Verify that `address` signed `message`
pub fn verify(message: &str, signature_hex: &str, address: &str) -> Result<()> {
    let recovered = recover_address(message, signature_hex)?;
    if !recovered.eq_ignore_ascii_case(address) {
        return Err(CryptoError::SignerMismatch {
            expected: address.to_string(),
            recovered,
        });
    }
    Ok(())
}

/// A secp256k1 account able to produce `personal_sign` signatures
#[derive(Clone)]
pub struct Eip191Signer {
    key: SigningKey,
}

impl Eip191Signer {
    /// Random account
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            key: SigningKey::random(rng),
        }
    }

    /// Account from a hex private key
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|e| CryptoError::InvalidKey(format!("private key is not hex: {e}")))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid secp256k1 key: {e}")))?;
        Ok(Self { key })
    }

    /// Address of the account
    pub fn address(&self) -> String {
        address_from_verifying_key(self.key.verifying_key())
    }

    /// `0x`-prefixed 65-byte signature over the EIP-191 hash of `message`
    pub fn sign(&self, message: &str) -> Result<String> {
        let prehash = personal_sign_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| CryptoError::InvalidSignature(format!("signing failed: {e}")))?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Ok(format!("0x{}", hex::encode(bytes)))
    }
}

impl std::fmt::Debug for Eip191Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eip191Signer")
            .field("address", &self.address())
            .finish()
    }
}
