//! Signature verification for capability objects

use crate::errors::{AuthenticateError, Result};
use async_trait::async_trait;
use pairwire_core::auth::{CacaoSignature, CacaoSignatureType};
use pairwire_core::{Account, PairwireError};
use pairwire_crypto::eip191;
use std::sync::Arc;

/// Checks a CACAO signature over an already formatted message
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Verify that `account` produced `signature` over `message`
    async fn verify(
        &self,
        signature: &CacaoSignature,
        message: &str,
        account: &Account,
    ) -> Result<()>;
}

/// On-chain EIP-1271 `isValidSignature` lookups for contract accounts
#[async_trait]
pub trait ContractSignatureResolver: Send + Sync {
    /// Whether the contract at `account` accepts `signature` for `message_hash`
    async fn is_valid_signature(
        &self,
        account: &Account,
        message_hash: [u8; 32],
        signature: &str,
    ) -> std::result::Result<bool, PairwireError>;
}

/// Verifier for `eip155` accounts
///
/// EIP-191 signatures are checked locally by recovering the signer. EIP-1271
/// signatures need a [`ContractSignatureResolver`] and are rejected without
/// one. Other namespaces have no verifier.
#[derive(Clone, Default)]
pub struct MessageVerifier {
    contract_resolver: Option<Arc<dyn ContractSignatureResolver>>,
}

impl MessageVerifier {
    /// Verifier without contract account support
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier delegating EIP-1271 checks to `resolver`
    pub fn with_contract_resolver(resolver: Arc<dyn ContractSignatureResolver>) -> Self {
        Self {
            contract_resolver: Some(resolver),
        }
    }
}

fn invalid(account: &Account, reason: impl Into<String>) -> AuthenticateError {
    AuthenticateError::SignatureInvalid {
        account: account.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl SignatureVerifier for MessageVerifier {
    async fn verify(
        &self,
        signature: &CacaoSignature,
        message: &str,
        account: &Account,
    ) -> Result<()> {
        if account.namespace() != "eip155" {
            return Err(invalid(
                account,
                format!("no verifier for namespace {}", account.namespace()),
            ));
        }

        match signature.t {
            CacaoSignatureType::Eip191 => {
                eip191::verify(message, &signature.s, account.address())
                    .map_err(|e| invalid(account, e.to_string()))
            }
            CacaoSignatureType::Eip1271 => {
                let resolver = self
                    .contract_resolver
                    .as_ref()
                    .ok_or_else(|| invalid(account, "no contract signature resolver"))?;
                let hash = eip191::personal_sign_hash(message);
                match resolver.is_valid_signature(account, hash, &signature.s).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(invalid(account, "contract rejected signature")),
                    Err(e) => Err(invalid(account, e.to_string())),
                }
            }
        }
    }
}
