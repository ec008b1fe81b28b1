//! Capability object verification
//!
//! Each CACAO is checked in two stages. First the message it signed is
//! rebuilt from its own payload and compared byte for byte with the message
//! rebuilt from the requester's original payload for the same account. Only
//! when they are identical is the signature checked. A valid signature over
//! some other message therefore surfaces as `MessageMismatch`, never as a
//! signature failure.

use crate::errors::{AuthenticateError, Result};
use crate::formatter::MessageFormatter;
use crate::verifier::SignatureVerifier;
use pairwire_core::auth::{AuthPayload, Cacao};
use pairwire_core::Account;
use std::sync::Arc;

/// Verifies capability objects against the request they answer
#[derive(Clone)]
pub struct CapabilityVerifier {
    formatter: Arc<dyn MessageFormatter>,
    signatures: Arc<dyn SignatureVerifier>,
    include_recap: bool,
}

impl CapabilityVerifier {
    /// Create a verifier; `include_recap` folds ReCap grants into statements
    pub fn new(
        formatter: Arc<dyn MessageFormatter>,
        signatures: Arc<dyn SignatureVerifier>,
        include_recap: bool,
    ) -> Self {
        Self {
            formatter,
            signatures,
            include_recap,
        }
    }

    /// Message `account` should have signed for the requester's payload
    pub fn reconstruct_message(&self, auth_payload: &AuthPayload, account: &Account) -> Result<String> {
        self.formatter
            .format_for_account(auth_payload, account, self.include_recap)
    }

    /// Check `cacao` against an expected message
    pub async fn verify(&self, cacao: &Cacao, expected_message: &str) -> Result<()> {
        let account = cacao
            .p
            .issuer_account()
            .map_err(|e| AuthenticateError::MalformedCapabilityObject(e.to_string()))?;
        let signed_message = self.formatter.format_message(&cacao.p, self.include_recap)?;

        if signed_message != expected_message {
            return Err(AuthenticateError::MessageMismatch {
                account: account.to_string(),
            });
        }

        self.signatures
            .verify(&cacao.s, &signed_message, &account)
            .await
    }

    /// Recover the claimed account of `cacao` and verify it against the
    /// requester's payload
    pub async fn recover_and_verify(&self, auth_payload: &AuthPayload, cacao: &Cacao) -> Result<Account> {
        let account = cacao
            .p
            .issuer_account()
            .map_err(|e| AuthenticateError::MalformedCapabilityObject(e.to_string()))?;
        let expected = self
            .reconstruct_message(auth_payload, &account)
            .map_err(|_| AuthenticateError::MessageMismatch {
                account: account.to_string(),
            })?;

        self.verify(cacao, &expected).await?;
        tracing::trace!(account = %account, "Capability object verified");
        Ok(account)
    }

    /// Verify a whole batch, stopping at the first failure
    pub async fn verify_batch(&self, auth_payload: &AuthPayload, cacaos: &[Cacao]) -> Result<Vec<Account>> {
        let mut accounts = Vec::with_capacity(cacaos.len());
        for cacao in cacaos {
            accounts.push(self.recover_and_verify(auth_payload, cacao).await?);
        }
        Ok(accounts)
    }
}
