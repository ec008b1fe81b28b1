//! Canonical sign-in message (EIP-4361 / CAIP-122)
//!
//! Signer and verifier both build the message here, so a payload always maps
//! to the same bytes. Optional fields are emitted in a fixed order and the
//! ReCap statement is generated from ordered maps.
//!
//! ```text
//! example.com wants you to sign in with your Ethereum account:
//! 0xabc...
//!
//! Sign in. I further authorize the stated URI to perform ...
//!
//! URI: https://example.com
//! Version: 1
//! Chain ID: 1
//! Nonce: 32891756
//! Issued At: 2024-01-01T00:00:00Z
//! Resources:
//! - urn:recap:...
//! ```

use crate::errors::{AuthenticateError, Result};
use pairwire_core::auth::{AuthPayload, CacaoPayload};
use pairwire_core::Account;
use std::fmt::Write;

/// Builds the message an account signs for a payload
pub trait MessageFormatter: Send + Sync {
    /// Message for `payload`, optionally folding the ReCap grant into the
    /// statement
    fn format_message(&self, payload: &CacaoPayload, include_recap: bool) -> Result<String>;

    /// Message `account` is expected to sign for the requester's payload
    fn format_for_account(
        &self,
        auth_payload: &AuthPayload,
        account: &Account,
        include_recap: bool,
    ) -> Result<String> {
        self.format_message(&auth_payload.cacao_payload(account), include_recap)
    }
}

/// Sign-In with Ethereum style formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct SiweMessageFormatter;

impl SiweMessageFormatter {
    /// Create a formatter
    pub fn new() -> Self {
        Self
    }
}

fn chain_name(namespace: &str) -> &str {
    match namespace {
        "eip155" => "Ethereum",
        "solana" => "Solana",
        other => other,
    }
}

impl MessageFormatter for SiweMessageFormatter {
    fn format_message(&self, payload: &CacaoPayload, include_recap: bool) -> Result<String> {
        let account = payload
            .issuer_account()
            .map_err(|e| AuthenticateError::MalformedCapabilityObject(e.to_string()))?;

        let recap_statement = if include_recap {
            payload
                .recap()
                .map_err(|e| AuthenticateError::MalformedCapabilityObject(e.to_string()))?
                .map(|recap| recap.statement())
        } else {
            None
        };

        let statement = match (payload.statement.as_deref(), recap_statement) {
            (Some(statement), Some(recap)) => Some(format!("{statement} {recap}")),
            (Some(statement), None) => Some(statement.to_string()),
            (None, Some(recap)) => Some(recap),
            (None, None) => None,
        };

        let mut message = format!(
            "{} wants you to sign in with your {} account:\n{}\n",
            payload.domain,
            chain_name(account.namespace()),
            account.address()
        );
        if let Some(statement) = statement {
            let _ = write!(message, "\n{statement}\n");
        }
        let _ = write!(
            message,
            "\nURI: {}\nVersion: {}\nChain ID: {}\nNonce: {}\nIssued At: {}",
            payload.aud,
            payload.version,
            account.reference(),
            payload.nonce,
            payload.iat
        );
        if let Some(exp) = &payload.exp {
            let _ = write!(message, "\nExpiration Time: {exp}");
        }
        if let Some(nbf) = &payload.nbf {
            let _ = write!(message, "\nNot Before: {nbf}");
        }
        if let Some(request_id) = &payload.request_id {
            let _ = write!(message, "\nRequest ID: {request_id}");
        }
        if let Some(resources) = payload.resources.as_deref().filter(|r| !r.is_empty()) {
            message.push_str("\nResources:");
            for resource in resources {
                let _ = write!(message, "\n- {resource}");
            }
        }
        Ok(message)
    }
}
