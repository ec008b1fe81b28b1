//! Session namespaces derived from verified capability objects
//!
//! Chains and accounts come from each CACAO issuer, methods from the
//! `request/` actions of its ReCap grant for the issuer's namespace. Events
//! are the configured defaults. Output lives in ordered sets, so building
//! twice from the same batch yields the same value.

use crate::errors::{AuthenticateError, Result};
use pairwire_core::auth::Cacao;
use pairwire_core::{Account, Blockchain, NamespaceSet};
use std::collections::BTreeMap;

/// Builds a session's permission set from a verified batch
#[derive(Debug, Clone, Default)]
pub struct SessionNamespaceBuilder {
    default_events: Vec<String>,
}

impl SessionNamespaceBuilder {
    /// Create a builder granting `default_events` on every namespace
    pub fn new(default_events: Vec<String>) -> Self {
        Self { default_events }
    }

    /// Namespace set granted by `cacaos`
    pub fn build(&self, cacaos: &[Cacao]) -> Result<NamespaceSet> {
        if cacaos.is_empty() {
            return Err(AuthenticateError::InvalidCapabilityGrant(
                "no capability objects".to_string(),
            ));
        }

        let mut namespaces = NamespaceSet::new();
        let mut claimed: BTreeMap<Blockchain, Account> = BTreeMap::new();

        for cacao in cacaos {
            let account = cacao
                .p
                .issuer_account()
                .map_err(|e| AuthenticateError::InvalidCapabilityGrant(e.to_string()))?;

            if let Some(existing) = claimed.get(account.blockchain()) {
                if !existing.address().eq_ignore_ascii_case(account.address()) {
                    return Err(AuthenticateError::InvalidCapabilityGrant(format!(
                        "conflicting accounts {existing} and {account} on {}",
                        account.blockchain()
                    )));
                }
            }

            let recap = cacao
                .p
                .recap()
                .map_err(|e| AuthenticateError::InvalidCapabilityGrant(e.to_string()))?
                .ok_or_else(|| {
                    AuthenticateError::InvalidCapabilityGrant(format!(
                        "{account} carries no ReCap grant"
                    ))
                })?;
            let methods = recap.request_methods(account.namespace());
            if methods.is_empty() {
                return Err(AuthenticateError::InvalidCapabilityGrant(format!(
                    "{account} grants no methods for {}",
                    account.namespace()
                )));
            }

            let namespace = namespaces.entry(account.namespace().to_string()).or_default();
            namespace.chains.insert(account.blockchain().clone());
            namespace.methods.extend(methods);
            namespace.events.extend(self.default_events.iter().cloned());
            namespace.accounts.insert(account.clone());
            claimed.insert(account.blockchain().clone(), account);
        }

        Ok(namespaces)
    }
}
