//! Collaborators shared by both handshake roles

use crate::capability::CapabilityVerifier;
use crate::formatter::SiweMessageFormatter;
use crate::namespaces::SessionNamespaceBuilder;
use crate::verifier::{MessageVerifier, SignatureVerifier};
use pairwire_core::config::AuthenticateConfig;
use pairwire_core::effects::{
    KeyManagementEffects, LinkEnvelopeEffects, NetworkEffects, PairingEffects, RpcHistory,
    SessionStore, TimeEffects,
};
use std::sync::Arc;

/// Effect handlers a handshake runs against
#[derive(Clone)]
pub struct AuthenticateEffects {
    /// Key pairs and topic secrets
    pub kms: Arc<dyn KeyManagementEffects>,
    /// Relay publishing and subscriptions
    pub network: Arc<dyn NetworkEffects>,
    /// Link-mode delivery
    pub link: Arc<dyn LinkEnvelopeEffects>,
    /// Session records
    pub sessions: Arc<dyn SessionStore>,
    /// Request history
    pub history: Arc<dyn RpcHistory>,
    /// Pairing registry
    pub pairing: Arc<dyn PairingEffects>,
    /// Wall clock
    pub time: Arc<dyn TimeEffects>,
}

/// Effects plus the verification pipeline built from configuration
#[derive(Clone)]
pub struct HandshakeContext {
    /// Collaborators
    pub effects: AuthenticateEffects,
    /// Capability verification
    pub verifier: CapabilityVerifier,
    /// Namespace derivation
    pub namespaces: SessionNamespaceBuilder,
    /// Configuration
    pub config: AuthenticateConfig,
}

impl HandshakeContext {
    /// Context using the SIWE formatter and the default signature verifier
    pub fn new(effects: AuthenticateEffects, config: AuthenticateConfig) -> Self {
        Self::with_signature_verifier(effects, config, Arc::new(MessageVerifier::new()))
    }

    /// Context using a custom signature verifier
    pub fn with_signature_verifier(
        effects: AuthenticateEffects,
        config: AuthenticateConfig,
        signatures: Arc<dyn SignatureVerifier>,
    ) -> Self {
        let verifier = CapabilityVerifier::new(
            Arc::new(SiweMessageFormatter),
            signatures,
            config.include_recap_in_statement,
        );
        let namespaces = SessionNamespaceBuilder::new(config.default_events.clone());
        Self {
            effects,
            verifier,
            namespaces,
            config,
        }
    }
}
