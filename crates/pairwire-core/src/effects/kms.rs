//! Key management effects
//!
//! Private keys never leave the handler: callers name key pairs by their
//! public key and secrets by the topic they protect. Entries for distinct
//! topics are independent, so concurrent handshakes cannot clobber each
//! other.

use crate::identifiers::Topic;
use crate::keys::{AgreementKeys, AgreementPublicKey, KeyAgreementError};
use async_trait::async_trait;

/// Key pairs, X25519 agreements and topic-scoped secrets
#[async_trait]
pub trait KeyManagementEffects: Send + Sync {
    /// Generate and retain a fresh X25519 key pair, returning its public key
    async fn create_x25519_key_pair(&self) -> Result<AgreementPublicKey, KeyAgreementError>;

    /// Agree on a shared key between a held key pair and a peer public key (hex)
    async fn perform_key_agreement(
        &self,
        self_public_key: &AgreementPublicKey,
        peer_public_key: &str,
    ) -> Result<AgreementKeys, KeyAgreementError>;

    /// Persist agreement keys under the topic they protect
    async fn set_agreement_secret(
        &self,
        keys: AgreementKeys,
        topic: &Topic,
    ) -> Result<(), KeyAgreementError>;

    /// Agreement keys stored for a topic
    async fn get_agreement_secret(
        &self,
        topic: &Topic,
    ) -> Result<Option<AgreementKeys>, KeyAgreementError>;

    /// Remember which of our public keys listens on a topic
    async fn set_public_key(
        &self,
        public_key: AgreementPublicKey,
        topic: &Topic,
    ) -> Result<(), KeyAgreementError>;

    /// Public key registered for a topic
    async fn get_public_key(
        &self,
        topic: &Topic,
    ) -> Result<Option<AgreementPublicKey>, KeyAgreementError>;
}
