//! In-memory key management handler
//!
//! Private keys, agreement secrets and topic public keys sit in three
//! independent maps. Every entry is keyed by its own public key or topic, so
//! concurrent handshakes only ever touch disjoint entries.

use async_trait::async_trait;
use pairwire_core::effects::KeyManagementEffects;
use pairwire_core::keys::{AgreementKeys, AgreementPublicKey, KeyAgreementError};
use pairwire_core::Topic;
use pairwire_crypto::x25519;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use x25519_dalek::StaticSecret;

/// Key management handler holding everything in memory
#[derive(Clone, Default)]
pub struct MemoryKeyManagementHandler {
    private_keys: Arc<RwLock<HashMap<AgreementPublicKey, StaticSecret>>>,
    secrets: Arc<RwLock<HashMap<Topic, AgreementKeys>>>,
    public_keys: Arc<RwLock<HashMap<Topic, AgreementPublicKey>>>,
}

impl MemoryKeyManagementHandler {
    /// Create an empty handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of key pairs held
    pub async fn key_pair_count(&self) -> usize {
        self.private_keys.read().await.len()
    }

    /// Number of agreement secrets held
    pub async fn secret_count(&self) -> usize {
        self.secrets.read().await.len()
    }
}

#[async_trait]
impl KeyManagementEffects for MemoryKeyManagementHandler {
    async fn create_x25519_key_pair(&self) -> Result<AgreementPublicKey, KeyAgreementError> {
        let secret = x25519::new(&mut rand::thread_rng());
        let public_key = x25519::public_key(&secret);
        self.private_keys.write().await.insert(public_key, secret);
        tracing::trace!(public_key = %public_key.to_hex(), "Created X25519 key pair");
        Ok(public_key)
    }

    async fn perform_key_agreement(
        &self,
        self_public_key: &AgreementPublicKey,
        peer_public_key: &str,
    ) -> Result<AgreementKeys, KeyAgreementError> {
        let peer = x25519::decode_public_key(peer_public_key)?;
        let shared_key = {
            let private_keys = self.private_keys.read().await;
            let secret = private_keys
                .get(self_public_key)
                .ok_or_else(|| KeyAgreementError::UnknownPrivateKey(self_public_key.to_hex()))?;
            x25519::shared_key(secret, &peer)?
        };
        Ok(AgreementKeys {
            shared_key,
            public_key: *self_public_key,
        })
    }

    async fn set_agreement_secret(
        &self,
        keys: AgreementKeys,
        topic: &Topic,
    ) -> Result<(), KeyAgreementError> {
        self.secrets.write().await.insert(topic.clone(), keys);
        Ok(())
    }

    async fn get_agreement_secret(
        &self,
        topic: &Topic,
    ) -> Result<Option<AgreementKeys>, KeyAgreementError> {
        Ok(self.secrets.read().await.get(topic).cloned())
    }

    async fn set_public_key(
        &self,
        public_key: AgreementPublicKey,
        topic: &Topic,
    ) -> Result<(), KeyAgreementError> {
        self.public_keys.write().await.insert(topic.clone(), public_key);
        Ok(())
    }

    async fn get_public_key(
        &self,
        topic: &Topic,
    ) -> Result<Option<AgreementPublicKey>, KeyAgreementError> {
        Ok(self.public_keys.read().await.get(topic).copied())
    }
}
