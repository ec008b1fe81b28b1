//! In-memory pairing registry

use async_trait::async_trait;
use pairwire_core::effects::PairingEffects;
use pairwire_core::{AppMetadata, Result, Topic};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Pairing registry that records activations
#[derive(Debug, Clone, Default)]
pub struct MemoryPairingRegistry {
    active: Arc<RwLock<HashMap<Topic, Option<AppMetadata>>>>,
}

impl MemoryPairingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pairing has been activated
    pub async fn is_active(&self, pairing_topic: &Topic) -> bool {
        self.active.read().await.contains_key(pairing_topic)
    }

    /// Peer metadata recorded at activation
    pub async fn peer_metadata(&self, pairing_topic: &Topic) -> Option<AppMetadata> {
        self.active.read().await.get(pairing_topic).cloned().flatten()
    }
}

#[async_trait]
impl PairingEffects for MemoryPairingRegistry {
    async fn activate(
        &self,
        pairing_topic: &Topic,
        peer_metadata: Option<AppMetadata>,
    ) -> Result<()> {
        let mut active = self.active.write().await;
        active.insert(pairing_topic.clone(), peer_metadata);
        tracing::debug!(topic = %pairing_topic, "Pairing activated");
        Ok(())
    }
}
