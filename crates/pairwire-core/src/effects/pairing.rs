//! Pairing registry effects

use crate::errors::Result;
use crate::identifiers::Topic;
use crate::participant::AppMetadata;
use async_trait::async_trait;

/// Pairings a handshake runs over
#[async_trait]
pub trait PairingEffects: Send + Sync {
    /// Mark a pairing as active, optionally recording the peer's metadata
    async fn activate(&self, pairing_topic: &Topic, peer_metadata: Option<AppMetadata>)
        -> Result<()>;
}
