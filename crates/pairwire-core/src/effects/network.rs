//! Transport effects: relay publishing, subscriptions and link-mode delivery

use crate::errors::Result;
use crate::identifiers::{RequestId, Topic};
use crate::keys::AgreementPublicKey;
use crate::rpc::{
    ProtocolMethod, ResponseSubscriptionErrorPayload, ResponseSubscriptionPayload, RpcResponse,
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// How a message is framed before encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeType {
    /// Sealed with a key both sides already hold
    Type0,
    /// Sealed with a fresh agreement; carries the sender's public key
    Type1 {
        /// Sender public key the receiver agrees against
        sender_public_key: AgreementPublicKey,
    },
}

impl EnvelopeType {
    /// Leading byte of the serialised envelope
    pub fn tag(&self) -> u8 {
        match self {
            EnvelopeType::Type0 => 0,
            EnvelopeType::Type1 { .. } => 1,
        }
    }
}

/// Relay network interactions
#[async_trait]
pub trait NetworkEffects: Send + Sync {
    /// Subscribe to messages on a topic
    async fn subscribe(&self, topic: &Topic) -> Result<()>;

    /// Publish a request on a topic
    async fn request(
        &self,
        topic: &Topic,
        id: RequestId,
        method: ProtocolMethod,
        params: serde_json::Value,
    ) -> Result<()>;

    /// Publish a response on a topic
    async fn respond(
        &self,
        topic: &Topic,
        response: RpcResponse,
        method: ProtocolMethod,
        envelope: EnvelopeType,
    ) -> Result<()>;

    /// Stream of successful responses to requests of `method`
    fn response_subscription(
        &self,
        method: ProtocolMethod,
    ) -> mpsc::UnboundedReceiver<ResponseSubscriptionPayload>;

    /// Stream of error responses to requests of `method`
    fn response_error_subscription(
        &self,
        method: ProtocolMethod,
    ) -> mpsc::UnboundedReceiver<ResponseSubscriptionErrorPayload>;
}

/// Link-mode delivery through a peer's universal link
#[async_trait]
pub trait LinkEnvelopeEffects: Send + Sync {
    /// Seal `response` for `topic` and open it at `peer_universal_link`,
    /// returning the dispatched URL
    async fn respond(
        &self,
        topic: &Topic,
        response: RpcResponse,
        peer_universal_link: &str,
        envelope: EnvelopeType,
    ) -> Result<String>;
}
