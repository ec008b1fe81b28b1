//! In-memory relay network handler
//!
//! Publishes are recorded instead of sent. Tests drive the requester side by
//! pushing payloads into the response subscriptions with
//! [`MemoryNetworkHandler::deliver_response`] and
//! [`MemoryNetworkHandler::deliver_error`].

use async_trait::async_trait;
use pairwire_core::effects::{EnvelopeType, NetworkEffects};
use pairwire_core::rpc::{
    ProtocolMethod, ResponseSubscriptionErrorPayload, ResponseSubscriptionPayload, RpcResponse,
};
use pairwire_core::{RequestId, Result, Topic};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A request published through the handler
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRequest {
    /// Destination topic
    pub topic: Topic,
    /// Request id
    pub id: RequestId,
    /// Protocol method
    pub method: ProtocolMethod,
    /// Request params
    pub params: serde_json::Value,
}

/// A response published through the handler
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedResponse {
    /// Destination topic
    pub topic: Topic,
    /// JSON-RPC response
    pub response: RpcResponse,
    /// Protocol method
    pub method: ProtocolMethod,
    /// Envelope framing
    pub envelope: EnvelopeType,
}

type Senders<T> = Arc<Mutex<HashMap<ProtocolMethod, Vec<mpsc::UnboundedSender<T>>>>>;

/// Network handler that records traffic and fans out injected responses
#[derive(Clone, Default)]
pub struct MemoryNetworkHandler {
    subscriptions: Arc<Mutex<Vec<Topic>>>,
    requests: Arc<Mutex<Vec<PublishedRequest>>>,
    responses: Arc<Mutex<Vec<PublishedResponse>>>,
    response_senders: Senders<ResponseSubscriptionPayload>,
    error_senders: Senders<ResponseSubscriptionErrorPayload>,
}

impl MemoryNetworkHandler {
    /// Create a handler with no traffic
    pub fn new() -> Self {
        Self::default()
    }

    /// Topics subscribed so far, in order
    pub fn subscriptions(&self) -> Vec<Topic> {
        self.subscriptions.lock().clone()
    }

    /// Requests published so far
    pub fn requests(&self) -> Vec<PublishedRequest> {
        self.requests.lock().clone()
    }

    /// Responses published so far
    pub fn responses(&self) -> Vec<PublishedResponse> {
        self.responses.lock().clone()
    }

    /// Number of publishes of any kind
    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().len() + self.responses.lock().len()
    }

    /// Deliver a success response to every subscriber of `method`
    pub fn deliver_response(&self, method: ProtocolMethod, payload: ResponseSubscriptionPayload) {
        let mut senders = self.response_senders.lock();
        if let Some(list) = senders.get_mut(&method) {
            list.retain(|tx| tx.send(payload.clone()).is_ok());
        }
    }

    /// Deliver an error response to every subscriber of `method`
    pub fn deliver_error(&self, method: ProtocolMethod, payload: ResponseSubscriptionErrorPayload) {
        let mut senders = self.error_senders.lock();
        if let Some(list) = senders.get_mut(&method) {
            list.retain(|tx| tx.send(payload.clone()).is_ok());
        }
    }
}

#[async_trait]
impl NetworkEffects for MemoryNetworkHandler {
    async fn subscribe(&self, topic: &Topic) -> Result<()> {
        self.subscriptions.lock().push(topic.clone());
        tracing::debug!(topic = %topic, "Subscribed");
        Ok(())
    }

    async fn request(
        &self,
        topic: &Topic,
        id: RequestId,
        method: ProtocolMethod,
        params: serde_json::Value,
    ) -> Result<()> {
        self.requests.lock().push(PublishedRequest {
            topic: topic.clone(),
            id,
            method,
            params,
        });
        Ok(())
    }

    async fn respond(
        &self,
        topic: &Topic,
        response: RpcResponse,
        method: ProtocolMethod,
        envelope: EnvelopeType,
    ) -> Result<()> {
        self.responses.lock().push(PublishedResponse {
            topic: topic.clone(),
            response,
            method,
            envelope,
        });
        Ok(())
    }

    fn response_subscription(
        &self,
        method: ProtocolMethod,
    ) -> mpsc::UnboundedReceiver<ResponseSubscriptionPayload> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.response_senders.lock().entry(method).or_default().push(tx);
        rx
    }

    fn response_error_subscription(
        &self,
        method: ProtocolMethod,
    ) -> mpsc::UnboundedReceiver<ResponseSubscriptionErrorPayload> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.error_senders.lock().entry(method).or_default().push(tx);
        rx
    }
}
