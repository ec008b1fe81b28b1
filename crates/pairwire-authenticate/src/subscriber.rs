//! Requester side of the handshake: the response subscriber
//!
//! Success and error responses arrive on two independent subscriptions with
//! no ordering between them. A request id is claimed by the first terminal
//! event processed for it; later events for the same id are ignored. Error
//! codes with no [`AuthError`] mapping are dropped without claiming.
//!
//! A claim is kept for one request lifetime (`request_ttl_secs`) and pruned
//! afterwards, since the relay stops delivering responses to an expired
//! request.

use crate::context::HandshakeContext;
use crate::errors::{AuthenticateError, Result};
use crate::session::{agree_and_store, SessionDraft};
use pairwire_core::auth::{
    AuthError, SessionAuthenticateRequestParams, SessionAuthenticateResponseParams,
};
use pairwire_core::effects::RpcHistory;
use pairwire_core::keys::AgreementPublicKey;
use pairwire_core::rpc::{
    ProtocolMethod, ResponseSubscriptionErrorPayload, ResponseSubscriptionPayload, RpcOutcome,
    RpcResponse,
};
use pairwire_core::{RequestId, Session, TransportType};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Receives the outcome of every request this side sent
pub type AuthResponseCallback =
    Arc<dyn Fn(RequestId, std::result::Result<Session, AuthError>) + Send + Sync>;

/// A response matched back to the request it answers
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelatedResponse {
    /// Successful response
    Success(ResponseSubscriptionPayload),
    /// Error response
    Error(ResponseSubscriptionErrorPayload),
}

/// Turns responses into sessions and reports them through a callback
#[derive(Clone)]
pub struct AuthResponseSubscriber {
    inner: Arc<Inner>,
}

struct Inner {
    context: HandshakeContext,
    callback: AuthResponseCallback,
    /// Request id to the second it was claimed
    claimed: Mutex<HashMap<RequestId, u64>>,
}

/// Tasks consuming the two response subscriptions
pub struct SubscriptionTasks {
    /// Success response loop
    pub responses: JoinHandle<()>,
    /// Error response loop
    pub errors: JoinHandle<()>,
}

impl SubscriptionTasks {
    /// Stop both loops
    pub fn abort(&self) {
        self.responses.abort();
        self.errors.abort();
    }
}

impl AuthResponseSubscriber {
    /// Create a subscriber reporting to `callback`
    pub fn new(context: HandshakeContext, callback: AuthResponseCallback) -> Self {
        Self {
            inner: Arc::new(Inner {
                context,
                callback,
                claimed: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to `wc_sessionAuthenticate` responses and errors
    pub fn start(&self) -> SubscriptionTasks {
        let network = &self.inner.context.effects.network;
        let mut responses = network.response_subscription(ProtocolMethod::SessionAuthenticate);
        let mut errors = network.response_error_subscription(ProtocolMethod::SessionAuthenticate);

        let subscriber = self.clone();
        let responses = tokio::spawn(async move {
            while let Some(payload) = responses.recv().await {
                subscriber.handle_response(payload).await;
            }
        });
        let subscriber = self.clone();
        let errors = tokio::spawn(async move {
            while let Some(payload) = errors.recv().await {
                subscriber.handle_error(payload);
            }
        });

        SubscriptionTasks { responses, errors }
    }

    fn claim(&self, id: RequestId) -> bool {
        let context = &self.inner.context;
        let now = context.effects.time.now_secs();
        let ttl = context.config.request_ttl_secs;

        let mut claimed = self.inner.claimed.lock();
        claimed.retain(|_, at| now.saturating_sub(*at) <= ttl);
        if claimed.contains_key(&id) {
            return false;
        }
        claimed.insert(id, now);
        true
    }

    /// Number of completed requests still remembered
    pub fn claimed_count(&self) -> usize {
        self.inner.claimed.lock().len()
    }

    /// Handle an error response; returns whether the callback fired
    pub fn handle_error(&self, payload: ResponseSubscriptionErrorPayload) -> bool {
        let Some(error) = AuthError::from_code(payload.error.code) else {
            tracing::debug!(request_id = %payload.id, code = payload.error.code, "Dropping unmapped error response");
            return false;
        };
        if !self.claim(payload.id) {
            tracing::debug!(request_id = %payload.id, "Request already completed");
            return false;
        }
        tracing::info!(request_id = %payload.id, error = %error, "Session authenticate rejected by peer");
        (self.inner.callback)(payload.id, Err(error));
        true
    }

    /// Handle a success response; returns whether the callback fired
    pub async fn handle_response(&self, payload: ResponseSubscriptionPayload) -> bool {
        self.complete(payload, TransportType::Relay).await
    }

    async fn complete(&self, payload: ResponseSubscriptionPayload, transport: TransportType) -> bool {
        let id = payload.id;
        if !self.claim(id) {
            tracing::debug!(request_id = %id, "Request already completed");
            return false;
        }

        let outcome = self.create_session(payload, transport).await.map_err(|err| {
            tracing::warn!(request_id = %id, error = %err, "Session authenticate response rejected");
            err.to_auth_error()
        });
        if let Ok(session) = &outcome {
            tracing::info!(request_id = %id, topic = %session.topic, "Session authenticated");
        }
        (self.inner.callback)(id, outcome);
        true
    }

    /// Handle a response received through a link envelope
    pub async fn handle_link_response(&self, response: RpcResponse) -> Result<bool> {
        match correlate(self.inner.context.effects.history.as_ref(), response).await? {
            CorrelatedResponse::Success(payload) => {
                Ok(self.complete(payload, TransportType::LinkMode).await)
            }
            CorrelatedResponse::Error(payload) => Ok(self.handle_error(payload)),
        }
    }

    async fn create_session(
        &self,
        payload: ResponseSubscriptionPayload,
        transport_type: TransportType,
    ) -> Result<Session> {
        let context = &self.inner.context;
        let effects = &context.effects;
        let pairing_topic = payload.topic;

        effects.pairing.activate(&pairing_topic, None).await?;

        let request: SessionAuthenticateRequestParams = serde_json::from_value(payload.request)
            .map_err(|e| AuthenticateError::MalformedRequest(e.to_string()))?;
        let response: SessionAuthenticateResponseParams = serde_json::from_value(payload.response)
            .map_err(|e| AuthenticateError::MalformedCapabilityObject(e.to_string()))?;

        context
            .verifier
            .verify_batch(&request.auth_payload, &response.cacaos)
            .await?;

        let self_public_key = AgreementPublicKey::from_hex(&request.requester.public_key)?;
        let session_topic = agree_and_store(
            effects.kms.as_ref(),
            &self_public_key,
            &response.responder.public_key,
        )
        .await?;

        let namespaces = context.namespaces.build(&response.cacaos)?;
        let session = SessionDraft {
            topic: session_topic.clone(),
            pairing_topic,
            self_participant: request.requester,
            peer_participant: response.responder.clone(),
            controller: response.responder.public_key,
            namespaces,
            transport_type,
        }
        .into_session(&context.config, effects.time.now_secs());

        effects.sessions.set_session(session.clone()).await?;

        let network = effects.network.clone();
        tokio::spawn(async move {
            tracing::debug!(topic = %session_topic, "Subscribing to session topic");
            if let Err(err) = network.subscribe(&session_topic).await {
                tracing::warn!(topic = %session_topic, error = %err, "Session topic subscription failed");
            }
        });

        Ok(session)
    }
}

/// Match `response` with its request in history
pub async fn correlate(
    history: &dyn RpcHistory,
    response: RpcResponse,
) -> Result<CorrelatedResponse> {
    let record = history
        .get(response.id)
        .await?
        .ok_or(AuthenticateError::RequestNotFound(response.id))?;
    let topic = record.topic;

    Ok(match response.outcome {
        RpcOutcome::Result(result) => CorrelatedResponse::Success(ResponseSubscriptionPayload {
            id: response.id,
            topic,
            request: record.request,
            response: result,
        }),
        RpcOutcome::Error(error) => CorrelatedResponse::Error(ResponseSubscriptionErrorPayload {
            id: response.id,
            topic,
            request: record.request,
            error,
        }),
    })
}
