//! Responder side of the handshake
//!
//! The responder answers a stored `wc_sessionAuthenticate` request with one
//! CACAO per account:
//!
//! 1. verify every CACAO against the original auth payload
//! 2. agree a response key with the requester and store it under the
//!    response topic (`sha256(requester public key)`)
//! 3. in link mode, require the requester's universal link
//! 4. agree a session key from a fresh key pair and store it under the
//!    session topic
//! 5. build namespaces and the session record
//! 6. dispatch the response, then persist the session
//!
//! Calls on one responder never interleave: each public operation holds the
//! turn guard for its whole duration. A request is answered at most once:
//! `respond` refuses a handshake that already reached a terminal state, and
//! `respond_error` refuses one whose peer already received a response. A
//! handshake that failed locally, with nothing dispatched, may still be
//! rejected so the peer learns the outcome.

use crate::context::HandshakeContext;
use crate::errors::{AuthenticateError, Result};
use crate::session::{agree_and_store, ensure_not_expired, request_params, SessionDraft};
use crate::state::HandshakeState;
use pairwire_core::auth::{AuthError, Cacao, SessionAuthenticateResponseParams};
use pairwire_core::effects::EnvelopeType;
use pairwire_core::keys::AgreementPublicKey;
use pairwire_core::rpc::{ProtocolMethod, RpcError, RpcResponse};
use pairwire_core::{
    AppMetadata, PairwireError, Participant, RequestId, Session, Topic, TransportType,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex as TurnGuard;

/// Where a response goes
struct ResponseChannel {
    topic: Topic,
    sender_public_key: AgreementPublicKey,
    peer_universal_link: Option<String>,
}

/// Answers session-authenticate requests
pub struct SessionAuthenticateResponder {
    context: HandshakeContext,
    metadata: AppMetadata,
    transport: TransportType,
    turn: TurnGuard<()>,
    states: Mutex<HashMap<RequestId, HandshakeState>>,
    answered: Mutex<HashSet<RequestId>>,
}

impl SessionAuthenticateResponder {
    /// Responder dispatching over `transport`, presenting `metadata`
    pub fn new(context: HandshakeContext, metadata: AppMetadata, transport: TransportType) -> Self {
        Self {
            context,
            metadata,
            transport,
            turn: TurnGuard::new(()),
            states: Mutex::new(HashMap::new()),
            answered: Mutex::new(HashSet::new()),
        }
    }

    /// Last recorded state of a handshake
    pub fn state(&self, id: RequestId) -> Option<HandshakeState> {
        self.states.lock().get(&id).cloned()
    }

    /// Whether a response or rejection for `id` reached the peer
    pub fn is_answered(&self, id: RequestId) -> bool {
        self.answered.lock().contains(&id)
    }

    /// Open a handshake for `id` unless it already finished
    ///
    /// A leftover non-terminal state belongs to an attempt that was dropped
    /// midway and is restarted from `Received`.
    fn begin(&self, id: RequestId) -> Result<()> {
        let mut states = self.states.lock();
        if let Some(current) = states.get(&id).filter(|state| state.is_terminal()) {
            return Err(AuthenticateError::InvalidTransition {
                from: current.clone(),
                to: HandshakeState::Verifying,
            });
        }
        states.insert(id, HandshakeState::Received);
        Ok(())
    }

    fn advance(&self, id: RequestId, next: HandshakeState) -> Result<()> {
        let mut states = self.states.lock();
        let current = states.remove(&id).unwrap_or(HandshakeState::Received);
        match current.clone().transition(next) {
            Ok(state) => {
                states.insert(id, state);
                Ok(())
            }
            Err(err) => {
                states.insert(id, current);
                Err(err)
            }
        }
    }

    fn fail(&self, id: RequestId, reason: String) {
        let mut states = self.states.lock();
        let failed = HandshakeState::Failed(reason);
        let can_fail = states
            .get(&id)
            .map_or(true, |state| state.can_transition_to(&failed));
        if can_fail {
            states.insert(id, failed);
        }
    }

    /// Answer request `id` with `cacaos`
    ///
    /// Returns the created session and, in link mode, the dispatched URL.
    pub async fn respond(
        &self,
        id: RequestId,
        cacaos: Vec<Cacao>,
    ) -> Result<(Session, Option<String>)> {
        let _turn = self.turn.lock().await;
        tracing::debug!(request_id = %id, cacaos = cacaos.len(), "Responding to session authenticate");

        self.begin(id)?;
        match self.respond_inner(id, cacaos).await {
            Ok(outcome) => {
                tracing::info!(request_id = %id, topic = %outcome.0.topic, "Session authenticated");
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(request_id = %id, error = %err, "Session authenticate response failed");
                self.fail(id, err.to_string());
                Err(err)
            }
        }
    }

    async fn respond_inner(
        &self,
        id: RequestId,
        cacaos: Vec<Cacao>,
    ) -> Result<(Session, Option<String>)> {
        let effects = &self.context.effects;
        let (params, pairing_topic) = request_params(effects.history.as_ref(), id).await?;
        let now = effects.time.now_secs();
        ensure_not_expired(&params, id, now)?;

        self.advance(id, HandshakeState::Verifying)?;
        self.context
            .verifier
            .verify_batch(&params.auth_payload, &cacaos)
            .await?;

        let channel = self.response_channel(&params.requester).await?;

        let self_public_key = effects.kms.create_x25519_key_pair().await?;
        let session_topic = agree_and_store(
            effects.kms.as_ref(),
            &self_public_key,
            &params.requester.public_key,
        )
        .await?;
        self.advance(id, HandshakeState::KeyAgreed)?;

        let namespaces = self.context.namespaces.build(&cacaos)?;
        let responder = Participant {
            public_key: self_public_key.to_hex(),
            metadata: self.metadata.clone(),
        };
        let session = SessionDraft {
            topic: session_topic.clone(),
            pairing_topic,
            self_participant: responder.clone(),
            peer_participant: params.requester.clone(),
            controller: responder.public_key.clone(),
            namespaces,
            transport_type: self.transport,
        }
        .into_session(&self.context.config, now);
        self.advance(id, HandshakeState::SessionBuilt)?;

        let response = RpcResponse::result(id, &SessionAuthenticateResponseParams { responder, cacaos })
            .map_err(PairwireError::from)?;
        let address = self.dispatch(&channel, response).await?;
        self.answered.lock().insert(id);

        effects.sessions.set_session(session.clone()).await?;
        if self.transport == TransportType::Relay {
            effects.network.subscribe(&session_topic).await?;
        }
        self.advance(id, HandshakeState::Dispatched)?;
        Ok((session, address))
    }

    /// Reject request `id` with `error`
    ///
    /// The error travels over the same channel a successful response would.
    pub async fn respond_error(&self, id: RequestId, error: AuthError) -> Result<Option<String>> {
        let _turn = self.turn.lock().await;
        let effects = &self.context.effects;
        let rejected = HandshakeState::Failed(format!("rejected: {error}"));
        if self.is_answered(id) {
            let from = self.state(id).unwrap_or(HandshakeState::Dispatched);
            return Err(AuthenticateError::InvalidTransition { from, to: rejected });
        }

        let (params, _) = request_params(effects.history.as_ref(), id).await?;
        let channel = self.response_channel(&params.requester).await?;
        let response = RpcResponse::error(
            id,
            RpcError {
                code: error.code(),
                message: error.message(),
            },
        );

        let address = self.dispatch(&channel, response).await?;
        self.answered.lock().insert(id);
        self.states.lock().insert(id, rejected);
        tracing::info!(request_id = %id, code = error.code(), "Session authenticate rejected");
        Ok(address)
    }

    async fn response_channel(&self, requester: &Participant) -> Result<ResponseChannel> {
        let kms = &self.context.effects.kms;
        let requester_key = AgreementPublicKey::from_hex(&requester.public_key)?;
        let topic = requester_key.response_topic();

        let sender_public_key = kms.create_x25519_key_pair().await?;
        let keys = kms
            .perform_key_agreement(&sender_public_key, &requester.public_key)
            .await?;
        kms.set_agreement_secret(keys, &topic).await?;

        let peer_universal_link = match self.transport {
            TransportType::LinkMode => Some(
                requester
                    .metadata
                    .universal_link()
                    .ok_or(AuthenticateError::MissingPeerAddress)?
                    .to_string(),
            ),
            TransportType::Relay => None,
        };

        Ok(ResponseChannel {
            topic,
            sender_public_key,
            peer_universal_link,
        })
    }

    async fn dispatch(&self, channel: &ResponseChannel, response: RpcResponse) -> Result<Option<String>> {
        let envelope = EnvelopeType::Type1 {
            sender_public_key: channel.sender_public_key,
        };
        let effects = &self.context.effects;
        match &channel.peer_universal_link {
            Some(link) => {
                let url = effects
                    .link
                    .respond(&channel.topic, response, link, envelope)
                    .await?;
                Ok(Some(url))
            }
            None => {
                effects
                    .network
                    .respond(
                        &channel.topic,
                        response,
                        ProtocolMethod::SessionAuthenticate,
                        envelope,
                    )
                    .await?;
                Ok(None)
            }
        }
    }
}
