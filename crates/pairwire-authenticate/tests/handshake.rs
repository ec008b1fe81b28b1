//! End-to-end handshake tests over the relay transport
//!
//! A dapp and a wallet each run against their own memory handlers. Relay
//! traffic is carried across by hand: the wallet's published response is
//! pushed into the dapp's response subscription.

mod common;

use common::*;
use pairwire_authenticate::{AuthenticateError, HandshakeState};
use pairwire_core::auth::{AuthError, SessionAuthenticateRequestParams};
use pairwire_core::effects::{KeyManagementEffects, RpcHistory};
use pairwire_core::keys::AgreementPublicKey;
use pairwire_core::rpc::{
    ProtocolMethod, ResponseSubscriptionErrorPayload, ResponseSubscriptionPayload, RpcError,
    RpcOutcome,
};
use pairwire_core::{RequestId, TransportType};
use std::time::Duration;

/// Dapp sends a request and the wallet stores it
async fn exchange_request(dapp: &Peer, wallet: &Peer) -> (RequestId, SessionAuthenticateRequestParams) {
    let (id, params) = dapp
        .requester(dapp_metadata(None))
        .request(auth_payload(), &pairing_topic())
        .await
        .unwrap();
    wallet.receive_request(id, &pairing_topic(), &params).await;
    (id, params)
}

/// Wallet's last published response as the dapp's subscription sees it
fn relayed_response(
    wallet: &Peer,
    id: RequestId,
    params: &SessionAuthenticateRequestParams,
) -> ResponseSubscriptionPayload {
    let published = wallet.network.responses().pop().unwrap();
    let RpcOutcome::Result(response) = published.response.outcome else {
        panic!("expected a result");
    };
    ResponseSubscriptionPayload {
        id,
        topic: pairing_topic(),
        request: serde_json::to_value(params).unwrap(),
        response,
    }
}

async fn wait_for(outcomes: &Outcomes, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while outcomes.len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_request_registers_response_topic() {
    let dapp = Peer::new();
    let (id, params) = dapp
        .requester(dapp_metadata(None))
        .request(auth_payload(), &pairing_topic())
        .await
        .unwrap();

    let requester_key = AgreementPublicKey::from_hex(&params.requester.public_key).unwrap();
    let response_topic = requester_key.response_topic();
    assert_eq!(dapp.network.subscriptions(), vec![response_topic.clone()]);

    let published = dapp.network.requests();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, pairing_topic());
    assert_eq!(published[0].id, id);
    assert_eq!(published[0].method, ProtocolMethod::SessionAuthenticate);

    assert_eq!(
        dapp.kms.get_public_key(&response_topic).await.unwrap(),
        Some(requester_key)
    );
    assert!(dapp.history.get(id).await.unwrap().is_some());
    assert_eq!(params.expiry_timestamp, Some(NOW_MILLIS / 1000 + 3600));
}

#[tokio::test]
async fn test_request_without_chains_is_rejected() {
    let dapp = Peer::new();
    let mut payload = auth_payload();
    payload.chains.clear();

    let result = dapp
        .requester(dapp_metadata(None))
        .request(payload, &pairing_topic())
        .await;
    assert!(matches!(result, Err(AuthenticateError::MalformedRequest(_))));
    assert_eq!(dapp.network.dispatch_count(), 0);
}

#[tokio::test]
async fn test_relay_round_trip_agrees_on_session() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let signer = signer();
    let cacaos = vec![
        cacao(&signer, &params.auth_payload, "eip155:1"),
        cacao(&signer, &params.auth_payload, "eip155:137"),
    ];
    let responder = wallet.responder(TransportType::Relay);
    let (wallet_session, url) = responder.respond(id, cacaos).await.unwrap();
    assert!(url.is_none());
    assert_eq!(responder.state(id), Some(HandshakeState::Dispatched));

    let requester_key = AgreementPublicKey::from_hex(&params.requester.public_key).unwrap();
    let published = wallet.network.responses();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, requester_key.response_topic());
    assert!(wallet.network.subscriptions().contains(&wallet_session.topic));

    let outcomes = Outcomes::default();
    let tasks = subscriber(&dapp, &outcomes).start();
    dapp.network.deliver_response(
        ProtocolMethod::SessionAuthenticate,
        relayed_response(&wallet, id, &params),
    );
    wait_for(&outcomes, 1).await;
    tasks.abort();

    let (callback_id, outcome) = outcomes.take().pop().unwrap();
    assert_eq!(callback_id, id);
    let dapp_session = outcome.unwrap();

    assert_eq!(dapp_session.topic, wallet_session.topic);
    assert_eq!(dapp_session.namespaces, wallet_session.namespaces);
    assert_eq!(dapp_session.controller, wallet_session.controller);
    assert_eq!(dapp_session.controller, wallet_session.self_participant.public_key);
    assert_eq!(dapp_session.pairing_topic, pairing_topic());
    assert_eq!(dapp_session.transport_type, TransportType::Relay);

    let eip155 = &dapp_session.namespaces["eip155"];
    assert_eq!(eip155.chains.len(), 2);
    assert_eq!(eip155.accounts.len(), 2);
    assert!(eip155.methods.contains("personal_sign"));
    assert!(eip155.methods.contains("eth_sendTransaction"));
    assert!(eip155.events.contains("accountsChanged"));

    assert_eq!(dapp.sessions.len().await, 1);
    assert_eq!(wallet.sessions.len().await, 1);
    assert!(dapp.pairing.is_active(&pairing_topic()).await);
}

#[tokio::test]
async fn test_substituted_domain_is_compromised_on_both_sides() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let mut evil = params.auth_payload.clone();
    evil.domain = "evil.com".to_string();
    let forged = vec![cacao(&signer(), &evil, "eip155:1")];

    let responder = wallet.responder(TransportType::Relay);
    let result = responder.respond(id, forged.clone()).await;
    assert!(matches!(result, Err(AuthenticateError::MessageMismatch { .. })));
    assert_eq!(result.unwrap_err().to_auth_error(), AuthError::MessageCompromised);
    assert!(matches!(responder.state(id), Some(HandshakeState::Failed(_))));
    assert_eq!(wallet.network.dispatch_count(), 0);
    assert!(wallet.sessions.is_empty().await);

    // A wallet that skipped its own checks still cannot fool the dapp
    let outcomes = Outcomes::default();
    let fired = subscriber(&dapp, &outcomes)
        .handle_response(ResponseSubscriptionPayload {
            id,
            topic: pairing_topic(),
            request: serde_json::to_value(&params).unwrap(),
            response: serde_json::json!({
                "responder": { "publicKey": "44".repeat(32), "metadata": wallet_metadata() },
                "cacaos": forged,
            }),
        })
        .await;
    assert!(fired);
    assert_eq!(outcomes.take(), vec![(id, Err(AuthError::MessageCompromised))]);
    assert!(dapp.sessions.is_empty().await);
}

#[tokio::test]
async fn test_forged_signature_fails_verification() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let mut forged = cacao(&signer(), &params.auth_payload, "eip155:1");
    forged.s = cacao(&signer(), &params.auth_payload, "eip155:1").s;

    let result = wallet
        .responder(TransportType::Relay)
        .respond(id, vec![forged])
        .await;
    assert_eq!(
        result.unwrap_err().to_auth_error(),
        AuthError::SignatureVerificationFailed
    );
    assert_eq!(wallet.network.dispatch_count(), 0);
}

#[tokio::test]
async fn test_one_bad_cacao_fails_the_whole_batch() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let good = cacao(&signer(), &params.auth_payload, "eip155:1");
    let mut bad = cacao(&signer(), &params.auth_payload, "eip155:137");
    bad.p.nonce = "replayed".to_string();

    let result = wallet
        .responder(TransportType::Relay)
        .respond(id, vec![good, bad])
        .await;
    assert!(matches!(result, Err(AuthenticateError::MessageMismatch { .. })));
    assert_eq!(wallet.network.dispatch_count(), 0);
    assert_eq!(wallet.kms.secret_count().await, 0);
    assert!(wallet.sessions.is_empty().await);
}

#[tokio::test]
async fn test_unknown_request_is_rejected() {
    let wallet = Peer::new();
    let result = wallet
        .responder(TransportType::Relay)
        .respond(RequestId(42), vec![cacao(&signer(), &auth_payload(), "eip155:1")])
        .await;
    assert_eq!(result.unwrap_err(), AuthenticateError::RequestNotFound(RequestId(42)));
}

#[tokio::test]
async fn test_expired_request_is_not_answered() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;
    wallet.time.advance(Duration::from_secs(3601));

    let result = wallet
        .responder(TransportType::Relay)
        .respond(id, vec![cacao(&signer(), &params.auth_payload, "eip155:1")])
        .await;
    assert_eq!(result.unwrap_err(), AuthenticateError::RequestExpired(id));
    assert_eq!(wallet.network.dispatch_count(), 0);
}

#[tokio::test]
async fn test_rejection_reaches_requester() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let responder = wallet.responder(TransportType::Relay);
    let url = responder.respond_error(id, AuthError::UserRejected).await.unwrap();
    assert!(url.is_none());
    assert!(matches!(responder.state(id), Some(HandshakeState::Failed(_))));

    let published = wallet.network.responses().pop().unwrap();
    let requester_key = AgreementPublicKey::from_hex(&params.requester.public_key).unwrap();
    assert_eq!(published.topic, requester_key.response_topic());
    let RpcOutcome::Error(error) = published.response.outcome else {
        panic!("expected an error");
    };
    assert_eq!(error.code, 12001);

    let outcomes = Outcomes::default();
    let tasks = subscriber(&dapp, &outcomes).start();
    dapp.network.deliver_error(
        ProtocolMethod::SessionAuthenticate,
        ResponseSubscriptionErrorPayload {
            id,
            topic: pairing_topic(),
            request: serde_json::to_value(&params).unwrap(),
            error,
        },
    );
    wait_for(&outcomes, 1).await;
    tasks.abort();

    assert_eq!(outcomes.take(), vec![(id, Err(AuthError::UserRejected))]);
    assert!(dapp.sessions.is_empty().await);
}

#[tokio::test]
async fn test_unmapped_error_code_is_dropped() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let outcomes = Outcomes::default();
    let subscriber = subscriber(&dapp, &outcomes);
    let error = |code| ResponseSubscriptionErrorPayload {
        id,
        topic: pairing_topic(),
        request: serde_json::to_value(&params).unwrap(),
        error: RpcError {
            code,
            message: "whatever".to_string(),
        },
    };

    assert!(!subscriber.handle_error(error(99_999)));
    // Local-only code is not accepted from a peer either
    assert!(!subscriber.handle_error(error(12100)));
    assert_eq!(outcomes.len(), 0);

    // The request was not claimed by the dropped events
    assert!(subscriber.handle_error(error(6000)));
    assert_eq!(outcomes.take(), vec![(id, Err(AuthError::UserDisconnected))]);
}

#[tokio::test]
async fn test_first_terminal_event_wins() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    wallet
        .responder(TransportType::Relay)
        .respond(id, vec![cacao(&signer(), &params.auth_payload, "eip155:1")])
        .await
        .unwrap();

    let outcomes = Outcomes::default();
    let subscriber = subscriber(&dapp, &outcomes);
    assert!(subscriber.handle_error(ResponseSubscriptionErrorPayload {
        id,
        topic: pairing_topic(),
        request: serde_json::to_value(&params).unwrap(),
        error: RpcError {
            code: 12001,
            message: "User rejected".to_string(),
        },
    }));
    assert!(!subscriber.handle_response(relayed_response(&wallet, id, &params)).await);

    assert_eq!(outcomes.take(), vec![(id, Err(AuthError::UserRejected))]);
    assert!(dapp.sessions.is_empty().await);
}

#[tokio::test]
async fn test_malformed_response_is_reported() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let outcomes = Outcomes::default();
    let fired = subscriber(&dapp, &outcomes)
        .handle_response(ResponseSubscriptionPayload {
            id,
            topic: pairing_topic(),
            request: serde_json::to_value(&params).unwrap(),
            response: serde_json::json!({ "cacaos": "nope" }),
        })
        .await;
    assert!(fired);
    assert_eq!(outcomes.take(), vec![(id, Err(AuthError::MalformedResponseParams))]);
    // The pairing is activated before the response is decoded
    assert!(dapp.pairing.is_active(&pairing_topic()).await);
}

#[tokio::test]
async fn test_concurrent_handshakes_use_disjoint_topics() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (first, first_params) = exchange_request(&dapp, &wallet).await;
    dapp.time.advance(Duration::from_millis(1));
    let (second, second_params) = exchange_request(&dapp, &wallet).await;
    assert_ne!(first, second);

    let responder = wallet.responder(TransportType::Relay);
    let signer = signer();
    let (a, b) = tokio::join!(
        responder.respond(first, vec![cacao(&signer, &first_params.auth_payload, "eip155:1")]),
        responder.respond(second, vec![cacao(&signer, &second_params.auth_payload, "eip155:1")]),
    );
    let (a, b) = (a.unwrap().0, b.unwrap().0);

    assert_ne!(a.topic, b.topic);
    assert_eq!(wallet.sessions.len().await, 2);
    assert_eq!(wallet.network.responses().len(), 2);
}

#[tokio::test]
async fn test_second_respond_is_refused() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let signer = signer();
    let responder = wallet.responder(TransportType::Relay);
    responder
        .respond(id, vec![cacao(&signer, &params.auth_payload, "eip155:1")])
        .await
        .unwrap();

    let again = responder
        .respond(id, vec![cacao(&signer, &params.auth_payload, "eip155:1")])
        .await;
    assert_eq!(
        again.unwrap_err(),
        AuthenticateError::InvalidTransition {
            from: HandshakeState::Dispatched,
            to: HandshakeState::Verifying,
        }
    );
    assert_eq!(wallet.network.responses().len(), 1);
    assert_eq!(wallet.sessions.len().await, 1);
    assert_eq!(responder.state(id), Some(HandshakeState::Dispatched));

    let rejected = responder.respond_error(id, AuthError::UserRejected).await;
    assert!(matches!(rejected, Err(AuthenticateError::InvalidTransition { .. })));
    assert_eq!(wallet.network.responses().len(), 1);
    assert_eq!(responder.state(id), Some(HandshakeState::Dispatched));
}

#[tokio::test]
async fn test_respond_after_rejection_is_refused() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let responder = wallet.responder(TransportType::Relay);
    responder.respond_error(id, AuthError::UserRejected).await.unwrap();

    let result = responder
        .respond(id, vec![cacao(&signer(), &params.auth_payload, "eip155:1")])
        .await;
    assert!(matches!(
        result,
        Err(AuthenticateError::InvalidTransition {
            from: HandshakeState::Failed(_),
            to: HandshakeState::Verifying,
        })
    ));
    assert!(matches!(
        responder.respond_error(id, AuthError::UserRejected).await,
        Err(AuthenticateError::InvalidTransition { .. })
    ));
    assert_eq!(wallet.network.responses().len(), 1);
    assert!(wallet.sessions.is_empty().await);
    assert!(matches!(responder.state(id), Some(HandshakeState::Failed(_))));
}

#[tokio::test]
async fn test_local_failure_can_still_be_rejected() {
    let dapp = Peer::new();
    let wallet = Peer::new();
    let (id, params) = exchange_request(&dapp, &wallet).await;

    let mut stale = cacao(&signer(), &params.auth_payload, "eip155:1");
    stale.p.nonce = "replayed".to_string();
    let responder = wallet.responder(TransportType::Relay);
    assert!(responder.respond(id, vec![stale]).await.is_err());
    assert!(matches!(responder.state(id), Some(HandshakeState::Failed(_))));
    assert!(!responder.is_answered(id));

    responder.respond_error(id, AuthError::UserRejected).await.unwrap();
    assert!(responder.is_answered(id));
    assert_eq!(wallet.network.responses().len(), 1);
}

#[tokio::test]
async fn test_claims_are_pruned_after_request_lifetime() {
    let dapp = Peer::new();
    let outcomes = Outcomes::default();
    let subscriber = subscriber(&dapp, &outcomes);
    let rejection = |id| ResponseSubscriptionErrorPayload {
        id,
        topic: pairing_topic(),
        request: serde_json::json!({}),
        error: RpcError {
            code: 12001,
            message: "User rejected".to_string(),
        },
    };

    assert!(subscriber.handle_error(rejection(RequestId(1))));
    assert!(!subscriber.handle_error(rejection(RequestId(1))));
    assert_eq!(subscriber.claimed_count(), 1);

    dapp.time.advance(Duration::from_secs(3601));
    assert!(subscriber.handle_error(rejection(RequestId(2))));
    assert_eq!(subscriber.claimed_count(), 1);
    assert_eq!(outcomes.len(), 2);
}
