//! Shared fixtures: two peers wired to memory handlers

#![allow(dead_code)]

use pairwire_authenticate::{
    sign_cacao, AuthResponseCallback, AuthResponseSubscriber, AuthenticateEffects,
    HandshakeContext, SessionAuthenticateRequester, SessionAuthenticateResponder,
    SiweMessageFormatter,
};
use pairwire_core::auth::{
    AuthError, AuthPayload, Cacao, CacaoFormat, RecapUrn, SessionAuthenticateRequestParams,
};
use pairwire_core::config::AuthenticateConfig;
use pairwire_core::effects::RpcHistory;
use pairwire_core::rpc::{ProtocolMethod, RpcRecord};
use pairwire_core::{Account, AppMetadata, Redirect, RequestId, Session, Topic, TransportType};
use pairwire_crypto::Eip191Signer;
use pairwire_effects::{
    FixedTimeHandler, LinkEnvelopesDispatcher, MemoryKeyManagementHandler, MemoryNetworkHandler,
    MemoryPairingRegistry, MemoryRpcHistory, MemorySessionStore, RecordingDeepLinkOpener,
};
use std::sync::{Arc, Mutex};

/// 2024-01-01T00:00:00Z
pub const NOW_MILLIS: u64 = 1_704_067_200_000;

pub const REQUESTER_LINK: &str = "https://dapp.example.com/wc";

/// One side of the handshake and the handlers behind it
pub struct Peer {
    pub kms: MemoryKeyManagementHandler,
    pub network: MemoryNetworkHandler,
    pub opener: RecordingDeepLinkOpener,
    pub sessions: MemorySessionStore,
    pub history: MemoryRpcHistory,
    pub pairing: MemoryPairingRegistry,
    pub time: FixedTimeHandler,
    pub context: HandshakeContext,
}

impl Peer {
    pub fn new() -> Self {
        Self::with_config(AuthenticateConfig::default())
    }

    pub fn with_config(config: AuthenticateConfig) -> Self {
        pairwire_effects::logging::init_tracing("warn");

        let kms = MemoryKeyManagementHandler::new();
        let network = MemoryNetworkHandler::new();
        let opener = RecordingDeepLinkOpener::new();
        let sessions = MemorySessionStore::new();
        let history = MemoryRpcHistory::new();
        let pairing = MemoryPairingRegistry::new();
        let time = FixedTimeHandler::new(NOW_MILLIS);

        let effects = AuthenticateEffects {
            kms: Arc::new(kms.clone()),
            network: Arc::new(network.clone()),
            link: Arc::new(LinkEnvelopesDispatcher::new(
                Arc::new(kms.clone()),
                Arc::new(opener.clone()),
            )),
            sessions: Arc::new(sessions.clone()),
            history: Arc::new(history.clone()),
            pairing: Arc::new(pairing.clone()),
            time: Arc::new(time.clone()),
        };

        Self {
            kms,
            network,
            opener,
            sessions,
            history,
            pairing,
            time,
            context: HandshakeContext::new(effects, config),
        }
    }

    pub fn responder(&self, transport: TransportType) -> SessionAuthenticateResponder {
        SessionAuthenticateResponder::new(self.context.clone(), wallet_metadata(), transport)
    }

    pub fn requester(&self, metadata: AppMetadata) -> SessionAuthenticateRequester {
        SessionAuthenticateRequester::new(self.context.clone(), metadata)
    }

    /// Store a request received over the pairing so the responder can answer it
    pub async fn receive_request(
        &self,
        id: RequestId,
        topic: &Topic,
        params: &SessionAuthenticateRequestParams,
    ) {
        self.history
            .set(RpcRecord {
                id,
                topic: topic.clone(),
                method: ProtocolMethod::SessionAuthenticate,
                request: serde_json::to_value(params).unwrap(),
            })
            .await
            .unwrap();
    }
}

/// Every callback invocation, in order
#[derive(Clone, Default)]
pub struct Outcomes(Arc<Mutex<Vec<(RequestId, Result<Session, AuthError>)>>>);

impl Outcomes {
    pub fn callback(&self) -> AuthResponseCallback {
        let outcomes = self.0.clone();
        Arc::new(move |id, outcome| outcomes.lock().unwrap().push((id, outcome)))
    }

    pub fn take(&self) -> Vec<(RequestId, Result<Session, AuthError>)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

pub fn subscriber(peer: &Peer, outcomes: &Outcomes) -> AuthResponseSubscriber {
    AuthResponseSubscriber::new(peer.context.clone(), outcomes.callback())
}

pub fn pairing_topic() -> Topic {
    Topic::from_sha256(b"pairing")
}

pub fn dapp_metadata(universal_link: Option<&str>) -> AppMetadata {
    AppMetadata {
        name: "Example Dapp".to_string(),
        description: "Signs users in".to_string(),
        url: "https://dapp.example.com".to_string(),
        icons: vec![],
        redirect: universal_link.map(|link| Redirect {
            native: None,
            universal: Some(link.to_string()),
            link_mode: true,
        }),
    }
}

pub fn wallet_metadata() -> AppMetadata {
    AppMetadata {
        name: "Example Wallet".to_string(),
        description: "Holds keys".to_string(),
        url: "https://wallet.example.com".to_string(),
        icons: vec![],
        redirect: None,
    }
}

pub fn auth_payload() -> AuthPayload {
    let recap = RecapUrn::for_methods("eip155", ["personal_sign", "eth_sendTransaction"]).unwrap();
    AuthPayload {
        format: CacaoFormat::Caip122,
        chains: vec!["eip155:1".parse().unwrap(), "eip155:137".parse().unwrap()],
        domain: "dapp.example.com".to_string(),
        aud: "https://dapp.example.com/login".to_string(),
        version: "1".to_string(),
        nonce: "32891756".to_string(),
        iat: "2024-01-01T00:00:00Z".to_string(),
        nbf: None,
        exp: None,
        statement: Some("Sign in to Example Dapp".to_string()),
        request_id: None,
        resources: Some(vec![recap.as_str().to_string()]),
    }
}

pub fn account(signer: &Eip191Signer, chain: &str) -> Account {
    format!("{chain}:{}", signer.address()).parse().unwrap()
}

pub fn cacao(signer: &Eip191Signer, payload: &AuthPayload, chain: &str) -> Cacao {
    sign_cacao(
        &SiweMessageFormatter,
        signer,
        payload,
        &account(signer, chain),
        true,
    )
    .unwrap()
}

pub fn signer() -> Eip191Signer {
    Eip191Signer::random(&mut rand::thread_rng())
}
