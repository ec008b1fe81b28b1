//! Link-mode envelope delivery
//!
//! A response is serialised, sealed into an envelope under the secret stored
//! for its topic and handed to the peer as a deep link:
//!
//! ```text
//! {universal link}?wc_ev={base64url(envelope)}&topic={topic}
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pairwire_core::effects::{EnvelopeType, KeyManagementEffects, LinkEnvelopeEffects};
use pairwire_core::rpc::RpcResponse;
use pairwire_core::{PairwireError, Result, Topic};
use pairwire_crypto::Envelope;
use parking_lot::Mutex;
use std::sync::Arc;

const ENVELOPE_PARAM: &str = "wc_ev";
const TOPIC_PARAM: &str = "topic";

/// Opens deep links on the host platform
#[async_trait]
pub trait DeepLinkOpener: Send + Sync {
    /// Open `url`
    async fn open(&self, url: &str) -> Result<()>;
}

/// Opener that only remembers what it was asked to open
#[derive(Debug, Clone, Default)]
pub struct RecordingDeepLinkOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingDeepLinkOpener {
    /// Create an opener with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened so far
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    /// Number of links opened
    pub fn dispatch_count(&self) -> usize {
        self.opened.lock().len()
    }
}

#[async_trait]
impl DeepLinkOpener for RecordingDeepLinkOpener {
    async fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// Seals responses and dispatches them through a [`DeepLinkOpener`]
#[derive(Clone)]
pub struct LinkEnvelopesDispatcher {
    kms: Arc<dyn KeyManagementEffects>,
    opener: Arc<dyn DeepLinkOpener>,
}

impl LinkEnvelopesDispatcher {
    /// Create a dispatcher over a key store and opener
    pub fn new(kms: Arc<dyn KeyManagementEffects>, opener: Arc<dyn DeepLinkOpener>) -> Self {
        Self { kms, opener }
    }
}

#[async_trait]
impl LinkEnvelopeEffects for LinkEnvelopesDispatcher {
    async fn respond(
        &self,
        topic: &Topic,
        response: RpcResponse,
        peer_universal_link: &str,
        envelope: EnvelopeType,
    ) -> Result<String> {
        let keys = self
            .kms
            .get_agreement_secret(topic)
            .await?
            .ok_or_else(|| PairwireError::MissingSecret(topic.clone()))?;

        let plaintext = serde_json::to_vec(&response)?;
        let sealed = Envelope::seal(
            &mut rand::thread_rng(),
            &keys.shared_key,
            &plaintext,
            envelope,
        )?;
        let url = link_url(peer_universal_link, &sealed, topic);

        self.opener.open(&url).await?;
        tracing::debug!(topic = %topic, id = %response.id, "Dispatched link envelope");
        Ok(url)
    }
}

/// Build the deep link carrying `envelope` for `topic`
pub fn link_url(universal_link: &str, envelope: &Envelope, topic: &Topic) -> String {
    let separator = if universal_link.contains('?') { '&' } else { '?' };
    format!(
        "{universal_link}{separator}{ENVELOPE_PARAM}={}&{TOPIC_PARAM}={topic}",
        URL_SAFE_NO_PAD.encode(envelope.to_bytes())
    )
}

/// Split a deep link back into its envelope and topic
pub fn parse_link_url(url: &str) -> Result<(Envelope, Topic)> {
    let (_, query) = url
        .split_once('?')
        .ok_or_else(|| PairwireError::malformed("Link has no query string"))?;

    let mut encoded = None;
    let mut topic = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some((ENVELOPE_PARAM, value)) => encoded = Some(value),
            Some((TOPIC_PARAM, value)) => topic = Some(value),
            _ => {}
        }
    }

    let encoded = encoded.ok_or_else(|| PairwireError::malformed("Link has no envelope"))?;
    let topic: Topic = topic
        .ok_or_else(|| PairwireError::malformed("Link has no topic"))?
        .parse()?;
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| PairwireError::malformed(format!("Envelope is not base64url: {e}")))?;
    Ok((Envelope::from_bytes(&bytes)?, topic))
}

/// Decode a received link into the response it carries
///
/// Type 1 envelopes are opened by agreeing our public key registered for the
/// topic with the sender key in the envelope; type 0 envelopes use the secret
/// already stored for the topic.
pub async fn open_envelope(
    kms: &dyn KeyManagementEffects,
    url: &str,
) -> Result<(Topic, RpcResponse)> {
    let (envelope, topic) = parse_link_url(url)?;

    let keys = match envelope.envelope_type {
        EnvelopeType::Type1 { sender_public_key } => {
            let self_public_key = kms
                .get_public_key(&topic)
                .await?
                .ok_or_else(|| PairwireError::MissingPublicKey(topic.clone()))?;
            kms.perform_key_agreement(&self_public_key, &sender_public_key.to_hex())
                .await?
        }
        EnvelopeType::Type0 => kms
            .get_agreement_secret(&topic)
            .await?
            .ok_or_else(|| PairwireError::MissingSecret(topic.clone()))?,
    };

    let plaintext = envelope.open(&keys.shared_key)?;
    let response = serde_json::from_slice(&plaintext)?;
    Ok((topic, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryKeyManagementHandler;
    use pairwire_core::RequestId;

    #[tokio::test]
    async fn test_type1_link_round_trip() {
        let requester = MemoryKeyManagementHandler::new();
        let responder = MemoryKeyManagementHandler::new();

        let requester_key = requester.create_x25519_key_pair().await.unwrap();
        let response_topic = requester_key.response_topic();
        requester
            .set_public_key(requester_key, &response_topic)
            .await
            .unwrap();

        let responder_key = responder.create_x25519_key_pair().await.unwrap();
        let keys = responder
            .perform_key_agreement(&responder_key, &requester_key.to_hex())
            .await
            .unwrap();
        responder
            .set_agreement_secret(keys, &response_topic)
            .await
            .unwrap();

        let opener = Arc::new(RecordingDeepLinkOpener::new());
        let dispatcher = LinkEnvelopesDispatcher::new(Arc::new(responder), opener.clone());
        let response = RpcResponse::result(RequestId(42), &serde_json::json!({"ok": true})).unwrap();
        let url = dispatcher
            .respond(
                &response_topic,
                response.clone(),
                "https://app.example/wc",
                EnvelopeType::Type1 {
                    sender_public_key: responder_key,
                },
            )
            .await
            .unwrap();

        assert!(url.starts_with("https://app.example/wc?wc_ev="));
        assert_eq!(opener.opened(), vec![url.clone()]);

        let (topic, opened) = open_envelope(&requester, &url).await.unwrap();
        assert_eq!(topic, response_topic);
        assert_eq!(opened, response);
    }

    #[tokio::test]
    async fn test_missing_secret_does_not_dispatch() {
        let opener = Arc::new(RecordingDeepLinkOpener::new());
        let dispatcher =
            LinkEnvelopesDispatcher::new(Arc::new(MemoryKeyManagementHandler::new()), opener.clone());
        let response = RpcResponse::result(RequestId(1), &serde_json::json!(null)).unwrap();

        let result = dispatcher
            .respond(
                &Topic::from_sha256(b"unknown"),
                response,
                "https://app.example",
                EnvelopeType::Type0,
            )
            .await;
        assert_eq!(
            result,
            Err(PairwireError::MissingSecret(Topic::from_sha256(b"unknown")))
        );
        assert_eq!(opener.dispatch_count(), 0);
    }

    #[test]
    fn test_parse_rejects_incomplete_links() {
        assert!(parse_link_url("https://app.example").is_err());
        assert!(parse_link_url("https://app.example?topic=abc").is_err());
        assert!(parse_link_url("https://app.example?wc_ev=AAAA").is_err());
    }
}
