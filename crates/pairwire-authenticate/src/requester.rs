//! Sending session-authenticate requests

use crate::context::HandshakeContext;
use crate::errors::{AuthenticateError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use pairwire_core::auth::{AuthPayload, SessionAuthenticateRequestParams};
use pairwire_core::rpc::{ProtocolMethod, RpcRecord};
use pairwire_core::{AppMetadata, PairwireError, Participant, RequestId, Topic};

/// Publishes `wc_sessionAuthenticate` requests over a pairing
pub struct SessionAuthenticateRequester {
    context: HandshakeContext,
    metadata: AppMetadata,
}

impl SessionAuthenticateRequester {
    /// Requester presenting `metadata`
    pub fn new(context: HandshakeContext, metadata: AppMetadata) -> Self {
        Self { context, metadata }
    }

    /// Send `auth_payload` on `pairing_topic`
    ///
    /// A fresh key pair is created for the request and its response topic is
    /// subscribed before publishing, so the answer cannot be missed. An empty
    /// `iat` is filled with the current time.
    pub async fn request(
        &self,
        mut auth_payload: AuthPayload,
        pairing_topic: &Topic,
    ) -> Result<(RequestId, SessionAuthenticateRequestParams)> {
        if auth_payload.chains.is_empty() {
            return Err(AuthenticateError::MalformedRequest(
                "auth payload names no chains".to_string(),
            ));
        }

        let effects = &self.context.effects;
        let now_millis = effects.time.now_millis();
        if auth_payload.iat.is_empty() {
            auth_payload.iat = rfc3339(now_millis)?;
        }

        let public_key = effects.kms.create_x25519_key_pair().await?;
        let response_topic = public_key.response_topic();
        effects.kms.set_public_key(public_key, &response_topic).await?;
        effects.network.subscribe(&response_topic).await?;

        let method = ProtocolMethod::SessionAuthenticate;
        let params = SessionAuthenticateRequestParams {
            requester: Participant {
                public_key: public_key.to_hex(),
                metadata: self.metadata.clone(),
            },
            auth_payload,
            expiry_timestamp: Some(now_millis / 1000 + self.context.config.request_ttl_secs),
        };
        let id = RequestId::generate(now_millis, rand::random());
        let request = serde_json::to_value(&params).map_err(PairwireError::from)?;

        effects
            .history
            .set(RpcRecord {
                id,
                topic: pairing_topic.clone(),
                method,
                request: request.clone(),
            })
            .await?;
        effects
            .network
            .request(pairing_topic, id, method, request)
            .await?;

        tracing::info!(request_id = %id, topic = %pairing_topic, response_topic = %response_topic, "Session authenticate requested");
        Ok((id, params))
    }
}

fn rfc3339(now_millis: u64) -> Result<String> {
    let millis = i64::try_from(now_millis)
        .map_err(|_| AuthenticateError::MalformedRequest("clock out of range".to_string()))?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| AuthenticateError::MalformedRequest("clock out of range".to_string()))
}
