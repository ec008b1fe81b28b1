//! Steps shared by the responder and the requester

use crate::errors::{AuthenticateError, Result};
use chrono::DateTime;
use pairwire_core::auth::SessionAuthenticateRequestParams;
use pairwire_core::config::AuthenticateConfig;
use pairwire_core::effects::{KeyManagementEffects, RpcHistory};
use pairwire_core::keys::AgreementPublicKey;
use pairwire_core::{
    NamespaceSet, Participant, RequestId, Session, Topic, TransportType,
};

/// Original request parameters and the pairing topic they arrived on
pub(crate) async fn request_params(
    history: &dyn RpcHistory,
    id: RequestId,
) -> Result<(SessionAuthenticateRequestParams, Topic)> {
    let record = history
        .get(id)
        .await?
        .ok_or(AuthenticateError::RequestNotFound(id))?;
    let params = serde_json::from_value(record.request)
        .map_err(|e| AuthenticateError::MalformedRequest(e.to_string()))?;
    Ok((params, record.topic))
}

/// Reject a request past its expiry timestamp or its payload `exp`
pub(crate) fn ensure_not_expired(
    params: &SessionAuthenticateRequestParams,
    id: RequestId,
    now_secs: u64,
) -> Result<()> {
    if params.is_expired(now_secs) {
        return Err(AuthenticateError::RequestExpired(id));
    }
    if let Some(exp) = &params.auth_payload.exp {
        let exp = DateTime::parse_from_rfc3339(exp)
            .map_err(|e| AuthenticateError::MalformedRequest(format!("exp: {e}")))?;
        if exp.timestamp() <= now_secs as i64 {
            return Err(AuthenticateError::RequestExpired(id));
        }
    }
    Ok(())
}

/// Agree a fresh key with `peer_public_key` and store the secret under the
/// derived topic, returning that topic
pub(crate) async fn agree_and_store(
    kms: &dyn KeyManagementEffects,
    self_public_key: &AgreementPublicKey,
    peer_public_key: &str,
) -> Result<Topic> {
    let keys = kms
        .perform_key_agreement(self_public_key, peer_public_key)
        .await?;
    let topic = keys.derived_topic();
    kms.set_agreement_secret(keys, &topic).await?;
    Ok(topic)
}

/// Everything a session record needs besides configuration and time
pub(crate) struct SessionDraft {
    pub topic: Topic,
    pub pairing_topic: Topic,
    pub self_participant: Participant,
    pub peer_participant: Participant,
    pub controller: String,
    pub namespaces: NamespaceSet,
    pub transport_type: TransportType,
}

impl SessionDraft {
    /// Acknowledged session expiring after the configured lifetime
    pub(crate) fn into_session(self, config: &AuthenticateConfig, now_secs: u64) -> Session {
        Session {
            topic: self.topic,
            pairing_topic: self.pairing_topic,
            created_at: now_secs,
            self_participant: self.self_participant,
            peer_participant: self.peer_participant,
            controller: self.controller,
            namespaces: self.namespaces,
            required_namespaces: NamespaceSet::new(),
            expiry: now_secs.saturating_add(config.session_ttl_secs),
            acknowledged: true,
            transport_type: self.transport_type,
            relay_protocol: config.relay_protocol.clone(),
        }
    }
}
