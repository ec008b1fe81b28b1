//! `wc_sessionAuthenticate` request and response parameters

use crate::auth::cacao::Cacao;
use crate::auth::payload::AuthPayload;
use crate::participant::Participant;
use serde::{Deserialize, Serialize};

/// Parameters the requester publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAuthenticateRequestParams {
    /// Requesting participant
    pub requester: Participant,
    /// What every account must sign
    pub auth_payload: AuthPayload,
    /// Unix seconds after which the request is void
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_timestamp: Option<u64>,
}

impl SessionAuthenticateRequestParams {
    /// Whether the request expired at `now` (unix seconds)
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry_timestamp.is_some_and(|expiry| expiry <= now)
    }
}

/// Parameters the responder answers with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAuthenticateResponseParams {
    /// Responding participant, carrying its fresh session public key
    pub responder: Participant,
    /// One capability object per claimed account
    pub cacaos: Vec<Cacao>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cacao::CacaoFormat;
    use crate::participant::AppMetadata;

    #[test]
    fn test_request_expiry() {
        let params = SessionAuthenticateRequestParams {
            requester: Participant {
                public_key: "11".repeat(32),
                metadata: AppMetadata::default(),
            },
            auth_payload: AuthPayload {
                format: CacaoFormat::Eip4361,
                chains: vec!["eip155:1".parse().unwrap()],
                domain: "example.com".to_string(),
                aud: "https://example.com".to_string(),
                version: "1".to_string(),
                nonce: "n".to_string(),
                iat: "2024-01-01T00:00:00Z".to_string(),
                nbf: None,
                exp: None,
                statement: None,
                request_id: None,
                resources: None,
            },
            expiry_timestamp: Some(100),
        };
        assert!(!params.is_expired(99));
        assert!(params.is_expired(100));

        let unbounded = SessionAuthenticateRequestParams {
            expiry_timestamp: None,
            ..params
        };
        assert!(!unbounded.is_expired(u64::MAX));
    }
}
