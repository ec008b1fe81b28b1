//! Requester-side authentication context

use crate::auth::cacao::{CacaoFormat, CacaoPayload};
use crate::identifiers::{Account, Blockchain, DidPkh};
use serde::{Deserialize, Serialize};

/// What the requester asks every account to sign
///
/// The responder never trusts a CACAO payload on its own: it rebuilds the
/// payload from this structure with [`AuthPayload::cacao_payload`] and checks
/// that the two agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    /// Message format
    #[serde(rename = "type")]
    pub format: CacaoFormat,
    /// Chains the requester accepts accounts from
    pub chains: Vec<Blockchain>,
    /// Requesting domain
    pub domain: String,
    /// Audience URI
    pub aud: String,
    /// Message version
    pub version: String,
    /// Replay-protection nonce
    pub nonce: String,
    /// Issued-at timestamp (RFC 3339)
    pub iat: String,
    /// Not-before timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<String>,
    /// Expiration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<String>,
    /// Human readable statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// Requester-side request identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Resources, including the ReCap grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl AuthPayload {
    /// Payload the given account is expected to have signed
    pub fn cacao_payload(&self, account: &Account) -> CacaoPayload {
        CacaoPayload {
            iss: DidPkh::from_account(account.clone()).to_string(),
            domain: self.domain.clone(),
            aud: self.aud.clone(),
            version: self.version.clone(),
            nonce: self.nonce.clone(),
            iat: self.iat.clone(),
            nbf: self.nbf.clone(),
            exp: self.exp.clone(),
            statement: self.statement.clone(),
            request_id: self.request_id.clone(),
            resources: self.resources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wire_payload() {
        let json = r#"{
            "type": "caip122",
            "chains": ["eip155:1", "eip155:137"],
            "statement": "Please sign with your account",
            "aud": "https://example.com",
            "domain": "example.com",
            "version": "1",
            "nonce": "cfab4ebf",
            "iat": "2025-04-01T12:31:24.985Z"
        }"#;
        let payload: AuthPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.format, CacaoFormat::Caip122);
        assert_eq!(payload.chains.len(), 2);
        assert_eq!(payload.resources, None);

        let account: Account = "eip155:137:0xabc".parse().unwrap();
        let cacao = payload.cacao_payload(&account);
        assert_eq!(cacao.iss, "did:pkh:eip155:137:0xabc");
        assert_eq!(cacao.domain, payload.domain);
        assert_eq!(cacao.statement, payload.statement);
    }
}
