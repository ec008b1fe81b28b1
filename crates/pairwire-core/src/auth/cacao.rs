//! Chain-agnostic capability objects (CACAO)

use crate::auth::recap::{last_recap, RecapUrn};
use crate::errors::PairwireError;
use crate::identifiers::{Account, DidPkh};
use serde::{Deserialize, Serialize};

/// Message format tag carried in the CACAO header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacaoFormat {
    /// Sign-In with Ethereum
    Eip4361,
    /// Chain-agnostic sign-in
    Caip122,
}

/// CACAO header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacaoHeader {
    /// Message format
    pub t: CacaoFormat,
}

/// The signed body of a CACAO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacaoPayload {
    /// Issuer as `did:pkh:<account>`
    pub iss: String,
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
    /// Resources, the last `urn:recap:` entry being the capability grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl CacaoPayload {
    /// Account claimed by the issuer field
    pub fn issuer_account(&self) -> Result<Account, PairwireError> {
        Ok(DidPkh::parse(&self.iss)?.into_account())
    }

    /// Capability grant carried by the payload, if any
    pub fn recap(&self) -> Result<Option<RecapUrn>, PairwireError> {
        last_recap(self.resources.as_deref())
            .map(RecapUrn::parse)
            .transpose()
    }
}

/// Signature scheme used over the formatted message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacaoSignatureType {
    /// `personal_sign` over secp256k1
    Eip191,
    /// Contract wallet signature checked on chain
    Eip1271,
}

/// Signature block of a CACAO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacaoSignature {
    /// Signature scheme
    pub t: CacaoSignatureType,
    /// Hex-encoded signature (`0x`-prefixed)
    pub s: String,
    /// Optional scheme metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<String>,
}

/// A signed capability object, one per claimed account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cacao {
    /// Header
    pub h: CacaoHeader,
    /// Signed payload
    pub p: CacaoPayload,
    /// Signature
    pub s: CacaoSignature,
}
