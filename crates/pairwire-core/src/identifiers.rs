//! Topic, request and chain-agnostic account identifiers
//!
//! Accounts follow CAIP-10 (`namespace:reference:address`), chains follow
//! CAIP-2 (`namespace:reference`) and issuers follow DID:PKH
//! (`did:pkh:<account>`). All parsing is fallible and never panics.

use crate::errors::PairwireError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a topic in bytes (hex-encoded on the wire)
pub const TOPIC_LENGTH: usize = 32;

/// Identifier naming an encrypted channel, 32 bytes rendered as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Build a topic from raw bytes
    pub fn from_bytes(bytes: [u8; TOPIC_LENGTH]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Topic obtained by hashing arbitrary bytes with SHA-256
    pub fn from_sha256(data: &[u8]) -> Self {
        Self::from_bytes(Sha256::digest(data).into())
    }

    /// Hex form of the topic
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = PairwireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&value)
            .map_err(|e| PairwireError::malformed(format!("Topic is not hex: {e}")))?;
        if bytes.len() != TOPIC_LENGTH {
            return Err(PairwireError::malformed(format!(
                "Topic must be {TOPIC_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(value.to_lowercase()))
    }
}

impl FromStr for Topic {
    type Err = PairwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON-RPC request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Build a request id from a millisecond timestamp and an entropy suffix,
    /// the way JSON-RPC payload ids are generated on the wire.
    pub fn generate(now_millis: u64, entropy: u16) -> Self {
        Self(now_millis * 1000 + u64::from(entropy % 1000))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_segment(segment: &str, max_len: usize) -> bool {
    !segment.is_empty()
        && segment.len() <= max_len
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '%')
}

/// CAIP-2 chain identifier (`eip155:1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Blockchain {
    namespace: String,
    reference: String,
}

impl Blockchain {
    /// Create a chain from its namespace and reference
    pub fn new(namespace: &str, reference: &str) -> Result<Self, PairwireError> {
        if !is_valid_segment(namespace, 8) || !is_valid_segment(reference, 32) {
            return Err(PairwireError::malformed(format!(
                "Invalid chain identifier: {namespace}:{reference}"
            )));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            reference: reference.to_string(),
        })
    }

    /// Chain namespace (`eip155`)
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Chain reference (`1`)
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl FromStr for Blockchain {
    type Err = PairwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !reference.contains(':') => {
                Self::new(namespace, reference)
            }
            _ => Err(PairwireError::malformed(format!("Invalid chain identifier: {s}"))),
        }
    }
}

impl TryFrom<String> for Blockchain {
    type Error = PairwireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Blockchain> for String {
    fn from(chain: Blockchain) -> Self {
        chain.to_string()
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

/// CAIP-10 account identifier (`eip155:1:0xabc...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account {
    blockchain: Blockchain,
    address: String,
}

impl Account {
    /// Create an account on the given chain
    pub fn new(blockchain: Blockchain, address: &str) -> Result<Self, PairwireError> {
        if !is_valid_segment(address, 128) {
            return Err(PairwireError::malformed(format!(
                "Invalid account address: {address}"
            )));
        }
        Ok(Self {
            blockchain,
            address: address.to_string(),
        })
    }

    /// Chain the account lives on
    pub fn blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Chain namespace (`eip155`)
    pub fn namespace(&self) -> &str {
        self.blockchain.namespace()
    }

    /// Chain reference (`1`)
    pub fn reference(&self) -> &str {
        self.blockchain.reference()
    }

    /// Account address as it appears on chain
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl FromStr for Account {
    type Err = PairwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(reference), Some(address)) if !address.contains(':') => {
                Self::new(Blockchain::new(namespace, reference)?, address)
            }
            _ => Err(PairwireError::malformed(format!("Invalid account identifier: {s}"))),
        }
    }
}

impl TryFrom<String> for Account {
    type Error = PairwireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.to_string()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.blockchain, self.address)
    }
}

/// DID:PKH issuer wrapping a CAIP-10 account
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidPkh {
    account: Account,
}

impl DidPkh {
    const PREFIX: &'static str = "did:pkh:";

    /// Parse a `did:pkh:` string
    pub fn parse(did: &str) -> Result<Self, PairwireError> {
        let account = did
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| PairwireError::malformed(format!("Not a did:pkh identifier: {did}")))?;
        Ok(Self {
            account: account.parse()?,
        })
    }

    /// Wrap an account as an issuer
    pub fn from_account(account: Account) -> Self {
        Self { account }
    }

    /// Account embedded in the identifier
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Consume into the embedded account
    pub fn into_account(self) -> Account {
        self.account
    }
}

impl fmt::Display for DidPkh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_parse_display() {
        let account: Account = "eip155:1:0xAbC0000000000000000000000000000000000001"
            .parse()
            .unwrap();
        assert_eq!(account.namespace(), "eip155");
        assert_eq!(account.reference(), "1");
        assert_eq!(account.address(), "0xAbC0000000000000000000000000000000000001");
        assert_eq!(
            account.to_string(),
            "eip155:1:0xAbC0000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_malformed_identifiers() {
        assert!("eip155".parse::<Blockchain>().is_err());
        assert!("eip155:1:extra".parse::<Blockchain>().is_err());
        assert!("eip155:1".parse::<Account>().is_err());
        assert!("eip155::0xabc".parse::<Account>().is_err());
        assert!(DidPkh::parse("did:key:eip155:1:0xabc").is_err());
        assert!(DidPkh::parse("did:pkh:eip155:1").is_err());
    }

    #[test]
    fn test_did_pkh_roundtrip() {
        let did = DidPkh::parse("did:pkh:eip155:10:0xabc").unwrap();
        assert_eq!(did.account().blockchain().to_string(), "eip155:10");
        assert_eq!(did.to_string(), "did:pkh:eip155:10:0xabc");
    }

    #[test]
    fn test_topic_validation() {
        let topic = Topic::from_sha256(b"pairwire");
        assert_eq!(topic.as_str().len(), 64);
        assert!(topic.as_str().parse::<Topic>().is_ok());
        assert!("abcd".parse::<Topic>().is_err());
        assert!("zz".repeat(32).parse::<Topic>().is_err());

        let json = serde_json::to_string(&topic).unwrap();
        let back: Topic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, topic);
    }

    #[test]
    fn test_request_id_generation() {
        let id = RequestId::generate(1_700_000_000_000, 42);
        assert_eq!(id.0, 1_700_000_000_000_042);
        assert_eq!(serde_json::to_string(&id).unwrap(), "1700000000000042");
    }
}
