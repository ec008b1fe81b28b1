//! Failures raised by the handshake's collaborators
//!
//! Parsing of wire identifiers, link envelopes, the key store seen through
//! its topics, and configuration loading all report through
//! [`PairwireError`]. Handshake-level failures (mismatched messages, bad
//! signatures, unreachable peers) live in `pairwire-authenticate` and wrap
//! this type when a collaborator is the cause.

use crate::identifiers::Topic;

/// Error raised by a collaborator of the handshake
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairwireError {
    /// A wire value (topic, CAIP id, ReCap, link) failed to parse
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// No agreement secret is stored for the topic
    #[error("No agreement secret for topic {0}")]
    MissingSecret(Topic),

    /// None of our public keys listens on the topic
    #[error("No public key registered for topic {0}")]
    MissingPublicKey(Topic),

    /// Key agreement, sealing or opening failed
    #[error("Crypto failure: {0}")]
    Crypto(String),

    /// A JSON-RPC payload could not be encoded or decoded
    #[error("Encoding failure: {0}")]
    Encoding(String),

    /// Configuration could not be read or is out of range
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PairwireError {
    /// Malformed wire value
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Unusable configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the topic has no key material on this side
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingSecret(_) | Self::MissingPublicKey(_))
    }
}

/// Result of a collaborator operation
pub type Result<T> = std::result::Result<T, PairwireError>;

impl From<serde_json::Error> for PairwireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<std::io::Error> for PairwireError {
    fn from(err: std::io::Error) -> Self {
        Self::config(format!("cannot read configuration: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_material_names_the_topic() {
        let topic = Topic::from_sha256(b"response");
        let err = PairwireError::MissingSecret(topic.clone());
        assert!(err.is_missing_key());
        assert_eq!(err.to_string(), format!("No agreement secret for topic {topic}"));
        assert!(PairwireError::MissingPublicKey(topic).is_missing_key());
        assert!(!PairwireError::malformed("x").is_missing_key());
    }

    #[test]
    fn test_undecodable_response_is_an_encoding_failure() {
        let json_err = serde_json::from_str::<u64>("{\"cacaos\":").unwrap_err();
        assert!(matches!(PairwireError::from(json_err), PairwireError::Encoding(_)));
    }

    #[test]
    fn test_unreadable_config_file() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "pairwire.toml");
        let err = PairwireError::from(io_err);
        assert!(matches!(err, PairwireError::Config(_)));
        assert!(err.to_string().contains("pairwire.toml"));
    }
}
