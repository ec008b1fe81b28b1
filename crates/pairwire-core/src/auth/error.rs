//! Wire-level authentication errors
//!
//! Codes travel in JSON-RPC error responses. `from_code` only recognises codes
//! a peer may legitimately send; anything else is reported as `None` and the
//! caller decides what to do with it.

use serde::{Deserialize, Serialize};

/// Authentication failure reported to the owning client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum AuthError {
    /// Peer disconnected before answering
    #[error("User disconnected")]
    UserDisconnected,
    /// Peer declined the request
    #[error("User rejected")]
    UserRejected,
    /// Response parameters could not be decoded or verified
    #[error("Malformed response params")]
    MalformedResponseParams,
    /// Request parameters could not be decoded
    #[error("Malformed request params")]
    MalformedRequestParams,
    /// The signed message differs from the requested one
    #[error("Original message compromised")]
    MessageCompromised,
    /// The signature does not match the claimed account
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
    /// The request expired before it was answered
    #[error("Request expired")]
    RequestExpired,
    /// Local failure while materialising the session
    #[error("Session creation failed")]
    SessionCreationFailed,
}

impl AuthError {
    /// Numeric code carried on the wire
    pub fn code(&self) -> i64 {
        match self {
            AuthError::UserDisconnected => 6000,
            AuthError::UserRejected => 12001,
            AuthError::MalformedResponseParams => 12002,
            AuthError::MalformedRequestParams => 12003,
            AuthError::MessageCompromised => 12004,
            AuthError::SignatureVerificationFailed => 12005,
            AuthError::RequestExpired => 12006,
            AuthError::SessionCreationFailed => 12100,
        }
    }

    /// Map a wire code received from a peer
    ///
    /// `SessionCreationFailed` is local-only and never accepted from the wire.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            6000 => Some(AuthError::UserDisconnected),
            12001 => Some(AuthError::UserRejected),
            12002 => Some(AuthError::MalformedResponseParams),
            12003 => Some(AuthError::MalformedRequestParams),
            12004 => Some(AuthError::MessageCompromised),
            12005 => Some(AuthError::SignatureVerificationFailed),
            12006 => Some(AuthError::RequestExpired),
            _ => None,
        }
    }

    /// Message sent alongside the code
    pub fn message(&self) -> String {
        self.to_string()
    }
}
