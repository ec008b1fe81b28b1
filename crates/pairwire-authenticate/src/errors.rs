//! Handshake error taxonomy

use crate::state::HandshakeState;
use pairwire_core::auth::AuthError;
use pairwire_core::{KeyAgreementError, PairwireError, RequestId};

/// Failures of a session-authenticate handshake
///
/// Every variant aborts the handshake it occurred in and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticateError {
    /// Malformed key material
    #[error("Key agreement failed: {0}")]
    KeyAgreement(#[from] KeyAgreementError),

    /// Issuer or payload of a capability object cannot be parsed
    #[error("Malformed capability object: {0}")]
    MalformedCapabilityObject(String),

    /// The signed message differs from the one rebuilt from the request
    #[error("Signed message for {account} does not match the requested message")]
    MessageMismatch {
        /// Claimed account
        account: String,
    },

    /// The signature does not verify for the claimed account
    #[error("Invalid signature for {account}: {reason}")]
    SignatureInvalid {
        /// Claimed account
        account: String,
        /// Verifier detail
        reason: String,
    },

    /// The peer advertised no address to dispatch the response to
    #[error("Peer metadata has no universal link")]
    MissingPeerAddress,

    /// Capability objects grant nothing usable or contradict each other
    #[error("Invalid capability grant: {0}")]
    InvalidCapabilityGrant(String),

    /// No request with this id in history
    #[error("Request {0} not found")]
    RequestNotFound(RequestId),

    /// Stored request parameters cannot be decoded or are incomplete
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Request was answered after its expiry
    #[error("Request {0} expired")]
    RequestExpired(RequestId),

    /// Handshake state machine misuse
    #[error("Invalid handshake transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state
        from: HandshakeState,
        /// Requested state
        to: HandshakeState,
    },

    /// Signing request cannot be served
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A collaborator (store, transport, registry) failed
    #[error(transparent)]
    Collaborator(#[from] PairwireError),
}

impl AuthenticateError {
    /// Wire-level error reported for this failure
    pub fn to_auth_error(&self) -> AuthError {
        match self {
            AuthenticateError::KeyAgreement(_)
            | AuthenticateError::MalformedCapabilityObject(_)
            | AuthenticateError::InvalidCapabilityGrant(_)
            | AuthenticateError::RequestNotFound(_) => AuthError::MalformedResponseParams,
            AuthenticateError::MessageMismatch { .. } => AuthError::MessageCompromised,
            AuthenticateError::SignatureInvalid { .. } => AuthError::SignatureVerificationFailed,
            AuthenticateError::MissingPeerAddress
            | AuthenticateError::MalformedRequest(_)
            | AuthenticateError::Signing(_) => AuthError::MalformedRequestParams,
            AuthenticateError::RequestExpired(_) => AuthError::RequestExpired,
            AuthenticateError::InvalidTransition { .. } | AuthenticateError::Collaborator(_) => {
                AuthError::SessionCreationFailed
            }
        }
    }

    /// Whether the failure came from capability verification
    pub fn is_verification_error(&self) -> bool {
        matches!(
            self,
            AuthenticateError::MalformedCapabilityObject(_)
                | AuthenticateError::MessageMismatch { .. }
                | AuthenticateError::SignatureInvalid { .. }
        )
    }
}

/// Result type for handshake operations
pub type Result<T> = std::result::Result<T, AuthenticateError>;
