//! Responder handshake states
//!
//! ```text
//! Received -> Verifying -> KeyAgreed -> SessionBuilt -> Dispatched
//!     \___________\____________\____________\_______-> Failed(reason)
//! ```

use crate::errors::{AuthenticateError, Result};
use serde::{Deserialize, Serialize};

/// Progress of one handshake on the responder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeState {
    /// Request looked up, nothing verified yet
    Received,
    /// Capability objects are being verified
    Verifying,
    /// Response and session keys are agreed and stored
    KeyAgreed,
    /// Namespaces and session record are built
    SessionBuilt,
    /// Response dispatched and session stored
    Dispatched,
    /// Aborted
    Failed(String),
}

impl HandshakeState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, HandshakeState::Dispatched | HandshakeState::Failed(_))
    }

    /// Whether `next` directly follows this state
    pub fn can_transition_to(&self, next: &HandshakeState) -> bool {
        use HandshakeState::*;
        match (self, next) {
            (Received, Verifying)
            | (Verifying, KeyAgreed)
            | (KeyAgreed, SessionBuilt)
            | (SessionBuilt, Dispatched) => true,
            (current, Failed(_)) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the handshake does not allow
    pub fn transition(self, next: HandshakeState) -> Result<HandshakeState> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(AuthenticateError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}
