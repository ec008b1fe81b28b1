//! Pairwire Authenticate
//!
//! The `wc_sessionAuthenticate` handshake for both roles.
//!
//! A requester publishes an [`AuthPayload`](pairwire_core::auth::AuthPayload)
//! on a pairing topic. The responder signs one CACAO per account, proves the
//! signed messages match the request, agrees a session key with the requester
//! and answers over the relay or through the requester's universal link. The
//! requester repeats the verification on its side and ends up with the same
//! session topic and namespaces.
//!
//! # Layout
//! - [`formatter`]: SIWE / CAIP-122 message construction
//! - [`verifier`]: EIP-191 and EIP-1271 signature checks
//! - [`capability`]: CACAO verification against the original payload
//! - [`namespaces`]: session namespaces from verified CACAOs
//! - [`responder`]: answering requests
//! - [`requester`]: sending requests
//! - [`subscriber`]: turning responses into sessions
//! - [`signer`]: wallet-side signing helpers

#![forbid(unsafe_code)]

pub mod capability;
pub mod context;
pub mod errors;
pub mod formatter;
pub mod namespaces;
pub mod requester;
pub mod responder;
mod session;
pub mod signer;
pub mod state;
pub mod subscriber;
pub mod verifier;

pub use capability::CapabilityVerifier;
pub use context::{AuthenticateEffects, HandshakeContext};
pub use errors::{AuthenticateError, Result};
pub use formatter::{MessageFormatter, SiweMessageFormatter};
pub use namespaces::SessionNamespaceBuilder;
pub use requester::SessionAuthenticateRequester;
pub use responder::SessionAuthenticateResponder;
pub use signer::{sign_cacao, MethodSigner, PersonalSigner, SigningRequest};
pub use state::HandshakeState;
pub use subscriber::{
    correlate, AuthResponseCallback, AuthResponseSubscriber, CorrelatedResponse, SubscriptionTasks,
};
pub use verifier::{ContractSignatureResolver, MessageVerifier, SignatureVerifier};
