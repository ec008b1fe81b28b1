//! Pairwire Core
//!
//! Foundation types for the session-authenticate handshake: identifiers,
//! wire structures, session records, the unified error type and the effect
//! interfaces every collaborator implements. Nothing here performs I/O or
//! cryptography beyond hashing key material into topics.
//!
//! # Layout
//! - [`identifiers`]: topics, request ids, CAIP-2/CAIP-10/DID:PKH
//! - [`auth`]: auth payloads, CACAOs, ReCaps, wire error codes
//! - [`session`]: negotiated namespaces and session records
//! - [`rpc`]: JSON-RPC envelopes and protocol methods
//! - [`keys`]: agreement key material
//! - [`effects`]: collaborator traits
//! - [`config`]: handshake configuration

#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod effects;
pub mod errors;
pub mod identifiers;
pub mod keys;
pub mod participant;
pub mod rpc;
pub mod session;

pub use errors::{PairwireError, Result};
pub use identifiers::{Account, Blockchain, DidPkh, RequestId, Topic};
pub use keys::{AgreementKeys, AgreementPublicKey, KeyAgreementError, SymmetricKey};
pub use participant::{AppMetadata, Participant, Redirect};
pub use session::{NamespaceSet, Session, SessionNamespace, TransportType};
