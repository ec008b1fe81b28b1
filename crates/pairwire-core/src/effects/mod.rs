//! Effect interfaces for the collaborators the handshake depends on
//!
//! Traits only; handlers live in `pairwire-effects`. Handshake flows receive
//! them as `Arc<dyn Trait>` so tests can swap in recording implementations.
//!
//! - [`KeyManagementEffects`]: key pairs, agreements, topic-scoped secrets
//! - [`NetworkEffects`]: relay subscribe/publish and response subscriptions
//! - [`LinkEnvelopeEffects`]: link-mode delivery to a universal link
//! - [`SessionStore`], [`RpcHistory`]: keyed persistence
//! - [`PairingEffects`]: pairing activation
//! - [`TimeEffects`]: wall clock

pub mod kms;
pub mod network;
pub mod pairing;
pub mod storage;
pub mod time;

pub use kms::KeyManagementEffects;
pub use network::{EnvelopeType, LinkEnvelopeEffects, NetworkEffects};
pub use pairing::PairingEffects;
pub use storage::{RpcHistory, SessionStore};
pub use time::TimeEffects;
