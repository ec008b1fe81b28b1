//! Pairwire Effects
//!
//! Handlers for the effect interfaces declared in `pairwire-core`.
//!
//! The memory handlers are complete implementations with key-scoped
//! atomicity and double as the test kit: the network handler and deep link
//! opener record every dispatch so tests can assert on them.

#![forbid(unsafe_code)]

pub mod kms;
pub mod link;
pub mod logging;
pub mod network;
pub mod pairing;
pub mod storage;
pub mod time;

pub use kms::MemoryKeyManagementHandler;
pub use link::{
    open_envelope, DeepLinkOpener, LinkEnvelopesDispatcher, RecordingDeepLinkOpener,
};
pub use network::{MemoryNetworkHandler, PublishedRequest, PublishedResponse};
pub use pairing::MemoryPairingRegistry;
pub use storage::{MemoryRpcHistory, MemorySessionStore};
pub use time::{FixedTimeHandler, SystemTimeHandler};
