//! Keyed persistence effects

use crate::errors::Result;
use crate::identifiers::{RequestId, Topic};
use crate::rpc::RpcRecord;
use crate::session::Session;
use async_trait::async_trait;

/// Session records keyed by topic
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace the session under its topic
    async fn set_session(&self, session: Session) -> Result<()>;

    /// Session stored under a topic
    async fn get_session(&self, topic: &Topic) -> Result<Option<Session>>;

    /// Every stored session
    async fn get_all(&self) -> Result<Vec<Session>>;
}

/// History of requests, used to correlate responses
#[async_trait]
pub trait RpcHistory: Send + Sync {
    /// Record a request
    async fn set(&self, record: RpcRecord) -> Result<()>;

    /// Look up a request by id
    async fn get(&self, id: RequestId) -> Result<Option<RpcRecord>>;
}
