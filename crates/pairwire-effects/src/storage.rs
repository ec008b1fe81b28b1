//! In-memory session store and request history

use async_trait::async_trait;
use pairwire_core::effects::{RpcHistory, SessionStore};
use pairwire_core::rpc::RpcRecord;
use pairwire_core::{RequestId, Result, Session, Topic};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session store keyed by session topic
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<Topic, Session>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is stored
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_session(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.topic.clone(), session);
        Ok(())
    }

    async fn get_session(&self, topic: &Topic) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(topic).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().cloned().collect())
    }
}

/// Request history keyed by request id
#[derive(Debug, Clone, Default)]
pub struct MemoryRpcHistory {
    records: Arc<RwLock<HashMap<RequestId, RpcRecord>>>,
}

impl MemoryRpcHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RpcHistory for MemoryRpcHistory {
    async fn set(&self, record: RpcRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: RequestId) -> Result<Option<RpcRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }
}
