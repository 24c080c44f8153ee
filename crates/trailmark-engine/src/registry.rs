use crate::backend::BackendFactory;
use crate::recorder::{Recorder, RecorderError, StopSummary};
use crate::session::{SessionId, StartRequest};
use crate::store::ActionLogStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

enum Entry {
    Live(Arc<Recorder>),
    Stopped(StopSummary),
}

/// Keeps every session addressable by id from start until after it stops.
///
/// A session is inserted only once it is recording. Stopping replaces the live
/// recorder with its summary, so repeated stops keep answering with the same
/// result instead of reporting an unknown session.
pub struct SessionRegistry {
    store: ActionLogStore,
    sessions: Mutex<HashMap<SessionId, Entry>>,
}

impl SessionRegistry {
    pub fn new(store: ActionLogStore) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &ActionLogStore {
        &self.store
    }

    pub async fn start(
        &self,
        request: StartRequest,
        factory: &dyn BackendFactory,
    ) -> Result<Arc<Recorder>, RegistryError> {
        let recorder = Arc::new(Recorder::start(request, factory, self.store.clone()).await?);
        self.sessions
            .lock()
            .await
            .insert(recorder.id().clone(), Entry::Live(Arc::clone(&recorder)));
        Ok(recorder)
    }

    /// The live recorder for `id`.
    pub async fn get(&self, id: &SessionId) -> Result<Arc<Recorder>, RegistryError> {
        match self.sessions.lock().await.get(id) {
            Some(Entry::Live(recorder)) => Ok(Arc::clone(recorder)),
            _ => Err(RegistryError::SessionNotFound(id.clone())),
        }
    }

    pub async fn stop(&self, id: &SessionId) -> Result<StopSummary, RegistryError> {
        let recorder = match self.sessions.lock().await.get(id) {
            Some(Entry::Live(recorder)) => Arc::clone(recorder),
            Some(Entry::Stopped(summary)) => return Ok(summary.clone()),
            None => return Err(RegistryError::SessionNotFound(id.clone())),
        };

        let summary = recorder.stop().await?;
        self.sessions
            .lock()
            .await
            .insert(id.clone(), Entry::Stopped(summary.clone()));
        info!("Session {} released", id);
        Ok(summary)
    }

    /// Drop the stored summary of a stopped session. Live sessions are left alone
    /// and must be stopped first.
    pub async fn forget(&self, id: &SessionId) -> Option<StopSummary> {
        let mut sessions = self.sessions.lock().await;
        if !matches!(sessions.get(id), Some(Entry::Stopped(_))) {
            return None;
        }
        match sessions.remove(id) {
            Some(Entry::Stopped(summary)) => Some(summary),
            _ => None,
        }
    }

    /// Ids of sessions that are still recording.
    pub async fn active(&self) -> Vec<SessionId> {
        let sessions = self.sessions.lock().await;
        let mut ids: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Live(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Stop every live session, e.g. on shutdown.
    pub async fn stop_all(&self) -> Vec<Result<StopSummary, RegistryError>> {
        let mut results = Vec::new();
        for id in self.active().await {
            results.push(self.stop(&id).await);
        }
        results
    }
}
