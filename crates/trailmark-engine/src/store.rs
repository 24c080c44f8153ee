use crate::session::SessionId;
use std::path::{Path, PathBuf};
use tokio::fs;
use trailmark_common::Action;

/// File name of a session's action log inside its directory.
pub const LOG_FILE_NAME: &str = "actions.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Action log not found: {}", .0.display())]
    LogNotFound(PathBuf),
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Directory-per-session storage of action logs.
///
/// ```text
/// <root>/<session id>/step_0.png
/// <root>/<session id>/step_1.png
/// <root>/<session id>/actions.json
/// ```
///
/// `actions.json` is written once, when the session stops, and is the only
/// input script generation reads.
#[derive(Debug, Clone)]
pub struct ActionLogStore {
    root: PathBuf,
}

impl ActionLogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn log_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join(LOG_FILE_NAME)
    }

    pub async fn create_session_dir(&self, id: &SessionId) -> Result<PathBuf, StoreError> {
        check_id(id)?;
        let dir = self.session_dir(id);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Replace the session's log with `actions`. The file is written beside the
    /// target and renamed into place, so readers never see a partial log.
    pub async fn write(&self, id: &SessionId, actions: &[Action]) -> Result<PathBuf, StoreError> {
        let dir = self.create_session_dir(id).await?;
        let path = dir.join(LOG_FILE_NAME);
        let staging = dir.join(format!("{}.tmp", LOG_FILE_NAME));

        let json = serde_json::to_string_pretty(actions)?;
        fs::write(&staging, json).await?;
        fs::rename(&staging, &path).await?;

        Ok(path)
    }

    pub async fn load(&self, id: &SessionId) -> Result<Vec<Action>, StoreError> {
        check_id(id)?;
        let path = self.log_path(id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::LogNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn exists(&self, id: &SessionId) -> bool {
        id.is_safe() && fs::try_exists(self.log_path(id)).await.unwrap_or(false)
    }
}

fn check_id(id: &SessionId) -> Result<(), StoreError> {
    if id.is_safe() {
        Ok(())
    } else {
        Err(StoreError::InvalidSessionId(id.to_string()))
    }
}
