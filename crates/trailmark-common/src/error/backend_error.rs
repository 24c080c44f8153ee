/// Failures reported by a browser backend.
#[derive(thiserror::Error, Debug, Clone)]
pub enum BackendError {
    // ============================================================
    // Lifecycle Errors
    // ============================================================
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Not ready")]
    NotReady,

    // ============================================================
    // Page Errors
    // ============================================================
    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Script execution error: {0}")]
    Script(String),

    // ============================================================
    // System Errors
    // ============================================================
    #[error("IO error: {0}")]
    Io(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}
