use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use trailmark_common::BrowserEngine;

/// Identifier of a recording session, also the name of its directory.
///
/// Generated ids look like `recording_20261019_142301_3fa9c1`: the creation time
/// to the second plus six hex digits of a random UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self::generate_at(Local::now())
    }

    pub fn generate_at(created: DateTime<Local>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "recording_{}_{}",
            created.format("%Y%m%d_%H%M%S"),
            &suffix[..6]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids name directories, so anything that could escape the output root is refused.
    pub fn is_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self.0.contains(['/', '\\'])
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Parameters of a start-recording call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub base_url: String,
    /// Engine name; validated against [`BrowserEngine`] when the session starts.
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default)]
    pub headless: bool,
}

fn default_engine() -> String {
    BrowserEngine::default().to_string()
}

impl StartRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            engine: default_engine(),
            headless: false,
        }
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// Persistent description of a session. The browser handle lives with the
/// recorder, not here.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSession {
    pub id: SessionId,
    pub base_url: String,
    pub engine: BrowserEngine,
    pub headless: bool,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Local>,
}
