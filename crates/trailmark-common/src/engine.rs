use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Browser engines a recording session can be launched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserEngine {
    pub const ALL: [BrowserEngine; 3] = [
        BrowserEngine::Chromium,
        BrowserEngine::Firefox,
        BrowserEngine::Webkit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chromium => "chromium",
            BrowserEngine::Firefox => "firefox",
            BrowserEngine::Webkit => "webkit",
        }
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported browser engine: {0}")]
pub struct UnknownEngine(pub String);

impl FromStr for BrowserEngine {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" => Ok(BrowserEngine::Chromium),
            "firefox" => Ok(BrowserEngine::Firefox),
            "webkit" => Ok(BrowserEngine::Webkit),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}
