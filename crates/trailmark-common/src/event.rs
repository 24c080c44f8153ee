use crate::element::ElementSnapshot;
use serde::{Deserialize, Serialize};

/// An event delivered by a backend to a recording session.
///
/// `Click` and `Input` arrive as JSON payloads from the injected capture hook;
/// `FrameNavigated` is produced by the backend itself from the browser's
/// navigation notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageEvent {
    Click {
        url: String,
        target: ElementSnapshot,
    },
    Input {
        url: String,
        target: ElementSnapshot,
        #[serde(default)]
        value: String,
    },
    FrameNavigated {
        url: String,
        main_frame: bool,
    },
}

impl PageEvent {
    /// Parse a payload sent by the capture hook.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn url(&self) -> &str {
        match self {
            PageEvent::Click { url, .. }
            | PageEvent::Input { url, .. }
            | PageEvent::FrameNavigated { url, .. } => url,
        }
    }
}
