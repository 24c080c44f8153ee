use serde::{Deserialize, Serialize};

/// One recorded browser event, as stored in a session's `actions.json`.
///
/// The on-disk shape is a flat JSON object tagged by `type`:
///
/// ```json
/// {"type": "input", "timestamp": 1718000000.5, "url": "https://example.com/login",
///  "selector": "#email", "value": "user@example.com", "screenshot": "recordings/x/step_2.png"}
/// ```
///
/// Actions are never mutated after they are appended to a log; their position in
/// the log is the step order of every script generated from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Wall-clock seconds since the Unix epoch. Only used for display.
    pub timestamp: f64,
    /// Page URL at capture time.
    pub url: String,
    /// Path of the screenshot taken for this step, empty when capture failed.
    #[serde(default)]
    pub screenshot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Navigation,
    Click { selector: String },
    Input { selector: String, value: String },
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Navigation => "navigation",
            ActionKind::Click { .. } => "click",
            ActionKind::Input { .. } => "input",
        }
    }
}

impl Action {
    pub fn navigation(url: impl Into<String>, timestamp: f64) -> Self {
        Self {
            kind: ActionKind::Navigation,
            timestamp,
            url: url.into(),
            screenshot: String::new(),
        }
    }

    pub fn click(url: impl Into<String>, selector: impl Into<String>, timestamp: f64) -> Self {
        Self {
            kind: ActionKind::Click {
                selector: selector.into(),
            },
            timestamp,
            url: url.into(),
            screenshot: String::new(),
        }
    }

    pub fn input(
        url: impl Into<String>,
        selector: impl Into<String>,
        value: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Self {
            kind: ActionKind::Input {
                selector: selector.into(),
                value: value.into(),
            },
            timestamp,
            url: url.into(),
            screenshot: String::new(),
        }
    }

    pub fn with_screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.screenshot = screenshot.into();
        self
    }

    pub fn selector(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Navigation => None,
            ActionKind::Click { selector } | ActionKind::Input { selector, .. } => {
                Some(selector.as_str())
            }
        }
    }

    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Input { value, .. } => Some(value.as_str()),
            _ => None,
        }
    }
}
