use crate::action::Action;
use serde::{Deserialize, Serialize};

/// Selector type reported for every step. The resolver does not say which rule
/// produced a selector, so steps carry the CSS default.
pub const DEFAULT_SELECTOR_TYPE: &str = "css";

/// Normalized form of one action, handed to whatever stores test cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    /// Zero-based position in the source log.
    pub order: usize,
    pub action_type: String,
    pub selector: Option<String>,
    pub selector_type: String,
    pub value: String,
    pub screenshot: String,
}

impl TestStep {
    pub fn from_action(order: usize, action: &Action) -> Self {
        Self {
            order,
            action_type: action.kind.name().to_string(),
            selector: action.selector().map(str::to_string),
            selector_type: DEFAULT_SELECTOR_TYPE.to_string(),
            value: action.value().unwrap_or_default().to_string(),
            screenshot: action.screenshot.clone(),
        }
    }
}
