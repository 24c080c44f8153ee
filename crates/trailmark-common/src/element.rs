use serde::{Deserialize, Deserializer, Serialize};

/// Attributes of an event target, captured in the page at the moment the event fired.
///
/// `path` is the element's ancestry from the document root down to the element
/// itself. It is what the default [`crate::DomEvaluator`] turns into an XPath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub path: Vec<PathSegment>,
}

/// One step of an element's ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub tag: String,
    /// 1-based position among siblings with the same tag.
    pub position: u32,
    /// Number of siblings (including this node) sharing the tag.
    pub siblings: u32,
}

impl PathSegment {
    pub fn new(tag: impl Into<String>, position: u32, siblings: u32) -> Self {
        Self {
            tag: tag.into(),
            position,
            siblings,
        }
    }
}

impl ElementSnapshot {
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

/// The capture hook reports missing attributes as `null` or `""`; both mean "absent".
fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}
