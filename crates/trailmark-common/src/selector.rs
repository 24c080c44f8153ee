//! Selector Resolution
//!
//! Turns a captured event target into the locator string stored in the action log.
//! Priority is fixed: `#id`, then a compound class selector, then an XPath.
//!
//! The XPath branch is the only part that depends on the live document, so it sits
//! behind [`DomEvaluator`]. Backends capture the target's ancestry in the page at
//! event time; [`AncestryXPath`] turns that into an absolute path. Tests can supply
//! their own evaluator.

use crate::element::{ElementSnapshot, PathSegment};

/// Evaluates a locator for an element against the document it was captured from.
pub trait DomEvaluator: Send + Sync {
    /// Returns an XPath for `element`, or `None` if the document gave nothing usable.
    fn evaluate_xpath(&self, element: &ElementSnapshot) -> Option<String>;
}

/// Builds an absolute XPath from the ancestry captured with the element.
#[derive(Debug, Clone, Copy, Default)]
pub struct AncestryXPath;

impl DomEvaluator for AncestryXPath {
    fn evaluate_xpath(&self, element: &ElementSnapshot) -> Option<String> {
        absolute_xpath(&element.path)
    }
}

/// `/html/body/div[2]/button`: a position predicate is only emitted where the tag
/// is shared with a sibling.
pub fn absolute_xpath(path: &[PathSegment]) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let mut xpath = String::new();
    for segment in path {
        let tag = segment.tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return None;
        }
        xpath.push('/');
        xpath.push_str(&tag);
        if segment.siblings > 1 {
            xpath.push_str(&format!("[{}]", segment.position.max(1)));
        }
    }
    Some(xpath)
}

#[derive(Debug, Clone, Default)]
pub struct SelectorResolver<E = AncestryXPath> {
    evaluator: E,
}

impl SelectorResolver<AncestryXPath> {
    pub fn new() -> Self {
        Self {
            evaluator: AncestryXPath,
        }
    }
}

impl<E: DomEvaluator> SelectorResolver<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }

    /// Never fails: when neither attribute nor ancestry is usable the result
    /// degrades to `//<tag>` (or `//*` for an unnamed target).
    pub fn resolve(&self, element: &ElementSnapshot) -> String {
        if let Some(id) = element.id.as_deref().map(str::trim)
            && !id.is_empty()
        {
            return format!("#{}", id);
        }

        if let Some(class) = element.class.as_deref() {
            let tokens: Vec<&str> = class.split_whitespace().collect();
            if !tokens.is_empty() {
                return format!(".{}", tokens.join("."));
            }
        }

        if let Some(xpath) = self.evaluator.evaluate_xpath(element) {
            return xpath;
        }

        let tag = element.tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            "//*".to_string()
        } else {
            format!("//{}", tag)
        }
    }
}
