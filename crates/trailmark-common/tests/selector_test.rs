use trailmark_common::element::{ElementSnapshot, PathSegment};
use trailmark_common::selector::{DomEvaluator, SelectorResolver};

/// Stands in for a live page: answers every query with a fixed XPath.
#[derive(Default)]
struct FakeDocument {
    answer: Option<String>,
}

impl DomEvaluator for FakeDocument {
    fn evaluate_xpath(&self, _element: &ElementSnapshot) -> Option<String> {
        self.answer.clone()
    }
}

fn nested_button() -> Vec<PathSegment> {
    vec![
        PathSegment::new("html", 1, 1),
        PathSegment::new("body", 1, 1),
        PathSegment::new("form", 1, 1),
        PathSegment::new("button", 3, 3),
    ]
}

#[test]
fn test_id_wins_over_class() {
    let resolver = SelectorResolver::new();
    let element = ElementSnapshot::with_tag("button").id("go").class("btn");
    assert_eq!(resolver.resolve(&element), "#go");
}

#[test]
fn test_class_tokens_joined_in_order_with_duplicates() {
    let resolver = SelectorResolver::new();
    let element = ElementSnapshot::with_tag("a").class("nav  item nav");
    assert_eq!(resolver.resolve(&element), ".nav.item.nav");
}

#[test]
fn test_blank_id_falls_through_to_class() {
    let resolver = SelectorResolver::new();
    let element = ElementSnapshot::with_tag("span").id("").class("badge");
    assert_eq!(resolver.resolve(&element), ".badge");
}

#[test]
fn test_xpath_fallback_uses_ancestry() {
    let resolver = SelectorResolver::new();
    let element = ElementSnapshot::with_tag("button").path(nested_button());
    assert_eq!(resolver.resolve(&element), "/html/body/form/button[3]");
}

#[test]
fn test_evaluator_only_consulted_without_attributes() {
    let document = FakeDocument {
        answer: Some("//section/p".into()),
    };
    let resolver = SelectorResolver::with_evaluator(document);

    assert_eq!(
        resolver.resolve(&ElementSnapshot::with_tag("p").id("intro")),
        "#intro"
    );
    assert_eq!(resolver.resolve(&ElementSnapshot::with_tag("p")), "//section/p");
}

#[test]
fn test_resolution_never_fails() {
    let resolver = SelectorResolver::with_evaluator(FakeDocument::default());
    assert_eq!(resolver.resolve(&ElementSnapshot::with_tag("DIV")), "//div");
    assert_eq!(resolver.resolve(&ElementSnapshot::default()), "//*");
}

#[test]
fn test_resolution_is_deterministic() {
    let resolver = SelectorResolver::new();
    let element = ElementSnapshot::with_tag("button")
        .class("btn primary")
        .path(nested_button());
    let first = resolver.resolve(&element);
    for _ in 0..10 {
        assert_eq!(resolver.resolve(&element), first);
    }
    assert_eq!(first, ".btn.primary");
}
