use serde_json::json;
use trailmark_common::{Action, ActionKind, TestStep};

#[test]
fn test_action_serializes_flat_with_type_tag() {
    let action = Action::input("https://example.com/login", "#email", "a@b.c", 1_718_000_000.25)
        .with_screenshot("recordings/r/step_0.png");

    let value = serde_json::to_value(&action).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "input",
            "selector": "#email",
            "value": "a@b.c",
            "timestamp": 1_718_000_000.25,
            "url": "https://example.com/login",
            "screenshot": "recordings/r/step_0.png"
        })
    );
}

#[test]
fn test_navigation_has_no_selector_field() {
    let action = Action::navigation("https://example.com", 1.0);
    let value = serde_json::to_value(&action).unwrap();
    assert_eq!(value["type"], "navigation");
    assert!(value.get("selector").is_none());
    assert!(value.get("value").is_none());
}

#[test]
fn test_reads_log_entries_without_screenshot() {
    let raw = r#"[
        {"type": "navigation", "timestamp": 1.5, "url": "https://x.test"},
        {"type": "click", "timestamp": 2.5, "url": "https://x.test", "selector": ".btn"}
    ]"#;
    let actions: Vec<Action> = serde_json::from_str(raw).unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].kind, ActionKind::Navigation);
    assert_eq!(actions[1].selector(), Some(".btn"));
    assert_eq!(actions[1].screenshot, "");
}

#[test]
fn test_log_survives_file_round_trip() {
    let actions = vec![
        Action::navigation("https://example.com/login", 1_718_000_000.123_456),
        Action::click("https://example.com/login", "#submit", 1_718_000_001.987_654)
            .with_screenshot("step_1.png"),
        Action::input("https://example.com/login", "/html/body/input[2]", "it's \"quoted\"", 0.1),
    ];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actions.json");
    std::fs::write(&path, serde_json::to_string_pretty(&actions).unwrap()).unwrap();

    let loaded: Vec<Action> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, actions);
}

#[test]
fn test_step_projection() {
    let click = Action::click("u", "#go", 1.0).with_screenshot("s.png");
    let step = TestStep::from_action(4, &click);
    assert_eq!(step.order, 4);
    assert_eq!(step.action_type, "click");
    assert_eq!(step.selector.as_deref(), Some("#go"));
    assert_eq!(step.selector_type, "css");
    assert_eq!(step.value, "");
    assert_eq!(step.screenshot, "s.png");

    let nav = TestStep::from_action(0, &Action::navigation("u", 1.0));
    assert_eq!(nav.selector, None);
    assert_eq!(nav.action_type, "navigation");
}
