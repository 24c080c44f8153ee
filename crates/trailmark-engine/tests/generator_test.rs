use tempfile::TempDir;
use trailmark_engine::common::Action;
use trailmark_engine::config::schema::{GeneratorConfig, Viewport};
use trailmark_engine::generator::{Flavor, GeneratorError, ScriptGenerator, generate_steps};
use trailmark_engine::session::SessionId;
use trailmark_engine::store::{ActionLogStore, StoreError};

fn seven_actions() -> Vec<Action> {
    (1..=7)
        .map(|i| match i % 3 {
            0 => Action::navigation(format!("https://shop.test/page{}", i), i as f64),
            1 => Action::click("https://shop.test/", format!("#item{}", i), i as f64),
            _ => Action::input("https://shop.test/", "#q", format!("query {}", i), i as f64),
        })
        .collect()
}

/// Step numbers whose instruction is directly followed by a URL assertion.
fn asserted_steps(script: &str) -> Vec<usize> {
    let lines: Vec<&str> = script.lines().map(str::trim).collect();
    let mut steps = Vec::new();
    let mut current = 0;
    for line in &lines {
        if let Some(rest) = line.strip_prefix("# Step ") {
            current = rest.split(':').next().unwrap().parse().unwrap();
        }
        if line.starts_with("# Assertion:") {
            steps.push(current);
        }
    }
    steps
}

#[test]
fn test_assertions_follow_every_third_step() {
    let generator = ScriptGenerator::default();
    for flavor in [Flavor::Playwright, Flavor::Pytest] {
        let artifact = generator.generate(&seven_actions(), flavor, "Cadence");
        assert_eq!(asserted_steps(&artifact.script), vec![3, 6], "{}", flavor);
        assert_eq!(artifact.script.matches("expect(page).to_have_url(").count(), 2);
        assert!(artifact.script.contains("expect(page).to_have_url('https://shop.test/page3')"));
        assert!(artifact.script.contains("expect(page).to_have_url('https://shop.test/page6')"));
        assert_eq!(artifact.step_count, 7);
    }
}

#[test]
fn test_generic_script_navigates_without_assertions() {
    let log = vec![Action::navigation("https://x.test", 1.0)];
    let artifact = ScriptGenerator::default().generate(&log, Flavor::Script, "smoke");

    let script = &artifact.script;
    let preamble_goto = script.find("page.goto('https://x.test')").unwrap();
    assert!(preamble_goto < script.find("# Step 1").unwrap());
    assert!(!script.contains("expect("));
    assert!(!script.contains("# Assertion"));
    assert!(script.starts_with("from playwright.sync_api import sync_playwright\n"));
    assert!(script.contains("browser = playwright.chromium.launch(headless=False)"));
    assert!(script.trim_end().ends_with("run(playwright)"));
    assert_eq!(artifact.step_count, 1);
}

#[test]
fn test_empty_log_navigates_to_empty_url() {
    let artifact = ScriptGenerator::default().generate(&[], Flavor::Playwright, "empty");
    assert!(artifact.script.contains("page.goto('')"));
    assert!(!artifact.script.contains("# Step"));
    assert_eq!(artifact.step_count, 0);
}

#[test]
fn test_actions_map_to_instructions_in_order() {
    let log = vec![
        Action::navigation("https://app.test/login", 1.0),
        Action::input("https://app.test/login", "#user", "o'brien", 2.0),
        Action::click("https://app.test/login", "/html/body/form/button", 3.0),
    ];
    let script = ScriptGenerator::default()
        .generate(&log, Flavor::Playwright, "login")
        .script;

    let nav = script.find("# Step 1: Navigate to https://app.test/login").unwrap();
    let fill = script.find("page.fill('#user', 'o\\'brien')").unwrap();
    let click = script.find("page.click('xpath=/html/body/form/button')").unwrap();
    assert!(nav < fill && fill < click);
}

#[test]
fn test_playwright_flavor_names_test_function() {
    let script = ScriptGenerator::default()
        .generate(&seven_actions(), Flavor::Playwright, "Checkout Happy Path")
        .script;
    assert!(script.contains("def test_checkout_happy_path(playwright: Playwright):"));
    assert!(script.contains("from playwright.sync_api import Playwright, sync_playwright, expect"));
    assert!(script.contains("launch(headless=True)"));
    assert!(script.trim_end().ends_with("browser.close()"));
}

#[test]
fn test_pytest_flavor_emits_viewport_fixture() {
    let config = GeneratorConfig {
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        ..GeneratorConfig::default()
    };
    let artifact = ScriptGenerator::new(config).generate(&seven_actions(), Flavor::Pytest, "Search");
    let script = &artifact.script;

    let fixture = script.find("def browser_context_args(browser_context_args):").unwrap();
    let test = script.find("def test_search(page: Page):").unwrap();
    assert!(fixture < test);
    assert!(script.contains("\"viewport\": {\"width\": 1280, \"height\": 720},"));
    assert!(script.trim_end().ends_with("page.close()"));
    assert_eq!(artifact.test_name, "search");
}

#[test]
fn test_configured_browser_is_launched() {
    let config = GeneratorConfig {
        browser: "firefox".parse().unwrap(),
        headless: Some(true),
        ..GeneratorConfig::default()
    };
    let script = ScriptGenerator::new(config)
        .generate(&seven_actions(), Flavor::Script, "ff")
        .script;
    assert!(script.contains("browser = playwright.firefox.launch(headless=True)"));
}

#[test]
fn test_steps_are_index_aligned() {
    let log = seven_actions();
    let steps = generate_steps(&log);
    assert_eq!(steps.len(), log.len());
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.order, i);
        assert_eq!(step.selector_type, "css");
        assert_eq!(step.action_type, log[i].kind.name());
    }
    assert_eq!(steps[0].selector.as_deref(), Some("#item1"));
    assert_eq!(steps[1].value, "query 2");
    assert_eq!(steps[2].selector, None);
    assert_eq!(steps[2].value, "");
    assert!(generate_steps(&[]).is_empty());
}

#[tokio::test]
async fn test_generate_for_session_writes_script() {
    let dir = TempDir::new().unwrap();
    let store = ActionLogStore::new(dir.path());
    let id = SessionId::generate();
    store.write(&id, &seven_actions()).await.unwrap();

    let outcome = ScriptGenerator::default()
        .generate_for_session(&store, &id, Flavor::Pytest, "Stored Run")
        .await
        .unwrap();

    assert_eq!(outcome.recording_id, id);
    assert_eq!(outcome.test_name, "stored_run");
    assert_eq!(outcome.steps_count, 7);
    assert_eq!(outcome.steps.len(), 7);
    assert_eq!(outcome.output_file, store.session_dir(&id).join("pytest_test.py"));
    let written = std::fs::read_to_string(&outcome.output_file).unwrap();
    assert!(written.contains("def test_stored_run(page: Page):"));
}

#[tokio::test]
async fn test_generation_in_parallel_reads_same_log() {
    let dir = TempDir::new().unwrap();
    let store = ActionLogStore::new(dir.path());
    let id = SessionId::generate();
    store.write(&id, &seven_actions()).await.unwrap();

    let generator = ScriptGenerator::default();
    let (a, b, c) = tokio::join!(
        generator.generate_for_session(&store, &id, Flavor::Script, "t"),
        generator.generate_for_session(&store, &id, Flavor::Playwright, "t"),
        generator.generate_for_session(&store, &id, Flavor::Pytest, "t"),
    );
    for outcome in [a.unwrap(), b.unwrap(), c.unwrap()] {
        assert_eq!(outcome.steps_count, 7);
        assert!(outcome.output_file.exists());
    }
}

#[tokio::test]
async fn test_missing_log_fails_generation() {
    let dir = TempDir::new().unwrap();
    let store = ActionLogStore::new(dir.path());
    let id = SessionId::from("recording_20250101_120000_000000");

    let result = ScriptGenerator::default()
        .generate_for_session(&store, &id, Flavor::Script, "nothing")
        .await;
    assert!(matches!(
        result,
        Err(GeneratorError::Store(StoreError::LogNotFound(_)))
    ));
}

#[test]
fn test_hostile_url_and_name_cannot_break_out_of_the_script() {
    let log = vec![
        Action::navigation("https://x.test", 1.0),
        Action::navigation("https://x.test/a\nimport os", 2.0),
    ];
    let artifact = ScriptGenerator::default().generate(&log, Flavor::Pytest, "drop; table");

    let script = &artifact.script;
    assert!(script.contains("def test_drop__table(page: Page):"));
    assert!(script.contains("# Step 2: Navigate to https://x.test/a import os\n"));
    assert!(script.contains("page.goto('https://x.test/a\\nimport os')"));
    assert!(!script.lines().any(|line| line.trim_start().starts_with("import os")));
}
