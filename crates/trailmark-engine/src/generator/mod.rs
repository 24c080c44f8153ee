//! Compiles stored action logs into test scripts.
//!
//! Generation works on the log alone and never talks to a browser, so any
//! number of generations can run against one finished session.

mod flavor;
mod steps;

pub use flavor::Flavor;
pub use steps::generate_steps;

use crate::config::schema::GeneratorConfig;
use crate::session::SessionId;
use crate::store::{ActionLogStore, StoreError};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use trailmark_common::{Action, ActionKind, TestStep};

/// Steps between two URL assertions in the test flavors.
const ASSERTION_INTERVAL: usize = 3;

const INDENT: &str = "    ";

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Unsupported script flavor: {0}")]
    UnsupportedFlavor(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to write script: {0}")]
    Io(#[from] std::io::Error),
}

/// Generated script text plus the number of actions it replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub flavor: Flavor,
    pub test_name: String,
    pub script: String,
    pub step_count: usize,
}

/// Result of generating a script for a stored session.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub recording_id: SessionId,
    pub test_name: String,
    pub flavor: Flavor,
    pub output_file: PathBuf,
    pub steps_count: usize,
    pub steps: Vec<TestStep>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    config: GeneratorConfig,
}

impl ScriptGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, actions: &[Action], flavor: Flavor, test_name: &str) -> GeneratedArtifact {
        let test_name = normalize_test_name(test_name);
        let mut out = String::new();

        self.preamble(&mut out, flavor, &test_name);

        let start_url = actions.first().map(|a| a.url.as_str()).unwrap_or_default();
        line(&mut out, 1, "# Navigate to the base URL");
        line(&mut out, 1, &format!("page.goto({})", py_str(start_url)));
        out.push('\n');

        for (i, action) in actions.iter().enumerate() {
            let step = i + 1;
            match &action.kind {
                ActionKind::Navigation => {
                    let url = comment_text(&action.url);
                    line(&mut out, 1, &format!("# Step {}: Navigate to {}", step, url));
                    line(&mut out, 1, &format!("page.goto({})", py_str(&action.url)));
                }
                ActionKind::Click { selector } => {
                    line(&mut out, 1, &format!("# Step {}: Click on element", step));
                    line(&mut out, 1, &format!("page.click({})", locator(selector)));
                }
                ActionKind::Input { selector, value } => {
                    line(&mut out, 1, &format!("# Step {}: Input text", step));
                    line(
                        &mut out,
                        1,
                        &format!("page.fill({}, {})", locator(selector), py_str(value)),
                    );
                }
            }

            if flavor.asserts() && step % ASSERTION_INTERVAL == 0 {
                line(&mut out, 1, "# Assertion: Page has expected URL");
                line(
                    &mut out,
                    1,
                    &format!("expect(page).to_have_url({})", py_str(&action.url)),
                );
            }
            out.push('\n');
        }

        self.epilogue(&mut out, flavor);

        GeneratedArtifact {
            flavor,
            test_name,
            script: out,
            step_count: actions.len(),
        }
    }

    /// Load a stored session, generate a script and save it next to the log.
    pub async fn generate_for_session(
        &self,
        store: &ActionLogStore,
        id: &SessionId,
        flavor: Flavor,
        test_name: &str,
    ) -> Result<GenerationOutcome, GeneratorError> {
        let actions = store.load(id).await?;
        let artifact = self.generate(&actions, flavor, test_name);

        let output_file = store.session_dir(id).join(flavor.file_name());
        tokio::fs::write(&output_file, &artifact.script).await?;
        info!(
            "Generated {} script for {} ({} steps) at {}",
            flavor,
            id,
            artifact.step_count,
            output_file.display()
        );

        Ok(GenerationOutcome {
            recording_id: id.clone(),
            test_name: artifact.test_name,
            flavor,
            output_file,
            steps_count: artifact.step_count,
            steps: generate_steps(&actions),
        })
    }

    fn headless(&self, flavor: Flavor) -> &'static str {
        let headless = self.config.headless.unwrap_or(flavor.asserts());
        if headless { "True" } else { "False" }
    }

    fn preamble(&self, out: &mut String, flavor: Flavor, test_name: &str) {
        let browser = self.config.browser.as_str();
        match flavor {
            Flavor::Script => {
                line(out, 0, "from playwright.sync_api import sync_playwright");
                out.push_str("\n\n");
                line(out, 0, "def run(playwright):");
                line(
                    out,
                    1,
                    &format!(
                        "browser = playwright.{}.launch(headless={})",
                        browser,
                        self.headless(flavor)
                    ),
                );
                line(out, 1, "context = browser.new_context()");
                line(out, 1, "page = context.new_page()");
            }
            Flavor::Playwright => {
                line(out, 0, "import pytest");
                line(out, 0, "from playwright.sync_api import Playwright, sync_playwright, expect");
                out.push_str("\n\n");
                line(out, 0, &format!("def test_{}(playwright: Playwright):", test_name));
                line(
                    out,
                    1,
                    &format!(
                        "browser = playwright.{}.launch(headless={})",
                        browser,
                        self.headless(flavor)
                    ),
                );
                line(out, 1, "context = browser.new_context()");
                line(out, 1, "page = context.new_page()");
            }
            Flavor::Pytest => {
                let viewport = self.config.viewport;
                line(out, 0, "import pytest");
                line(out, 0, "from playwright.sync_api import Page, expect");
                out.push_str("\n\n");
                line(out, 0, "@pytest.fixture(scope=\"session\")");
                line(out, 0, "def browser_context_args(browser_context_args):");
                line(out, 1, "return {");
                line(out, 2, "**browser_context_args,");
                line(
                    out,
                    2,
                    &format!(
                        "\"viewport\": {{\"width\": {}, \"height\": {}}},",
                        viewport.width, viewport.height
                    ),
                );
                line(out, 1, "}");
                out.push_str("\n\n");
                line(out, 0, &format!("def test_{}(page: Page):", test_name));
            }
        }
        out.push('\n');
    }

    fn epilogue(&self, out: &mut String, flavor: Flavor) {
        match flavor {
            Flavor::Script => {
                line(out, 1, "context.close()");
                line(out, 1, "browser.close()");
                out.push_str("\n\n");
                line(out, 0, "with sync_playwright() as playwright:");
                line(out, 1, "run(playwright)");
            }
            Flavor::Playwright => {
                line(out, 1, "context.close()");
                line(out, 1, "browser.close()");
            }
            Flavor::Pytest => {
                line(out, 1, "page.close()");
            }
        }
    }
}

/// Lower-case the name and turn it into a Python identifier: spaces and any
/// other character outside `[a-z0-9_]` become underscores.
pub fn normalize_test_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Text safe to place after `#` on a single line.
fn comment_text(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    let _ = writeln!(out, "{}", text);
}

fn locator(selector: &str) -> String {
    if selector.starts_with('/') {
        py_str(&format!("xpath={}", selector))
    } else {
        py_str(selector)
    }
}

/// Single-quoted Python string literal.
fn py_str(value: &str) -> String {
    let mut lit = String::with_capacity(value.len() + 2);
    lit.push('\'');
    for c in value.chars() {
        match c {
            '\\' => lit.push_str("\\\\"),
            '\'' => lit.push_str("\\'"),
            '\n' => lit.push_str("\\n"),
            '\r' => lit.push_str("\\r"),
            '\t' => lit.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(lit, "\\x{:02x}", c as u32);
            }
            c => lit.push(c),
        }
    }
    lit.push('\'');
    lit
}
