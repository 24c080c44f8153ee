use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trailmark_common::BrowserEngine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailmarkConfig {
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub chromium: ChromiumConfig,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub engine: BrowserEngine,
    #[serde(default)]
    pub headless: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            engine: BrowserEngine::default(),
            headless: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recordings")
}

/// Settings baked into generated scripts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Engine the generated script launches.
    #[serde(default)]
    pub browser: BrowserEngine,
    /// Overrides the per-flavor default (headed for plain scripts, headless for tests).
    #[serde(default)]
    pub headless: Option<bool>,
    #[serde(default)]
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default = "default_viewport_width")]
    pub width: u32,
    #[serde(default = "default_viewport_height")]
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromiumConfig {
    /// Browser binary; the `CHROME_BIN` environment variable takes precedence.
    #[serde(default)]
    pub executable: Option<PathBuf>,
    #[serde(default = "default_no_sandbox")]
    pub no_sandbox: bool,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            executable: None,
            no_sandbox: default_no_sandbox(),
        }
    }
}

fn default_no_sandbox() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// geckodriver endpoint used for `firefox` sessions.
    #[serde(default = "default_firefox_url")]
    pub firefox_url: String,
    /// External WPEWebDriver endpoint for `webkit`; when unset one is launched locally.
    #[serde(default)]
    pub webkit_url: Option<String>,
    #[serde(default = "default_webkit_port")]
    pub webkit_port: u16,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            firefox_url: default_firefox_url(),
            webkit_url: None,
            webkit_port: default_webkit_port(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_firefox_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_webkit_port() -> u16 {
    8080
}

fn default_poll_interval_ms() -> u64 {
    250
}
