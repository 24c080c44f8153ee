use trailmark_e::backend::WebDriverBackend;
use trailmark_engine::backend::{Backend, BackendError, BackendFactory};
use trailmark_engine::common::BrowserEngine;
use trailmark_engine::config::schema::TrailmarkConfig;
use trailmark_h::backend::HeadlessBackend;

/// Chromium over CDP, Firefox and WebKit over WebDriver.
pub struct DefaultBackendFactory {
    config: TrailmarkConfig,
}

impl DefaultBackendFactory {
    pub fn new(config: TrailmarkConfig) -> Self {
        Self { config }
    }
}

impl BackendFactory for DefaultBackendFactory {
    fn create(
        &self,
        engine: BrowserEngine,
        headless: bool,
    ) -> Result<Box<dyn Backend>, BackendError> {
        match engine {
            BrowserEngine::Chromium => Ok(Box::new(HeadlessBackend::with_config(
                headless,
                self.config.chromium.clone(),
            ))),
            BrowserEngine::Firefox | BrowserEngine::Webkit => Ok(Box::new(WebDriverBackend::new(
                engine,
                headless,
                self.config.webdriver.clone(),
            )?)),
        }
    }
}
