use crate::cdp::CdpClient;
use crate::inject::{install_capture, spawn_listener};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::info;
use trailmark_engine::backend::{Backend, BackendError, EventSink, NavigationResult};
use trailmark_engine::config::schema::ChromiumConfig;

pub struct HeadlessBackend {
    client: Option<CdpClient>,
    listener: Option<JoinHandle<()>>,
    headless: bool,
    config: ChromiumConfig,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_config(true, ChromiumConfig::default())
    }

    pub fn with_config(headless: bool, config: ChromiumConfig) -> Self {
        Self {
            client: None,
            listener: None,
            headless,
            config,
        }
    }

    async fn get_navigation_result(
        page: &chromiumoxide::Page,
    ) -> Result<NavigationResult, BackendError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        let client = CdpClient::launch(self.headless, &self.config)
            .await
            .map_err(|e| BackendError::Launch(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;

        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(&client.page).await
    }

    async fn attach(&mut self, sink: EventSink) -> Result<(), BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;

        // Subscribe first so nothing the hook sends on installation is missed.
        let listener = spawn_listener(&client.page, sink)
            .await
            .map_err(|e| BackendError::Script(e.to_string()))?;
        if let Err(e) = install_capture(&client.page).await {
            listener.abort();
            return Err(BackendError::Script(e.to_string()));
        }

        if let Some(previous) = self.listener.replace(listener) {
            previous.abort();
        }
        info!("Capture hook attached");
        Ok(())
    }
}
