//! WebDriver offers no push channel for page events, so the capture hook queues
//! payloads in the page and a poll task drains them. The same task watches the
//! top-level URL to report navigations.
//!
//! Screenshots are taken right after a drain, so they show the page as of the
//! poll that picked the events up. Every event of one batch shares that shot.

use crate::cog::{self, CogProcess};
use crate::webdriver::{WebDriverClient, firefox_capabilities};
use async_trait::async_trait;
use fantoccini::Client;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trailmark_engine::backend::{
    Backend, BackendError, CapturedEvent, EventSink, NavigationResult,
};
use trailmark_engine::common::{BrowserEngine, PageEvent};
use trailmark_engine::config::schema::WebDriverConfig;
use trailmark_scanner::{CAPTURE_JS, DRAIN_JS};

pub struct WebDriverBackend {
    engine: BrowserEngine,
    headless: bool,
    config: WebDriverConfig,
    client: Option<WebDriverClient>,
    cog_process: Option<CogProcess>,
    poller: Option<JoinHandle<()>>,
    last_url: Arc<Mutex<String>>,
}

impl WebDriverBackend {
    /// Backend for `firefox` (geckodriver) or `webkit` (WPEWebDriver).
    pub fn new(
        engine: BrowserEngine,
        headless: bool,
        config: WebDriverConfig,
    ) -> Result<Self, BackendError> {
        if engine == BrowserEngine::Chromium {
            return Err(BackendError::NotSupported(
                "chromium is driven over CDP, not WebDriver".into(),
            ));
        }
        Ok(Self {
            engine,
            headless,
            config,
            client: None,
            cog_process: None,
            poller: None,
            last_url: Arc::new(Mutex::new(String::new())),
        })
    }

    fn client(&self) -> Result<&Client, BackendError> {
        self.client
            .as_ref()
            .map(|c| &c.client)
            .ok_or(BackendError::NotReady)
    }

    async fn connect_target(
        &mut self,
    ) -> Result<(String, serde_json::Map<String, Value>), BackendError> {
        match self.engine {
            BrowserEngine::Firefox => {
                info!("Connecting to geckodriver at {}...", self.config.firefox_url);
                Ok((
                    self.config.firefox_url.clone(),
                    firefox_capabilities(self.headless),
                ))
            }
            BrowserEngine::Webkit => {
                if let Some(url) = &self.config.webkit_url {
                    info!("Connecting to external WebDriver at {}...", url);
                    return Ok((url.clone(), cog::wpe_capabilities()));
                }
                info!(
                    "Launching WPEWebDriver for COG browser on port {}...",
                    self.config.webkit_port
                );
                let cog = cog::launch_cog(self.config.webkit_port, self.headless)
                    .await
                    .map_err(BackendError::Launch)?;
                let url = cog.webdriver_url();
                self.cog_process = Some(cog);
                Ok((url, cog::wpe_capabilities()))
            }
            BrowserEngine::Chromium => Err(BackendError::NotSupported(
                "chromium is driven over CDP, not WebDriver".into(),
            )),
        }
    }
}

#[async_trait]
impl Backend for WebDriverBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        let (url, capabilities) = self.connect_target().await?;
        let client = WebDriverClient::connect(&url, Some(capabilities))
            .await
            .map_err(|e| BackendError::Launch(e.to_string()))?;
        self.client = Some(client);
        info!("{} session started", self.engine);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        let result = match self.client.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string())),
            None => Ok(()),
        };
        // Dropping the handle stops WPEWebDriver.
        self.cog_process = None;
        result
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client()?;

        info!("Navigating to: {}", url);
        client
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        let title = client.title().await.unwrap_or_default();
        let current = client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        if let Ok(mut last) = self.last_url.lock() {
            *last = current.clone();
        }
        Ok(NavigationResult {
            url: current,
            title,
        })
    }

    async fn attach(&mut self, sink: EventSink) -> Result<(), BackendError> {
        let client = self.client()?.clone();
        client
            .execute(CAPTURE_JS, vec![])
            .await
            .map_err(|e| BackendError::Script(e.to_string()))?;

        let interval = Duration::from_millis(self.config.poll_interval_ms.max(10));
        let poller = tokio::spawn(poll_events(
            client,
            sink,
            Arc::clone(&self.last_url),
            interval,
        ));
        if let Some(previous) = self.poller.replace(poller) {
            previous.abort();
        }
        info!("Capture hook attached (polling every {:?})", interval);
        Ok(())
    }
}

async fn poll_events(
    client: Client,
    sink: EventSink,
    last_url: Arc<Mutex<String>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        let mut payloads = drain(&client).await;
        if payloads.is_none() {
            // A new document without the hook: install it, then pick up whatever
            // the previous document handed over before unloading.
            if let Err(e) = client.execute(CAPTURE_JS, vec![]).await {
                debug!("Capture hook reinjection failed: {}", e);
                continue;
            }
            payloads = drain(&client).await;
        }

        let events: Vec<PageEvent> = payloads
            .unwrap_or_default()
            .iter()
            .filter_map(|payload| match PageEvent::from_payload(payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Dropping malformed capture payload: {}", e);
                    None
                }
            })
            .collect();
        if !events.is_empty() {
            let screenshot = capture(&client).await;
            for event in events {
                if !sink.emit(CapturedEvent::new(event, screenshot.clone())) {
                    return;
                }
            }
        }

        let Ok(current) = client.current_url().await else {
            continue;
        };
        let current = current.to_string();
        let changed = match last_url.lock() {
            Ok(mut last) if *last != current => {
                *last = current.clone();
                true
            }
            _ => false,
        };
        if changed {
            let event = PageEvent::FrameNavigated {
                url: current,
                main_frame: true,
            };
            if !sink.emit(CapturedEvent::new(event, capture(&client).await)) {
                return;
            }
        }
    }
}

/// Viewport screenshot; WebDriver has no full-page capture.
async fn capture(client: &Client) -> Result<Vec<u8>, BackendError> {
    client
        .screenshot()
        .await
        .map_err(|e| BackendError::Screenshot(e.to_string()))
}

/// Queued payloads, or `None` when the current document has no hook.
async fn drain(client: &Client) -> Option<Vec<String>> {
    match client.execute(DRAIN_JS, vec![]).await {
        Ok(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        Ok(Value::Null) => None,
        Ok(other) => {
            debug!("Unexpected drain result: {}", other);
            Some(Vec::new())
        }
        Err(e) => {
            debug!("Drain failed: {}", e);
            Some(Vec::new())
        }
    }
}
