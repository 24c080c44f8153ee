#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use trailmark_engine::backend::{
    Backend, BackendError, BackendFactory, CapturedEvent, EventSink, NavigationResult,
};
use trailmark_engine::common::{BrowserEngine, ElementSnapshot, PageEvent};

/// Shared view of what the mock browser saw, kept by the test after the
/// backend has been handed to the recorder.
#[derive(Default)]
pub struct MockState {
    pub sink: Mutex<Option<EventSink>>,
    pub navigations: Mutex<Vec<String>>,
    pub engines: Mutex<Vec<BrowserEngine>>,
    /// What a screenshot of the page would show right now.
    pub page: Mutex<String>,
    pub fail_launch: AtomicBool,
    pub fail_navigation: AtomicBool,
    pub fail_screenshot: AtomicBool,
    /// Emit a main-frame navigation while loading the base URL, as a real page does.
    pub emit_bootstrap: AtomicBool,
    /// Deliver that navigation from a separate task, after `navigate` has returned.
    pub delay_bootstrap: AtomicBool,
    pub bootstrap_sent: Notify,
    pub screenshots: AtomicUsize,
    pub closes: AtomicUsize,
}

impl MockState {
    /// Deliver `event` the way a backend does: screenshot first, then emit.
    pub fn fire(&self, event: PageEvent) {
        let captured = if !CapturedEvent::wants_screenshot(&event) {
            CapturedEvent::uncaptured(event)
        } else if self.fail_screenshot.load(Ordering::SeqCst) {
            CapturedEvent::new(event, Err(BackendError::Screenshot("target closed".into())))
        } else {
            self.screenshots.fetch_add(1, Ordering::SeqCst);
            let png = self.page.lock().unwrap().clone().into_bytes();
            CapturedEvent::new(event, Ok(png))
        };
        let sink = self.sink.lock().unwrap().clone().expect("listeners attached");
        assert!(sink.emit(captured), "session is no longer listening");
    }

    pub fn set_page(&self, content: &str) {
        *self.page.lock().unwrap() = content.to_string();
    }

    pub fn navigate_to(&self, url: &str) {
        self.fire(PageEvent::FrameNavigated {
            url: url.to_string(),
            main_frame: true,
        });
    }

    pub fn click(&self, url: &str, target: ElementSnapshot) {
        self.fire(PageEvent::Click {
            url: url.to_string(),
            target,
        });
    }

    pub fn input(&self, url: &str, target: ElementSnapshot, value: &str) {
        self.fire(PageEvent::Input {
            url: url.to_string(),
            target,
            value: value.to_string(),
        });
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    state: Arc<MockState>,
    ready: bool,
}

#[async_trait]
impl Backend for MockBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        if self.state.fail_launch.load(Ordering::SeqCst) {
            return Err(BackendError::Launch("no browser binary".into()));
        }
        self.ready = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if self.ready {
            self.ready = false;
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.ready
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        if self.state.fail_navigation.load(Ordering::SeqCst) {
            return Err(BackendError::Navigation(format!(
                "net::ERR_NAME_NOT_RESOLVED at {}",
                url
            )));
        }
        self.state.navigations.lock().unwrap().push(url.to_string());
        if self.state.emit_bootstrap.load(Ordering::SeqCst) {
            if self.state.delay_bootstrap.load(Ordering::SeqCst) {
                let state = Arc::clone(&self.state);
                let url = url.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    state.navigate_to(&url);
                    state.bootstrap_sent.notify_one();
                });
            } else {
                self.state.navigate_to(url);
            }
        }
        Ok(NavigationResult {
            url: url.to_string(),
            title: "Mock".to_string(),
        })
    }

    async fn attach(&mut self, sink: EventSink) -> Result<(), BackendError> {
        *self.state.sink.lock().unwrap() = Some(sink);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MockFactory {
    pub state: Arc<MockState>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackendFactory for MockFactory {
    fn create(
        &self,
        engine: BrowserEngine,
        _headless: bool,
    ) -> Result<Box<dyn Backend>, BackendError> {
        self.state.engines.lock().unwrap().push(engine);
        Ok(Box::new(MockBackend {
            state: Arc::clone(&self.state),
            ready: false,
        }))
    }
}

pub fn element(tag: &str) -> ElementSnapshot {
    ElementSnapshot::with_tag(tag)
}
