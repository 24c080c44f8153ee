use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
pub use trailmark_common::BackendError;
use trailmark_common::{BrowserEngine, PageEvent};

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// A page event together with the screenshot the backend took on receiving it,
/// before handling anything the page did afterwards.
#[derive(Debug)]
pub struct CapturedEvent {
    pub event: PageEvent,
    /// PNG bytes. Sub-frame navigations are delivered without a capture.
    pub screenshot: Result<Vec<u8>, BackendError>,
}

impl CapturedEvent {
    pub fn new(event: PageEvent, screenshot: Result<Vec<u8>, BackendError>) -> Self {
        Self { event, screenshot }
    }

    /// Whether the event is worth a screenshot at all.
    pub fn wants_screenshot(event: &PageEvent) -> bool {
        !matches!(
            event,
            PageEvent::FrameNavigated {
                main_frame: false,
                ..
            }
        )
    }

    pub fn uncaptured(event: PageEvent) -> Self {
        Self::new(
            event,
            Err(BackendError::NotSupported("sub-frame navigation".into())),
        )
    }
}

/// Where a backend delivers captured page events.
///
/// Emitting is non-blocking; `emit` returns `false` once nobody is listening,
/// which is the backend's cue to stop its listener tasks.
#[derive(Clone)]
pub struct EventSink {
    emit: Arc<dyn Fn(CapturedEvent) -> bool + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(CapturedEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            emit: Arc::new(emit),
        }
    }

    /// A sink feeding a plain channel, for driving a backend without a recorder.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CapturedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(move |event| tx.send(event).is_ok()), rx)
    }

    pub fn emit(&self, event: CapturedEvent) -> bool {
        (self.emit)(event)
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// One browser process with one page, as used by a single recording session.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Start the browser (or connect to its driver) and open the page.
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Release the browser. Closing an already-closed backend is not an error.
    async fn close(&mut self) -> Result<(), BackendError>;

    async fn is_ready(&self) -> bool;

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// Install the click, input and frame-navigation listeners. Events fired from
    /// now on are delivered to `sink`, each with a screenshot taken as soon as the
    /// backend received it.
    async fn attach(&mut self, sink: EventSink) -> Result<(), BackendError>;
}

/// Creates a backend for the requested engine. Implemented by the binary that
/// links the concrete backend crates.
pub trait BackendFactory: Send + Sync {
    fn create(
        &self,
        engine: BrowserEngine,
        headless: bool,
    ) -> Result<Box<dyn Backend>, BackendError>;
}
