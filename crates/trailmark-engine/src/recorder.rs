//! Action recording.
//!
//! A session runs as one consumer task fed by a single queue. The backend pushes
//! page events into that queue; `stop` pushes a stop message into the same queue.
//! Every event fired before the stop request is therefore handled, in arrival
//! order, before the browser is released, and no two events are ever handled at
//! the same time for one page.
//!
//! Screenshots are taken by the backend as it receives each event, ahead of
//! anything the page does next; the session only numbers and stores them.

use crate::backend::{Backend, BackendFactory, CapturedEvent, EventSink};
use crate::session::{RecordingSession, SessionId, StartRequest};
use crate::store::{ActionLogStore, StoreError};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trailmark_common::engine::UnknownEngine;
use trailmark_common::{
    Action, ActionKind, BackendError, BrowserEngine, PageEvent, SelectorResolver,
};

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Base URL must not be empty")]
    InvalidBaseUrl,
    #[error("Unsupported browser engine: {0}")]
    UnsupportedEngine(String),
    #[error("Browser launch failed: {0}")]
    Launch(BackendError),
    #[error("Navigation error: {0}")]
    Navigation(BackendError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<UnknownEngine> for RecorderError {
    fn from(err: UnknownEngine) -> Self {
        RecorderError::UnsupportedEngine(err.0)
    }
}

/// Result of stopping a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopSummary {
    pub recording_id: SessionId,
    pub actions_count: usize,
    pub actions_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Recording,
    /// Browser released, log not yet persisted (a previous stop failed to write it).
    Stopping,
    Stopped,
}

enum SessionMessage {
    Page(CapturedEvent),
    Stop(oneshot::Sender<()>),
}

/// The base-URL load a session opens with. Backends may deliver its main-frame
/// navigation after `navigate` has returned, so the first matching navigation is
/// dropped as long as nothing else has reached the session before it.
struct BootstrapLoad {
    urls: Vec<String>,
}

impl BootstrapLoad {
    fn matches(&self, event: &PageEvent) -> bool {
        match event {
            PageEvent::FrameNavigated {
                url,
                main_frame: true,
            } => self.urls.iter().any(|u| same_url(u, url)),
            _ => false,
        }
    }
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

enum Lifecycle {
    Recording {
        tx: mpsc::UnboundedSender<SessionMessage>,
        consumer: JoinHandle<()>,
    },
    Detached,
    Stopped(StopSummary),
}

pub struct Recorder {
    session: RecordingSession,
    store: ActionLogStore,
    log: Arc<Mutex<Vec<Action>>>,
    lifecycle: Mutex<Lifecycle>,
}

impl Recorder {
    /// Launch a browser, install the listeners and open `base_url`.
    ///
    /// On any failure the browser is closed again and no session exists.
    pub async fn start(
        request: StartRequest,
        factory: &dyn BackendFactory,
        store: ActionLogStore,
    ) -> Result<Self, RecorderError> {
        let base_url = request.base_url.trim().to_string();
        if base_url.is_empty() {
            return Err(RecorderError::InvalidBaseUrl);
        }
        let engine: BrowserEngine = request.engine.parse()?;
        let id = SessionId::generate();

        info!("Starting recording {} ({}) at {}", id, engine, base_url);
        let mut backend = factory
            .create(engine, request.headless)
            .map_err(RecorderError::Launch)?;
        if let Err(e) = backend.launch().await {
            close_quietly(backend.as_mut()).await;
            return Err(RecorderError::Launch(e));
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let page_tx = tx.clone();
        let sink = EventSink::new(move |event| page_tx.send(SessionMessage::Page(event)).is_ok());
        if let Err(e) = backend.attach(sink).await {
            close_quietly(backend.as_mut()).await;
            return Err(RecorderError::Launch(e));
        }

        let landed = match backend.navigate(&base_url).await {
            Ok(landed) => landed,
            Err(e) => {
                close_quietly(backend.as_mut()).await;
                return Err(RecorderError::Navigation(e));
            }
        };
        info!("Opened {} ({:?})", landed.url, landed.title);

        // Whatever the page emitted while loading the base URL predates the session.
        let mut bootstrap = Some(BootstrapLoad {
            urls: vec![base_url.clone(), landed.url],
        });
        let mut discarded = 0;
        while let Ok(message) = rx.try_recv() {
            if let SessionMessage::Page(captured) = &message
                && bootstrap.as_ref().is_some_and(|load| load.matches(&captured.event))
            {
                bootstrap = None;
            }
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} bootstrap event(s) for {}", discarded, id);
        }

        let output_dir = match store.create_session_dir(&id).await {
            Ok(dir) => dir,
            Err(e) => {
                close_quietly(backend.as_mut()).await;
                return Err(e.into());
            }
        };

        let log = Arc::new(Mutex::new(Vec::new()));
        let consumer = tokio::spawn(consume(
            rx,
            backend,
            output_dir.clone(),
            Arc::clone(&log),
            SelectorResolver::new(),
            bootstrap,
        ));

        info!("Recording {} started", id);
        Ok(Self {
            session: RecordingSession {
                id,
                base_url,
                engine,
                headless: request.headless,
                output_dir,
                started_at: Local::now(),
            },
            store,
            log,
            lifecycle: Mutex::new(Lifecycle::Recording { tx, consumer }),
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub async fn state(&self) -> SessionState {
        match &*self.lifecycle.lock().await {
            Lifecycle::Recording { .. } => SessionState::Recording,
            Lifecycle::Detached => SessionState::Stopping,
            Lifecycle::Stopped(_) => SessionState::Stopped,
        }
    }

    /// Snapshot of the actions recorded so far.
    pub async fn actions(&self) -> Vec<Action> {
        self.log.lock().await.clone()
    }

    pub async fn action_count(&self) -> usize {
        self.log.lock().await.len()
    }

    /// Finish the session: handle every event already queued, close the browser
    /// and write the log. Calling it again returns the first call's summary.
    pub async fn stop(&self) -> Result<StopSummary, RecorderError> {
        let mut lifecycle = self.lifecycle.lock().await;

        match std::mem::replace(&mut *lifecycle, Lifecycle::Detached) {
            Lifecycle::Stopped(summary) => {
                *lifecycle = Lifecycle::Stopped(summary.clone());
                return Ok(summary);
            }
            Lifecycle::Recording { tx, consumer } => {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(SessionMessage::Stop(done_tx)).is_ok() {
                    let _ = done_rx.await;
                }
                if let Err(e) = consumer.await {
                    warn!("Recording task for {} ended abnormally: {}", self.id(), e);
                }
            }
            Lifecycle::Detached => {}
        }

        let actions = self.log.lock().await.clone();
        let actions_file = self.store.write(self.id(), &actions).await?;
        let summary = StopSummary {
            recording_id: self.id().clone(),
            actions_count: actions.len(),
            actions_file,
        };

        info!(
            "Recording {} stopped: {} action(s) written to {}",
            summary.recording_id,
            summary.actions_count,
            summary.actions_file.display()
        );
        *lifecycle = Lifecycle::Stopped(summary.clone());
        Ok(summary)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        // Listener tasks hold their own senders, so the consumer only exits when told to.
        if let Lifecycle::Recording { tx, .. } = self.lifecycle.get_mut() {
            let (done_tx, _) = oneshot::channel();
            let _ = tx.send(SessionMessage::Stop(done_tx));
        }
    }
}

async fn consume(
    mut rx: mpsc::UnboundedReceiver<SessionMessage>,
    mut backend: Box<dyn Backend>,
    output_dir: PathBuf,
    log: Arc<Mutex<Vec<Action>>>,
    resolver: SelectorResolver,
    mut bootstrap: Option<BootstrapLoad>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            SessionMessage::Page(captured) => {
                if let Some(load) = &bootstrap {
                    if load.matches(&captured.event) {
                        debug!("Dropping late bootstrap navigation to {}", captured.event.url());
                        bootstrap = None;
                        continue;
                    }
                    if CapturedEvent::wants_screenshot(&captured.event) {
                        bootstrap = None;
                    }
                }
                record_event(&output_dir, &log, &resolver, captured).await;
            }
            SessionMessage::Stop(done) => {
                close_quietly(backend.as_mut()).await;
                let _ = done.send(());
                return;
            }
        }
    }
    close_quietly(backend.as_mut()).await;
}

async fn record_event(
    output_dir: &Path,
    log: &Mutex<Vec<Action>>,
    resolver: &SelectorResolver,
    captured: CapturedEvent,
) {
    let timestamp = now_seconds();
    let (url, kind) = match captured.event {
        PageEvent::FrameNavigated {
            url,
            main_frame: false,
        } => {
            debug!("Ignoring sub-frame navigation to {}", url);
            return;
        }
        PageEvent::FrameNavigated { url, .. } => (url, ActionKind::Navigation),
        PageEvent::Click { url, target } => (
            url,
            ActionKind::Click {
                selector: resolver.resolve(&target),
            },
        ),
        PageEvent::Input { url, target, value } => (
            url,
            ActionKind::Input {
                selector: resolver.resolve(&target),
                value,
            },
        ),
    };

    let mut actions = log.lock().await;
    let index = actions.len();
    let screenshot = match captured.screenshot {
        Ok(png) => {
            let path = output_dir.join(format!("step_{}.png", index));
            match tokio::fs::write(&path, png).await {
                Ok(()) => path.to_string_lossy().into_owned(),
                Err(e) => {
                    warn!("Writing screenshot for step {} failed: {}", index, e);
                    String::new()
                }
            }
        }
        Err(e) => {
            warn!("Screenshot for step {} failed: {}", index, e);
            String::new()
        }
    };

    debug!("Step {}: {} {}", index, kind.name(), url);
    actions.push(Action {
        kind,
        timestamp,
        url,
        screenshot,
    });
}

async fn close_quietly(backend: &mut dyn Backend) {
    if let Err(e) = backend.close().await {
        warn!("Error closing browser: {}", e);
    }
}

fn now_seconds() -> f64 {
    Local::now().timestamp_millis() as f64 / 1000.0
}
