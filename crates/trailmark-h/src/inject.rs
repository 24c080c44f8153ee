use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, EventFrameNavigated,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled};
use futures::StreamExt;
use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use trailmark_engine::backend::{BackendError, CapturedEvent, EventSink};
use trailmark_engine::common::PageEvent;
use trailmark_scanner::{BINDING_NAME, CAPTURE_JS};

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Retry an async operation that may fail due to context errors during page navigation.
async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, Box<dyn Error + Send + Sync>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if is_context_error(&err_str) {
                    tracing::debug!(
                        "{} context error (attempt {}/{}), retrying...",
                        operation_name,
                        attempt + 1,
                        MAX_CONTEXT_RETRIES
                    );
                    last_error = Some(err_str);
                    tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
                    continue;
                }
                return Err(err_str.into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| format!("{} failed after retries", operation_name))
        .into())
}

/// Install the capture hook: a binding the hook reports through, the hook itself
/// for every future document, and the hook in the document already loaded.
pub async fn install_capture(page: &Page) -> Result<(), Box<dyn Error + Send + Sync>> {
    page.execute(AddBindingParams::new(BINDING_NAME))
        .await
        .map_err(|e| format!("Failed to add binding: {}", e))?;

    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(CAPTURE_JS))
        .await
        .map_err(|e| format!("Failed to register capture hook: {}", e))?;

    retry_on_context_error("Capture hook injection", || page.evaluate(CAPTURE_JS)).await?;
    Ok(())
}

enum Incoming {
    Binding(String),
    Navigated { url: String, main_frame: bool },
}

/// Full-page screenshot of what `page` shows right now.
async fn capture(page: &Page) -> Result<Vec<u8>, BackendError> {
    page.screenshot(ScreenshotParams::builder().full_page(true).build())
        .await
        .map_err(|e| BackendError::Screenshot(e.to_string()))
}

/// Forward binding calls and frame navigations to `sink`, each with a screenshot
/// taken as soon as the event arrives, until the sink stops listening or the
/// page goes away.
///
/// Each stream keeps the browser's order. Between the two, `select` alternates
/// when both have items ready, so a click and a navigation delivered in the same
/// instant may swap places.
pub async fn spawn_listener(
    page: &Page,
    sink: EventSink,
) -> Result<JoinHandle<()>, Box<dyn Error + Send + Sync>> {
    let bindings = page
        .event_listener::<EventBindingCalled>()
        .await
        .map_err(|e| format!("Failed to subscribe to binding calls: {}", e))?
        .filter(|event| futures::future::ready(event.name == BINDING_NAME))
        .map(|event| Incoming::Binding(event.payload.clone()));

    let navigations = page
        .event_listener::<EventFrameNavigated>()
        .await
        .map_err(|e| format!("Failed to subscribe to frame navigation: {}", e))?
        .map(|event| Incoming::Navigated {
            url: event.frame.url.clone(),
            main_frame: event.frame.parent_id.is_none(),
        });

    let mut incoming = Box::pin(futures::stream::select(bindings, navigations));
    let page = page.clone();

    Ok(tokio::spawn(async move {
        while let Some(item) = incoming.next().await {
            let event = match item {
                Incoming::Binding(payload) => match PageEvent::from_payload(&payload) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Dropping malformed capture payload: {}", e);
                        continue;
                    }
                },
                Incoming::Navigated { url, main_frame } => {
                    PageEvent::FrameNavigated { url, main_frame }
                }
            };
            let captured = if CapturedEvent::wants_screenshot(&event) {
                let screenshot = capture(&page).await;
                CapturedEvent::new(event, screenshot)
            } else {
                CapturedEvent::uncaptured(event)
            };
            if !sink.emit(captured) {
                break;
            }
        }
        tracing::debug!("Capture listener ended");
    }))
}
