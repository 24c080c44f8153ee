use serial_test::serial;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use trailmark_engine::backend::{Backend, CapturedEvent, EventSink};
use trailmark_engine::common::PageEvent;
use trailmark_h::backend::HeadlessBackend;

const PAGE: &str = "<html><head><title>Capture</title></head><body>\
<div><button id='btn'>Go</button></div>\
<div><span class='tag hot'>x</span><span>y</span></div>\
<input id='name'>\
<script>setTimeout(() => { \
document.getElementById('btn').click(); \
document.querySelector('span.tag').click(); \
const el = document.getElementById('name'); el.focus(); el.value = 'ada'; \
el.dispatchEvent(new Event('input', { bubbles: true })); el.blur(); \
}, 300);</script></body></html>";

async fn next_event(rx: &mut UnboundedReceiver<CapturedEvent>) -> CapturedEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for a page event")
        .expect("event channel closed")
}

/// Skip events until one matching `pred` shows up.
async fn wait_for(
    rx: &mut UnboundedReceiver<CapturedEvent>,
    pred: impl Fn(&PageEvent) -> bool,
) -> CapturedEvent {
    loop {
        let captured = next_event(rx).await;
        if pred(&captured.event) {
            return captured;
        }
    }
}

async fn launched() -> Option<HeadlessBackend> {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();

    let mut backend = HeadlessBackend::new();
    match backend.launch().await {
        Ok(()) => Some(backend),
        Err(e) => {
            eprintln!("Failed to launch browser (is Chromium installed?): {}", e);
            None
        }
    }
}

#[tokio::test]
#[serial]
async fn test_clicks_and_inputs_are_captured() {
    let Some(mut backend) = launched().await else {
        return;
    };

    let (sink, mut rx) = EventSink::channel();
    backend.attach(sink).await.expect("attach failed");

    let url = format!("data:text/html,{}", PAGE);
    let nav = backend.navigate(&url).await.expect("Navigation failed");
    assert_eq!(nav.title, "Capture");

    let navigated = wait_for(&mut rx, |e| matches!(e, PageEvent::FrameNavigated { .. })).await;
    assert!(matches!(navigated.event, PageEvent::FrameNavigated { main_frame: true, .. }));

    let first = wait_for(&mut rx, |e| matches!(e, PageEvent::Click { .. })).await;
    match first.event {
        PageEvent::Click { target, .. } => {
            assert_eq!(target.id.as_deref(), Some("btn"));
            assert_eq!(target.tag, "button");
        }
        other => panic!("unexpected event {:?}", other),
    }
    let png = first.screenshot.expect("click screenshot failed");
    assert_eq!(&png[1..4], b"PNG");

    match wait_for(&mut rx, |e| matches!(e, PageEvent::Click { .. })).await.event {
        PageEvent::Click { target, .. } => {
            assert_eq!(target.id, None);
            assert_eq!(target.class.as_deref(), Some("tag hot"));
            let tags: Vec<_> = target.path.iter().map(|s| s.tag.as_str()).collect();
            assert_eq!(tags, ["html", "body", "div", "span"]);
            assert_eq!(target.path[2].position, 2);
            assert_eq!(target.path[3].siblings, 2);
        }
        other => panic!("unexpected event {:?}", other),
    }

    match wait_for(&mut rx, |e| matches!(e, PageEvent::Input { .. })).await.event {
        PageEvent::Input { target, value, .. } => {
            assert_eq!(target.id.as_deref(), Some("name"));
            assert_eq!(value, "ada");
        }
        other => panic!("unexpected event {:?}", other),
    }

    backend.close().await.expect("close failed");
    backend.close().await.expect("second close failed");
    assert!(!backend.is_ready().await);
}
