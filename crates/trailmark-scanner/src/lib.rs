/// In-page capture hook. Backends inject it into every document of a recording
/// session; it reports clicks and (debounced) input changes as JSON payloads.
pub const CAPTURE_JS: &str = include_str!("capture.js");

/// Name of the CDP binding the hook calls when one is installed.
pub const BINDING_NAME: &str = "__trailmarkEmit";

/// Script that returns and clears the hook's queued payloads, or `null` if the
/// hook is not installed in the current document. Used by polling backends.
pub const DRAIN_JS: &str =
    "return window.__trailmark ? window.__trailmark.drain() : null;";
