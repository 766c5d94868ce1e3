//! Event dispatch table and stream line decoding.
//!
//! The events API pushes a `multipart/x-mixed-replace` body. Each part is a
//! handful of CRLF-terminated lines: the boundary, a `Content-Type:
//! text/plain` echo, a blank line, and one `name:value` event such as
//! `doorbell:H` or `motionsensor:L`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::Error;

/// Value the device sends when an input returns to idle.
pub const LOW_SIGNAL: &str = "L";

const CONTENT_TYPE_ECHO: &str = "Content-Type: text/plain";
const MULTIPART_PREFIX: &str = "multipart/x-mixed-replace; boundary=";

/// Zero-argument event callback.
pub type Handler = Arc<dyn Fn() + Send + Sync>;

// ── Dispatch table ──────────────────────────────────────────────────

/// Event name → handler mapping shared between a session and its monitor.
///
/// Cheaply cloneable; all clones see the same table. The monitor only
/// reads. Handlers must be registered before the events they should see
/// arrive -- the table does not replay.
#[derive(Clone, Default)]
pub struct EventHandlers {
    inner: Arc<RwLock<HashMap<String, Handler>>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `name`.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.write().insert(name.into(), Arc::new(handler));
    }

    /// Remove the handler for `name`, returning whether one was registered.
    pub fn remove(&self, name: &str) -> bool {
        self.inner.write().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// Look up a handler. The lock is released before the caller invokes it.
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.inner.read().get(name).cloned()
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.read();
        let mut names: Vec<_> = guard.keys().collect();
        names.sort();
        f.debug_struct("EventHandlers").field("events", &names).finish()
    }
}

// ── Boundary discovery ──────────────────────────────────────────────

/// Extract the boundary token from a `Content-Type` header.
///
/// The header must begin with exactly `multipart/x-mixed-replace;
/// boundary=`; everything after that is the token (e.g. `--ioboundary`).
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    content_type.strip_prefix(MULTIPART_PREFIX)
}

// ── Line decoding ───────────────────────────────────────────────────

/// Classification of one stream line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Blank line, boundary, or content-type echo.
    Noise,
    /// An event whose value is the low-signal token.
    Idle { name: &'a str },
    /// A dispatchable event.
    Event { name: &'a str, value: &'a str },
    /// Not `name:value`.
    Unrecognized,
}

/// Classify a single line. Splits on the last colon, so the name may
/// itself contain colons but the value never does.
pub fn decode_line<'a>(line: &'a str, boundary: &str) -> Frame<'a> {
    if line.is_empty() || line == boundary || line.eq_ignore_ascii_case(CONTENT_TYPE_ECHO) {
        return Frame::Noise;
    }

    match line.rsplit_once(':') {
        Some((name, _)) if name.is_empty() => Frame::Unrecognized,
        Some((name, LOW_SIGNAL)) => Frame::Idle { name },
        Some((name, value)) => Frame::Event { name, value },
        None => Frame::Unrecognized,
    }
}

/// Decode one body chunk and invoke handlers in line order.
///
/// Chunks are decoded independently; a line split across two chunks is
/// seen as two fragments. Returns the number of handlers invoked.
pub fn dispatch_chunk(device: &str, chunk: &[u8], boundary: &str, handlers: &EventHandlers) -> usize {
    let text = String::from_utf8_lossy(chunk);
    let mut dispatched = 0;

    for line in text.split("\r\n") {
        match decode_line(line, boundary) {
            Frame::Noise | Frame::Idle { .. } => {}
            Frame::Unrecognized => {
                let err = Error::UnrecognizedStreamFrame { line: line.to_owned() };
                warn!(device, "{err}.");
            }
            Frame::Event { name, value } => match handlers.get(name) {
                Some(handler) => {
                    info!(device, event = name, value, "event received");
                    handler();
                    dispatched += 1;
                }
                None => {
                    info!(device, "Unhandled event captured: {name}.");
                }
            },
        }
    }

    dispatched
}
