//! Event stream monitor with heartbeat watchdog and self-healing reconnect.
//!
//! One background task per device session drives the state machine
//!
//! ```text
//! Idle → Connecting → Streaming → Reconnecting ─(cooldown)→ Connecting …
//! ```
//!
//! The device never sends explicit pings: any body chunk counts as a
//! heartbeat. If nothing arrives for `heartbeat_interval`, the watchdog
//! logs the loss, cancels the attempt's token, drops the body (tearing down
//! the socket), sleeps `reboot_cooldown` so a rebooting device is not
//! hammered, and connects again.
//!
//! Failures *before* the stream starts (transport error, non-2xx, bad
//! content type) follow [`ConnectFailurePolicy`]. Under the default
//! `GiveUp` the monitor logs and stops.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConnectFailurePolicy, Timing};
use crate::error::Error;
use crate::events::{EventHandlers, dispatch_chunk, extract_boundary};
use crate::request::{check_status, classify, failure_message, redact};

// ── State ────────────────────────────────────────────────────────────

/// Lifecycle state of the monitor, observable through [`MonitorHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not running: never started, gave up, or shut down.
    Idle,
    Connecting,
    Streaming,
    /// Waiting out the reboot cooldown before the next attempt.
    Reconnecting,
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub connection_attempts: u64,
    pub heartbeat_losses: u64,
}

#[derive(Debug, Default)]
struct Counters {
    connection_attempts: AtomicU64,
    heartbeat_losses: AtomicU64,
}

// ── Handle ───────────────────────────────────────────────────────────

/// Handle to a running monitor task. Dropping it stops the monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    state: watch::Receiver<MonitorState>,
    counters: Arc<Counters>,
    cancel: CancellationToken,
}

impl MonitorHandle {
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            connection_attempts: self.counters.connection_attempts.load(Ordering::SeqCst),
            heartbeat_losses: self.counters.heartbeat_losses.load(Ordering::SeqCst),
        }
    }

    /// Signal the monitor to stop at its next suspension point.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Spawning ─────────────────────────────────────────────────────────

/// Everything the monitor task needs, captured at spawn time.
pub(crate) struct MonitorConfig {
    pub http: reqwest::Client,
    /// Fully credentialed events URL.
    pub url: String,
    /// Label for log lines.
    pub device: String,
    pub handlers: EventHandlers,
    pub timing: Timing,
    pub policy: ConnectFailurePolicy,
}

/// Spawn the monitor loop. `cancel` stops it; attempts use child tokens.
pub(crate) fn spawn(config: MonitorConfig, cancel: CancellationToken) -> MonitorHandle {
    let (state_tx, state_rx) = watch::channel(MonitorState::Idle);
    let counters = Arc::new(Counters::default());

    let monitor = Monitor {
        config,
        state: state_tx,
        counters: Arc::clone(&counters),
    };

    let task_cancel = cancel.clone();
    tokio::spawn(async move { monitor.run(task_cancel).await });

    MonitorHandle {
        state: state_rx,
        counters,
        cancel,
    }
}

// ── Monitor loop ─────────────────────────────────────────────────────

struct Monitor {
    config: MonitorConfig,
    state: watch::Sender<MonitorState>,
    counters: Arc<Counters>,
}

impl Monitor {
    async fn run(self, shutdown: CancellationToken) {
        let device = self.config.device.as_str();

        loop {
            self.set_state(MonitorState::Connecting);
            self.counters.connection_attempts.fetch_add(1, Ordering::SeqCst);
            let attempt = shutdown.child_token();

            let opened = tokio::select! {
                biased;
                () = attempt.cancelled() => break,
                result = self.open() => result,
            };

            let (response, boundary) = match opened {
                Ok(opened) => opened,
                Err(err) => {
                    self.log_open_failure(&err);

                    if self.config.policy == ConnectFailurePolicy::RetryAfterCooldown
                        && !err.is_auth()
                    {
                        self.set_state(MonitorState::Reconnecting);
                        info!(
                            device,
                            cooldown_secs = self.config.timing.reboot_cooldown.as_secs(),
                            "retrying the events API after cooldown"
                        );
                        if self.cooldown(&shutdown).await {
                            continue;
                        }
                    }
                    break;
                }
            };

            self.set_state(MonitorState::Streaming);
            info!(device, "Connected to the Doorbird events API.");

            let mut body = Box::pin(response.bytes_stream());
            let end = watch_stream(
                device,
                &mut body,
                &boundary,
                &self.config.handlers,
                &self.config.timing,
                &attempt,
            )
            .await;
            drop(body);

            match end {
                StreamEnd::Shutdown => break,
                StreamEnd::Lost(err) => {
                    debug!(device, error = %err, "heartbeat lost");
                    self.counters.heartbeat_losses.fetch_add(1, Ordering::SeqCst);
                    self.set_state(MonitorState::Reconnecting);
                    if !self.cooldown(&shutdown).await {
                        break;
                    }
                }
            }
        }

        self.set_state(MonitorState::Idle);
        debug!(device, "event monitor exiting");
    }

    /// Issue the streaming GET and discover the multipart boundary.
    async fn open(&self) -> Result<(reqwest::Response, String), Error> {
        debug!(
            device = self.config.device.as_str(),
            url = redact(&self.config.url),
            "connecting to the events API"
        );

        let response = self
            .config
            .http
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| classify(&e, self.config.timing.response_timeout))?;
        let response = check_status(response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let boundary = extract_boundary(content_type)
            .ok_or_else(|| Error::MissingBoundary {
                content_type: content_type.to_owned(),
            })?
            .to_owned();

        Ok((response, boundary))
    }

    fn log_open_failure(&self, err: &Error) {
        let device = self.config.device.as_str();
        match err {
            Error::RequestFailed { status, .. } => {
                debug!(device, status, "events API rejected the connection");
            }
            Error::MissingBoundary { .. } => warn!(device, "{err}."),
            other => warn!(device, "Unable to connect to the Doorbird events API: {}", failure_message(other)),
        }
    }

    /// Sleep the reboot cooldown. Returns `false` if shut down meanwhile.
    async fn cooldown(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => false,
            () = tokio::time::sleep(self.config.timing.reboot_cooldown) => true,
        }
    }

    fn set_state(&self, state: MonitorState) {
        self.state.send_replace(state);
    }
}

// ── Streaming with watchdog ──────────────────────────────────────────

#[derive(Debug)]
pub(crate) enum StreamEnd {
    /// The attempt token was cancelled from outside.
    Shutdown,
    /// The watchdog fired with [`Error::HeartbeatLost`]. The attempt token
    /// has been cancelled.
    Lost(Error),
}

/// Consume `body` until the watchdog fires or the attempt is cancelled.
///
/// The watchdog is armed on entry and pushed out by every chunk. A body
/// that ends or errors just stops producing chunks, so the watchdog still
/// decides when the connection is lost.
pub(crate) async fn watch_stream<S, E>(
    device: &str,
    body: &mut S,
    boundary: &str,
    handlers: &EventHandlers,
    timing: &Timing,
    attempt: &CancellationToken,
) -> StreamEnd
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let heartbeat = timing.heartbeat_interval;
    let watchdog = tokio::time::sleep(heartbeat);
    tokio::pin!(watchdog);
    let mut open = true;

    loop {
        tokio::select! {
            biased;
            () = attempt.cancelled() => return StreamEnd::Shutdown,
            () = &mut watchdog => break,
            chunk = body.next(), if open => match chunk {
                Some(Ok(bytes)) => {
                    watchdog.as_mut().reset(Instant::now() + heartbeat);
                    dispatch_chunk(device, &bytes, boundary, handlers);
                }
                Some(Err(e)) => {
                    debug!(device, error = %e, "event stream read failed");
                    open = false;
                }
                None => {
                    debug!(device, "event stream closed by the device");
                    open = false;
                }
            },
        }
    }

    let minutes = timing.reboot_cooldown.as_secs_f64() / 60.0;
    warn!(
        device,
        "Connection to Doorbird events API has been lost. Reconnection attempt in {minutes} minutes."
    );

    attempt.cancel();
    StreamEnd::Lost(Error::HeartbeatLost { interval: heartbeat })
}
