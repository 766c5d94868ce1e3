// Device session
//
// One `DoorbirdClient` per physical device. Owns the credentialed URL
// builder, the bounded request client, the event dispatch table, and at
// most one running event monitor. Command operations are independent of
// the monitor and can be called at any time.

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DeviceConfig;
use crate::error::Error;
use crate::events::EventHandlers;
use crate::label::device_label;
use crate::models::DeviceIdentity;
use crate::monitor::{self, MonitorConfig, MonitorHandle, MonitorState, MonitorStats};
use crate::request::{RequestClient, RequestOptions, classify, log_failure};
use crate::transport::TransportConfig;
use crate::urls::{INFO_PATH, LIGHT_ON_PATH, UrlBuilder};

/// Client for a single Doorbird device.
pub struct DoorbirdClient {
    config: DeviceConfig,
    urls: UrlBuilder,
    requests: RequestClient,
    identity: RwLock<Option<DeviceIdentity>>,
    handlers: EventHandlers,
    monitor: Mutex<Option<MonitorHandle>>,
    shutdown: CancellationToken,
}

impl DoorbirdClient {
    /// Build a client, constructing the HTTP transport from `config.tls`.
    pub fn new(config: DeviceConfig) -> Result<Self, Error> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            connect_timeout: config.timing.response_timeout,
        };
        let http = transport.build_client()?;
        Ok(Self::with_client(http, config))
    }

    /// Build a client around a pre-built `reqwest::Client`.
    ///
    /// The client must not carry an overall request timeout, or the event
    /// stream will be cut off by it.
    pub fn with_client(http: reqwest::Client, config: DeviceConfig) -> Self {
        let urls = UrlBuilder::new(&config.address, &config.credentials);
        Self {
            config,
            urls,
            requests: RequestClient::new(http),
            identity: RwLock::new(None),
            handlers: EventHandlers::new(),
            monitor: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// The event dispatch table. Register handlers here.
    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    /// Device identity from the last successful login.
    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.identity.read().clone()
    }

    /// Label used in log lines.
    pub fn label(&self) -> String {
        let identity = self.identity.read();
        device_label(
            self.config.name.as_deref(),
            identity.as_ref().and_then(|i| i.device_type.as_deref()),
            &self.config.address,
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Fetch the device identity without touching session state.
    ///
    /// `GET /bha-api/info.cgi`
    pub async fn identify(&self) -> Result<DeviceIdentity, Error> {
        let deadline = self.config.timing.response_timeout;
        let response = self
            .requests
            .execute(&self.urls.build_url(INFO_PATH), RequestOptions::get(), deadline)
            .await?;

        let body = tokio::time::timeout(deadline, response.bytes())
            .await
            .map_err(|_| Error::Timeout { timeout: deadline })?
            .map_err(|e| classify(&e, deadline))?;

        DeviceIdentity::from_info_json(&body)
    }

    /// Log in: fetch identity, store it, and start the event monitor.
    ///
    /// This is the only way the monitor starts. A previous monitor for
    /// this session is stopped first.
    pub async fn login(&self) -> bool {
        let identity = match self.identify().await {
            Ok(identity) => identity,
            Err(err) => {
                let device = self.label();
                if let Error::MalformedBody { message } = &err {
                    warn!(
                        device,
                        error = message.as_str(),
                        "Unable to parse the device information retrieved from the Doorbird."
                    );
                } else {
                    log_failure(&device, &err, false);
                }
                warn!(device, "Unable to retrieve device information from the Doorbird.");
                return false;
            }
        };

        info!(
            device = self.label(),
            mac = identity.mac.as_deref().unwrap_or("unknown"),
            firmware = identity.firmware.as_deref().unwrap_or("unknown"),
            relays = identity.relays.len(),
            "device information retrieved"
        );
        *self.identity.write() = Some(identity);

        self.start_monitor();
        true
    }

    /// Turn on the night-vision light.
    ///
    /// `GET /bha-api/light-on.cgi`
    pub async fn activate_auxiliary_feature(&self) -> bool {
        let device = self.label();
        let url = self.urls.build_url(LIGHT_ON_PATH);

        if self
            .requests
            .send(&device, &url, RequestOptions::get(), self.config.timing.response_timeout)
            .await
            .is_none()
        {
            warn!(device, "Unable to activate night vision on the Doorbird.");
            return false;
        }

        true
    }

    /// Energize one relay. `relay` is not checked against the identity's
    /// relay list; the device rejects unknown ids.
    ///
    /// `GET /bha-api/open-door.cgi?r={relay}`
    pub async fn trigger_actuator(&self, relay: &str) -> bool {
        let device = self.label();
        let url = self.urls.open_door_url(relay);

        if self
            .requests
            .send(&device, &url, RequestOptions::get(), self.config.timing.response_timeout)
            .await
            .is_none()
        {
            warn!(device, relay, "Unable to unlock relay {relay} on the Doorbird.");
            return false;
        }

        true
    }

    // ── Monitor ──────────────────────────────────────────────────────

    fn start_monitor(&self) {
        let mut slot = self.monitor.lock();
        if let Some(previous) = slot.take() {
            previous.shutdown();
        }

        let config = MonitorConfig {
            http: self.requests.http().clone(),
            url: self.urls.events_url(),
            device: self.label(),
            handlers: self.handlers.clone(),
            timing: self.config.timing,
            policy: self.config.connect_failure,
        };
        *slot = Some(monitor::spawn(config, self.shutdown.child_token()));
    }

    /// Current monitor state; `Idle` if it was never started.
    pub fn monitor_state(&self) -> MonitorState {
        self.monitor.lock().as_ref().map_or(MonitorState::Idle, MonitorHandle::state)
    }

    /// Counters of the current monitor, if one was started.
    pub fn monitor_stats(&self) -> Option<MonitorStats> {
        self.monitor.lock().as_ref().map(MonitorHandle::stats)
    }

    /// Watch channel for the current monitor's state, if one was started.
    pub fn subscribe_monitor(&self) -> Option<tokio::sync::watch::Receiver<MonitorState>> {
        self.monitor.lock().as_ref().map(MonitorHandle::subscribe)
    }

    /// Stop the monitor for good. Later logins start monitors that exit
    /// immediately.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for DoorbirdClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for DoorbirdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorbirdClient")
            .field("address", &self.config.address)
            .field("identity", &self.identity())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
