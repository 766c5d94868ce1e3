// ── Runtime device configuration ──
//
// These types describe *how* to talk to one Doorbird. They carry credential
// data and timing, but never touch disk. The host (CLI, config crate)
// constructs a `DeviceConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use crate::transport::TlsMode;

/// Username/password pair for the device's HTTP API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Timing constants the device does not negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Deadline for every command request.
    pub response_timeout: Duration,
    /// Longest silence tolerated on the event stream.
    pub heartbeat_interval: Duration,
    /// Wait between a lost stream and the next connection attempt.
    pub reboot_cooldown: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(30),
            reboot_cooldown: Duration::from_secs(60),
        }
    }
}

/// What the monitor does when an attempt fails before the stream starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectFailurePolicy {
    /// Log and stop. Only a heartbeat loss on an established stream
    /// schedules a reconnect.
    #[default]
    GiveUp,
    /// Sleep the reboot cooldown and try again. Invalid credentials still
    /// stop the monitor.
    RetryAfterCooldown,
}

/// Configuration for a single device session.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Display name. Empty means "derive one" (see [`crate::label`]).
    pub name: Option<String>,
    /// Host or IP, optionally with an explicit `http://` / `https://` scheme.
    pub address: String,
    pub credentials: Credentials,
    pub tls: TlsMode,
    pub timing: Timing,
    pub connect_failure: ConnectFailurePolicy,
}

impl DeviceConfig {
    /// Config with default TLS, timing, and failure policy.
    pub fn new(address: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            name: None,
            address: address.into(),
            credentials: Credentials {
                username: username.into(),
                password,
            },
            tls: TlsMode::default(),
            timing: Timing::default(),
            connect_failure: ConnectFailurePolicy::default(),
        }
    }
}
