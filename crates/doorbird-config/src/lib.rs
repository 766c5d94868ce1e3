//! Shared configuration for Doorbird tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `doorbird_api::DeviceConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doorbird_api::{ConnectFailurePolicy, Credentials, DeviceConfig, Timing, TlsMode};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Defaults {
    /// Unset keeps the self-signed default; `false` verifies against system roots.
    #[serde(default)]
    pub insecure: Option<bool>,

    #[serde(default)]
    pub timing: TimingConfig,
}

/// Timing knobs, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimingConfig {
    #[serde(default = "default_response_timeout")]
    pub response_timeout_secs: u64,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_reboot_cooldown")]
    pub reboot_cooldown_secs: u64,

    /// Also reschedule connection attempts that fail before the stream starts.
    #[serde(default)]
    pub retry_on_connect_failure: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            reboot_cooldown_secs: default_reboot_cooldown(),
            retry_on_connect_failure: false,
        }
    }
}

fn default_response_timeout() -> u64 {
    5
}
fn default_heartbeat_interval() -> u64 {
    30
}
fn default_reboot_cooldown() -> u64 {
    60
}

impl TimingConfig {
    fn validate(&self) -> Result<Timing, ConfigError> {
        for (field, value) in [
            ("response_timeout_secs", self.response_timeout_secs),
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("reboot_cooldown_secs", self.reboot_cooldown_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be at least 1 second".into(),
                });
            }
        }

        Ok(Timing {
            response_timeout: Duration::from_secs(self.response_timeout_secs),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            reboot_cooldown: Duration::from_secs(self.reboot_cooldown_secs),
        })
    }

    fn policy(&self) -> ConnectFailurePolicy {
        if self.retry_on_connect_failure {
            ConnectFailurePolicy::RetryAfterCooldown
        } else {
            ConnectFailurePolicy::GiveUp
        }
    }
}

/// A named device profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Host or IP (e.g., "192.168.1.40"). A scheme may be given explicitly.
    #[serde(default)]
    pub address: String,

    /// Display name for log lines.
    pub name: Option<String>,

    /// API user (the `ghxxxx0001`-style user from the Doorbird app).
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override global timing.
    pub timing: Option<TimingConfig>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "doorbird", "doorbird").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("doorbird");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path`, layered over defaults and under `DOORBIRD_*`
/// environment variables (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DOORBIRD_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Render config as pretty TOML, with plaintext passwords masked.
pub fn to_redacted_toml(cfg: &Config) -> Result<String, ConfigError> {
    let mut rendered = toml::Value::try_from(cfg)?;
    if let Some(toml::Value::Table(profiles)) = rendered.get_mut("profiles") {
        for profile in profiles.iter_mut().map(|(_, v)| v) {
            if let toml::Value::Table(profile) = profile {
                if profile.contains_key("password") {
                    profile.insert("password".into(), toml::Value::String("********".into()));
                }
            }
        }
    }
    Ok(toml::to_string_pretty(&rendered)?)
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password from the credential chain.
///
/// 1. The env var named by `password_env`
/// 2. `DOORBIRD_PASSWORD`
/// 3. System keyring entry `doorbird` / `{profile}/password`
/// 4. Plaintext in config
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(pw) = std::env::var("DOORBIRD_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new("doorbird", &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the username: profile, then `DOORBIRD_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("DOORBIRD_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// `insecure = true` always wins, then a CA file. Otherwise an explicit
/// `insecure = false` verifies against system roots, and leaving it unset
/// accepts the self-signed certificate devices ship with.
fn tls_mode(insecure: Option<bool>, ca_cert: Option<&Path>) -> TlsMode {
    match (insecure, ca_cert) {
        (Some(true), _) | (None, None) => TlsMode::DangerAcceptInvalid,
        (_, Some(ca_path)) => TlsMode::CustomCa(ca_path.to_path_buf()),
        (Some(false), None) => TlsMode::System,
    }
}

/// Build a `DeviceConfig` from a profile plus global defaults.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let address = profile.address.trim();
    if address.is_empty() {
        return Err(ConfigError::Validation {
            field: "address".into(),
            reason: format!("profile '{profile_name}' has no device address"),
        });
    }

    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;

    let tls = tls_mode(profile.insecure.or(defaults.insecure), profile.ca_cert.as_deref());

    let timing_config = profile.timing.unwrap_or(defaults.timing);

    Ok(DeviceConfig {
        name: profile.name.clone(),
        address: address.to_owned(),
        credentials: Credentials { username, password },
        tls,
        timing: timing_config.validate()?,
        connect_failure: timing_config.policy(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config_from(Path::new("/nonexistent/doorbird.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timing, TimingConfig::default());
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_and_timing() {
        let (_dir, path) = write_config(
            r#"
default_profile = "front"

[defaults.timing]
heartbeat_interval_secs = 20

[profiles.front]
address = "192.168.1.40"
name = "Front Door"
username = "ghxxxx0001"
password = "hunter2"

[profiles.front.timing]
reboot_cooldown_secs = 180
retry_on_connect_failure = true
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("front"));
        assert_eq!(cfg.defaults.timing.heartbeat_interval_secs, 20);
        assert_eq!(cfg.defaults.timing.response_timeout_secs, 5);

        let front = &cfg.profiles["front"];
        assert_eq!(front.address, "192.168.1.40");
        let timing = front.timing.unwrap();
        assert_eq!(timing.reboot_cooldown_secs, 180);
        assert_eq!(timing.heartbeat_interval_secs, 30);
        assert!(timing.retry_on_connect_failure);
    }

    #[test]
    fn profile_translates_to_device_config() {
        let profile = Profile {
            address: " 192.168.1.40 ".into(),
            name: Some("Front Door".into()),
            username: Some("ghxxxx0001".into()),
            password_env: Some("PATH".into()),
            ..Profile::default()
        };

        let device = profile_to_device_config(&profile, "front", &Defaults::default()).unwrap();
        assert_eq!(device.address, "192.168.1.40");
        assert_eq!(device.name.as_deref(), Some("Front Door"));
        assert_eq!(device.credentials.username, "ghxxxx0001");
        assert_eq!(
            device.credentials.password.expose_secret(),
            std::env::var("PATH").unwrap()
        );
        assert_eq!(device.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(device.timing, Timing::default());
        assert_eq!(device.connect_failure, ConnectFailurePolicy::GiveUp);
    }

    #[test]
    fn custom_ca_is_used_when_not_insecure() {
        let profile = Profile {
            address: "door".into(),
            username: Some("u".into()),
            password_env: Some("PATH".into()),
            ca_cert: Some(PathBuf::from("/etc/doorbird/ca.pem")),
            insecure: Some(false),
            ..Profile::default()
        };

        let device = profile_to_device_config(&profile, "p", &Defaults::default()).unwrap();
        assert_eq!(device.tls, TlsMode::CustomCa(PathBuf::from("/etc/doorbird/ca.pem")));
    }

    #[test]
    fn explicit_secure_profile_verifies_against_system_roots() {
        let profile = Profile {
            address: "door".into(),
            username: Some("u".into()),
            password_env: Some("PATH".into()),
            insecure: Some(false),
            ..Profile::default()
        };

        let device = profile_to_device_config(&profile, "p", &Defaults::default()).unwrap();
        assert_eq!(device.tls, TlsMode::System);
    }

    #[test]
    fn secure_default_applies_unless_profile_overrides() {
        let defaults = Defaults {
            insecure: Some(false),
            ..Defaults::default()
        };
        let mut profile = Profile {
            address: "door".into(),
            username: Some("u".into()),
            password_env: Some("PATH".into()),
            ..Profile::default()
        };

        let device = profile_to_device_config(&profile, "p", &defaults).unwrap();
        assert_eq!(device.tls, TlsMode::System);

        profile.insecure = Some(true);
        let device = profile_to_device_config(&profile, "p", &defaults).unwrap();
        assert_eq!(device.tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        assert_eq!(
            tls_mode(Some(true), Some(Path::new("/etc/doorbird/ca.pem"))),
            TlsMode::DangerAcceptInvalid
        );
        assert_eq!(
            tls_mode(None, Some(Path::new("/etc/doorbird/ca.pem"))),
            TlsMode::CustomCa(PathBuf::from("/etc/doorbird/ca.pem"))
        );
    }

    #[test]
    fn empty_address_is_rejected() {
        let profile = Profile {
            username: Some("u".into()),
            password: Some("p".into()),
            ..Profile::default()
        };
        let err = profile_to_device_config(&profile, "p", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "address"));
    }

    #[test]
    fn zero_timing_is_rejected() {
        let timing = TimingConfig {
            heartbeat_interval_secs: 0,
            ..TimingConfig::default()
        };
        let err = timing.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "heartbeat_interval_secs")
        );
    }

    #[test]
    fn redacted_toml_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "front".into(),
            Profile {
                address: "door".into(),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );

        let rendered = to_redacted_toml(&cfg).unwrap();
        assert!(rendered.contains("********"));
        assert!(!rendered.contains("hunter2"));
    }
}
