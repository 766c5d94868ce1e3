//! Flag-aware profile resolution on top of `doorbird_config`.
//!
//! Precedence per field: flag / `DOORBIRD_*` env var > profile > defaults.

use std::time::Duration;

use secrecy::SecretString;

use doorbird_api::DeviceConfig;
use doorbird_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use doorbird_config::{config_path, load_config, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the `DeviceConfig` for this invocation.
///
/// Returns the profile name alongside, for error messages. When no profile
/// exists, `--address` alone is enough to run (credentials then come from
/// flags or the environment).
pub fn resolve_device(global: &GlobalOpts, mut cfg: Config) -> Result<(DeviceConfig, String), CliError> {
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.remove(&profile_name) {
        Some(profile) => profile,
        None if global.address.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);
    let mut device = doorbird_config::profile_to_device_config(&profile, &profile_name, &cfg.defaults)?;

    // An explicit flag beats the env/keyring chain.
    if let Some(ref password) = global.password {
        device.credentials.password = SecretString::from(password.clone());
    }

    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        device.timing.response_timeout = Duration::from_secs(secs);
    }

    Ok((device, profile_name))
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref address) = global.address {
        profile.address.clone_from(address);
    }
    if let Some(ref user) = global.user {
        profile.username = Some(user.clone());
    }
    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
    }
    if let Some(ref ca_cert) = global.ca_cert {
        profile.ca_cert = Some(ca_cert.clone());
        profile.insecure = Some(false);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
}
