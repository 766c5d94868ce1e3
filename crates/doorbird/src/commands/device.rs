//! One-shot device commands: info, open-door, light-on, urls.

use secrecy::ExposeSecret;

use doorbird_api::DeviceIdentity;

use crate::cli::OutputFormat;
use crate::error::CliError;

use super::{Session, style};

pub async fn info(session: &Session<'_>) -> Result<(), CliError> {
    let identity = session.client.identify().await.map_err(|e| session.api_error(e))?;

    match session.global.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&identity)?),
        OutputFormat::Text => print!("{}", render_identity(&identity, session.client.urls().origin())),
    }
    Ok(())
}

fn render_identity(identity: &DeviceIdentity, origin: &str) -> String {
    let unknown = || "-".to_string();
    let firmware = match (&identity.firmware, &identity.build_number) {
        (Some(fw), Some(build)) => format!("{fw} (build {build})"),
        (Some(fw), None) => fw.clone(),
        _ => unknown(),
    };
    let relays = if identity.relays.is_empty() {
        unknown()
    } else {
        identity.relays.join(", ")
    };

    let rows = [
        ("Address", origin.to_string()),
        ("Model", identity.device_type.clone().unwrap_or_else(unknown)),
        ("MAC", identity.mac.clone().unwrap_or_else(unknown)),
        ("Firmware", firmware),
        ("Relays", relays),
    ];

    rows.iter()
        .map(|(key, value)| format!("{}{value}\n", style::accent(format!("{key:<10}"))))
        .collect()
}

pub async fn open_door(session: &Session<'_>, relay: &str) -> Result<(), CliError> {
    if relay.trim().is_empty() {
        return Err(CliError::Validation {
            field: "relay".into(),
            reason: "relay identifier cannot be empty".into(),
        });
    }

    if !session.client.trigger_actuator(relay).await {
        return Err(CliError::CommandFailed {
            operation: format!("open-door {relay}"),
        });
    }
    eprintln!("{}", style::success(format!("✓ Relay {relay} triggered")));
    Ok(())
}

pub async fn light_on(session: &Session<'_>) -> Result<(), CliError> {
    if !session.client.activate_auxiliary_feature().await {
        return Err(CliError::CommandFailed {
            operation: "light-on".into(),
        });
    }
    eprintln!("{}", style::success("✓ Night vision light on"));
    Ok(())
}

pub fn urls(session: &Session<'_>) -> Result<(), CliError> {
    let urls = session.client.urls();
    let entries = [
        ("snapshot", urls.snapshot_url()),
        ("audio", urls.audio_url()),
        ("video", urls.video_url()),
        ("events", urls.events_url()),
    ];

    match session.global.output {
        OutputFormat::Json => {
            let map: serde_json::Map<_, _> = entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            for (kind, url) in entries {
                println!("{}{url}", style::accent(format!("{kind:<10}")));
            }
        }
    }

    if !session.client.config().credentials.password.expose_secret().is_empty() {
        eprintln!("{}", style::warning("These URLs embed the device password."));
    }
    Ok(())
}
