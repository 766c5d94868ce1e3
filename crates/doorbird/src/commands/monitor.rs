//! `doorbird monitor`: log in, report events, run until Ctrl-C.

use std::time::SystemTime;

use tracing::{debug, info};

use doorbird_api::MonitorState;

use crate::cli::{MonitorArgs, OutputFormat};
use crate::error::CliError;

use super::{Session, style};

pub async fn handle(session: &Session<'_>, args: MonitorArgs) -> Result<(), CliError> {
    let client = session.client;
    let output = session.global.output;

    // Handlers must be in place before login starts the stream.
    for event in args.events {
        let name = event.clone();
        client.handlers().register(event, move || report_event(&name, output));
    }

    if !client.login().await {
        return Err(CliError::CommandFailed {
            operation: "login".into(),
        });
    }

    let Some(mut state) = client.subscribe_monitor() else {
        return Err(CliError::CommandFailed {
            operation: "monitor".into(),
        });
    };

    eprintln!(
        "{} {} {}",
        style::success("✓ Watching"),
        style::accent(client.label()),
        style::dim("(Ctrl-C to stop)")
    );

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping monitor");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    // The monitor task is gone: it gave up on a failed attempt.
                    return Err(CliError::CommandFailed {
                        operation: "monitor".into(),
                    });
                }
                let current = *state.borrow_and_update();
                report_state(current);
            }
        }
    }

    client.shutdown();
    if let Some(stats) = client.monitor_stats() {
        debug!(
            attempts = stats.connection_attempts,
            heartbeat_losses = stats.heartbeat_losses,
            "monitor stopped"
        );
    }
    Ok(())
}

fn report_event(name: &str, output: OutputFormat) {
    let at = humantime::format_rfc3339_seconds(SystemTime::now());
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "time": at.to_string(), "event": name }));
        }
        OutputFormat::Text => println!("{} {}", style::dim(at.to_string()), style::accent(name)),
    }
}

fn report_state(state: MonitorState) {
    match state {
        MonitorState::Reconnecting => eprintln!("{}", style::warning("… waiting to reconnect")),
        MonitorState::Streaming => eprintln!("{}", style::success("✓ stream connected")),
        MonitorState::Connecting | MonitorState::Idle => debug!(?state, "monitor state changed"),
    }
}
