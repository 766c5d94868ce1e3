mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use doorbird_api::{ConnectFailurePolicy, DoorbirdClient};

use crate::cli::{Cli, Command};
use crate::commands::Session;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "doorbird", &mut std::io::stdout());
            Ok(())
        }

        // All other commands talk to a device
        cmd => {
            let cfg = config::load_config()?;
            let (mut device, profile) = config::resolve_device(&cli.global, cfg)?;

            if matches!(&cmd, Command::Monitor(args) if args.retry) {
                device.connect_failure = ConnectFailurePolicy::RetryAfterCooldown;
            }

            let address = device.address.clone();
            let client =
                DoorbirdClient::new(device).map_err(|e| CliError::from_api(e, &address, &profile))?;

            let session = Session {
                client: &client,
                global: &cli.global,
                profile: &profile,
            };

            tracing::debug!(command = ?cmd, device = %client.label(), "dispatching command");
            commands::dispatch(cmd, &session).await
        }
    }
}
