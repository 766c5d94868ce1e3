//! Command dispatch: bridges CLI args -> `DoorbirdClient` calls -> output.

pub mod config_cmd;
pub mod device;
pub mod monitor;
pub mod style;

use doorbird_api::DoorbirdClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Everything a device-bound handler needs besides its own args.
pub struct Session<'a> {
    pub client: &'a DoorbirdClient,
    pub global: &'a GlobalOpts,
    pub profile: &'a str,
}

impl Session<'_> {
    /// Wrap a library error with this session's address and profile.
    pub fn api_error(&self, err: doorbird_api::Error) -> CliError {
        CliError::from_api(err, &self.client.config().address, self.profile)
    }
}

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Info => device::info(session).await,
        Command::OpenDoor(args) => device::open_door(session, &args.relay).await,
        Command::LightOn => device::light_on(session).await,
        Command::Urls => device::urls(session),
        Command::Monitor(args) => monitor::handle(session, args).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
