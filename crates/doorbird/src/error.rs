//! CLI error types with miette diagnostics.
//!
//! Maps `doorbird_api::Error` and `ConfigError` variants into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use doorbird_api::Error as ApiError;
use doorbird_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Doorbird at {address}")]
    #[diagnostic(
        code(doorbird::connection_failed),
        help(
            "Check that the device is powered and on the same network.\n\
             Address: {address}"
        )
    )]
    ConnectionFailed {
        address: String,
        #[source]
        source: ApiError,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(doorbird::tls_error),
        help(
            "Doorbirds ship with self-signed certificates.\n\
             Use --insecure (-k), or point ca_cert / --ca-cert at a readable PEM file."
        )
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The device rejected the credentials for profile '{profile}'")]
    #[diagnostic(
        code(doorbird::auth_failed),
        help(
            "Use the API user from the Doorbird app (Administration > User), \
             not the app login.\n\
             Run: doorbird config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(doorbird::no_credentials),
        help(
            "Pass --user and --password, set DOORBIRD_USERNAME / DOORBIRD_PASSWORD,\n\
             or store the password with: doorbird config set-password"
        )
    )]
    NoCredentials { profile: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("The device did not accept '{operation}'")]
    #[diagnostic(
        code(doorbird::command_failed),
        help("Re-run with -v for the request log.")
    )]
    CommandFailed { operation: String },

    #[error("Device error ({status}): {message}")]
    #[diagnostic(code(doorbird::device_error))]
    DeviceError { status: u16, message: String },

    #[error("Unexpected response from the device: {message}")]
    #[diagnostic(
        code(doorbird::malformed_response),
        help("The firmware may be too old for the LAN API. Check the device's firmware version.")
    )]
    MalformedResponse { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {after}")]
    #[diagnostic(
        code(doorbird::timeout),
        help("Increase timeout with --timeout or check the device's network link.")
    )]
    Timeout { after: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(doorbird::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(doorbird::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Add one with: doorbird config set address <host> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(doorbird::no_config),
        help(
            "Pass --address, or create a profile with: doorbird config set address <host>\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(doorbird::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(doorbird::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Map a library error, attaching the device context the CLI knows about.
    pub fn from_api(err: ApiError, address: &str, profile: &str) -> Self {
        match err {
            ApiError::InvalidCredentials => Self::AuthFailed {
                profile: profile.into(),
            },
            ApiError::Timeout { timeout } => Self::Timeout {
                after: humantime::format_duration(timeout).to_string(),
            },
            ApiError::Tls(message) => Self::TlsError { message },
            ApiError::RequestFailed {
                status,
                status_text,
            } => Self::DeviceError {
                status,
                message: status_text,
            },
            ApiError::MalformedBody { message } => Self::MalformedResponse { message },
            ApiError::MissingBoundary { content_type } => Self::MalformedResponse {
                message: format!("event stream without multipart boundary ({content_type})"),
            },
            other => Self::ConnectionFailed {
                address: address.into(),
                source: other,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}
