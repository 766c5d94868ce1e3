use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `doorbird-api` crate.
///
/// Every failure the request client, the command operations, and the event
/// monitor can observe is one of these tags. Command operations never hand
/// them to their callers directly -- they log the error and return `false` --
/// but [`DoorbirdClient::identify`](crate::DoorbirdClient::identify) and
/// [`RequestClient::execute`](crate::RequestClient::execute) expose them for
/// callers that want the cause.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The request did not complete before its deadline and was aborted.
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The device actively refused the TCP connection.
    #[error("Connection refused")]
    ConnectionRefused,

    /// The device reset the connection mid-request.
    #[error("Connection reset")]
    ConnectionReset,

    /// The configured address could not be resolved.
    #[error("Hostname or IP address not found")]
    HostNotFound,

    /// Any transport failure not covered above.
    #[error("Unknown transport error: {cause}")]
    Unknown { cause: String },

    /// TLS configuration or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// HTTP 401 from the device. Never retried automatically.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Any other non-2xx status.
    #[error("Request failed: {status} - {status_text}")]
    RequestFailed { status: u16, status_text: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Body was not JSON, or lacked the expected `BHA.VERSION[0]` structure.
    #[error("Malformed response body: {message}")]
    MalformedBody { message: String },

    // ── Event stream ────────────────────────────────────────────────
    /// The stream's `Content-Type` did not carry a multipart boundary.
    #[error("Unable to parse content-type header: {content_type}")]
    MissingBoundary { content_type: String },

    /// A stream line that is neither protocol noise nor `name:value`.
    #[error("Received an unknown response: {line}")]
    UnrecognizedStreamFrame { line: String },

    /// No stream data arrived within the heartbeat interval.
    #[error("No data from the events API for {interval:?}")]
    HeartbeatLost { interval: Duration },
}

impl Error {
    /// Returns `true` if this error indicates bad credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}
