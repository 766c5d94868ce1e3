// Bounded request client
//
// Every command request goes through `execute`: one HTTP exchange raced
// against a wall-clock deadline. Losing the race drops the in-flight
// request future, which aborts the transport. The timer lives inside the
// `timeout` future, so it is released on every exit path.

use std::borrow::Cow;
use std::error::Error as _;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::Error;

/// Per-call request options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// Log failures at `debug` instead of `warn`. For background callers
    /// that expect frequent transient failures.
    pub quiet: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            quiet: false,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

/// Timeout-guarded request/response client.
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: reqwest::Client,
}

impl RequestClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// The underlying HTTP client (shared with the event monitor).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issue one request and return the response only if it succeeded.
    ///
    /// Every failure is logged against `device` and collapsed into `None`.
    pub async fn send(
        &self,
        device: &str,
        url: &str,
        options: RequestOptions,
        deadline: Duration,
    ) -> Option<Response> {
        let quiet = options.quiet;
        match self.execute(url, options, deadline).await {
            Ok(response) => Some(response),
            Err(err) => {
                log_failure(device, &err, quiet);
                None
            }
        }
    }

    /// Issue one request, classifying any failure.
    ///
    /// Exactly one outcome per call: a 2xx response, or one [`Error`].
    pub async fn execute(
        &self,
        url: &str,
        options: RequestOptions,
        deadline: Duration,
    ) -> Result<Response, Error> {
        debug!(method = %options.method, path = redact(url), "sending request");

        let mut request = self.http.request(options.method, url).headers(options.headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = match tokio::time::timeout(deadline, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(classify(&e, deadline)),
            Err(_) => {
                return Err(Error::Timeout { timeout: deadline });
            }
        };

        check_status(response)
    }
}

/// Map HTTP status to the error taxonomy. 401 gets its own tag.
pub(crate) fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::InvalidCredentials);
    }

    if !status.is_success() {
        return Err(Error::RequestFailed {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        });
    }

    Ok(response)
}

/// Classify a transport failure by walking its source chain.
pub(crate) fn classify(err: &reqwest::Error, deadline: Duration) -> Error {
    if err.is_timeout() {
        return Error::Timeout { timeout: deadline };
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => return Error::ConnectionRefused,
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                    return Error::ConnectionReset;
                }
                _ => {}
            }
        }
        // hyper-util reports resolver failures as a connect error named "dns error".
        if cause.to_string().starts_with("dns error") {
            return Error::HostNotFound;
        }
        source = cause.source();
    }

    Error::Unknown {
        cause: error_chain(err),
    }
}

/// One distinct, human-readable line per failure class.
pub(crate) fn failure_message(err: &Error) -> Cow<'static, str> {
    match err {
        Error::InvalidCredentials => {
            "Invalid login credentials given. Please check your login and password.".into()
        }
        Error::RequestFailed {
            status,
            status_text,
        } => format!("Error: {status} - {status_text}").into(),
        Error::ConnectionRefused => "Connection refused.".into(),
        Error::ConnectionReset => "Connection reset.".into(),
        Error::HostNotFound => "Hostname or IP address not found. \
             Please ensure the address you configured for this Doorbird is correct."
            .into(),
        Error::Timeout { .. } => {
            "Doorbird API connection was terminated because it was taking too long.".into()
        }
        other => format!("Request failed: {other}").into(),
    }
}

pub(crate) fn log_failure(device: &str, err: &Error, quiet: bool) {
    let message = failure_message(err);
    if quiet {
        debug!(device, "{message}");
    } else {
        warn!(device, "{message}");
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Strip the query string so credentials never reach the logs.
pub(crate) fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
