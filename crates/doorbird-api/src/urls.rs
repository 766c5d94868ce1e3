// Authenticated URL construction.
//
// The Doorbird LAN API takes credentials as `http-user` / `http-password`
// query parameters on every endpoint. Values are inserted verbatim: the
// device parses its query string leniently, and escaping here has been
// seen to break logins whose passwords contain reserved characters. A
// credential containing `&` or `#` will therefore produce a wrong URL.

use secrecy::{ExposeSecret, SecretString};

use crate::config::Credentials;

pub const INFO_PATH: &str = "/bha-api/info.cgi";
pub const LIGHT_ON_PATH: &str = "/bha-api/light-on.cgi";
pub const OPEN_DOOR_PATH: &str = "/bha-api/open-door.cgi";
pub const MONITOR_PATH: &str = "/bha-api/monitor.cgi?ring=doorbell,motionsensor";
pub const SNAPSHOT_PATH: &str = "/bha-api/image.cgi";
pub const AUDIO_PATH: &str = "/bha-api/audio-receive.cgi";
pub const VIDEO_PATH: &str = "/bha-api/video.cgi";

/// Builds credentialed URLs for one device.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    origin: String,
    username: String,
    password: SecretString,
}

impl UrlBuilder {
    /// A bare host becomes `https://{address}`; an address with an explicit
    /// scheme is kept as-is.
    pub fn new(address: &str, credentials: &Credentials) -> Self {
        let address = address.trim_end_matches('/');
        let origin = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_owned()
        } else {
            format!("https://{address}")
        };

        Self {
            origin,
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }
    }

    /// `scheme://host`, without credentials.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Append the credential pair to `path`, joining with `&` when the path
    /// already has a query string and `?` otherwise.
    pub fn build_url(&self, path: &str) -> String {
        let join = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{path}{join}http-user={}&http-password={}",
            self.origin,
            self.username,
            self.password.expose_secret()
        )
    }

    /// The `open-door` URL for one relay. The relay id is form-encoded.
    pub fn open_door_url(&self, relay: &str) -> String {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("r", relay)
            .finish();
        self.build_url(&format!("{OPEN_DOOR_PATH}?{query}"))
    }

    pub fn events_url(&self) -> String {
        self.build_url(MONITOR_PATH)
    }

    /// JPEG snapshot of the current camera frame.
    pub fn snapshot_url(&self) -> String {
        self.build_url(SNAPSHOT_PATH)
    }

    /// G.711 audio stream from the device microphone.
    pub fn audio_url(&self) -> String {
        self.build_url(AUDIO_PATH)
    }

    /// MJPEG video stream.
    pub fn video_url(&self) -> String {
        self.build_url(VIDEO_PATH)
    }
}
