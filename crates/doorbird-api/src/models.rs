// Response types for the Doorbird info endpoint.
//
// `GET /bha-api/info.cgi` answers with
// `{ "BHA": { "RETURNCODE": "1", "VERSION": [ { ...device fields... } ] } }`.
// Only the first VERSION entry is meaningful.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(rename = "BHA")]
    bha: Bha,
}

#[derive(Debug, Deserialize)]
struct Bha {
    #[serde(rename = "VERSION", default)]
    version: Vec<VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "FIRMWARE", default)]
    firmware: Option<String>,
    #[serde(rename = "BUILD_NUMBER", default)]
    build_number: Option<String>,
    #[serde(rename = "PRIMARY_MAC_ADDR", default)]
    primary_mac_addr: Option<String>,
    #[serde(rename = "WIFI_MAC_ADDR", default)]
    wifi_mac_addr: Option<String>,
    #[serde(rename = "DEVICE-TYPE", default)]
    device_type: Option<String>,
    #[serde(rename = "RELAYS", default)]
    relays: Vec<String>,
}

/// Identity of a device, captured at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    /// Primary (wired) MAC when the device reports one, else the Wi-Fi MAC.
    pub mac: Option<String>,
    pub device_type: Option<String>,
    pub firmware: Option<String>,
    pub build_number: Option<String>,
    /// Relay identifiers in device order, e.g. `["1", "gggaaa@1"]`.
    pub relays: Vec<String>,
}

impl DeviceIdentity {
    /// Parse an `info.cgi` body.
    pub fn from_info_json(body: &[u8]) -> Result<Self, Error> {
        let response: InfoResponse =
            serde_json::from_slice(body).map_err(|e| Error::MalformedBody {
                message: e.to_string(),
            })?;

        let info = response
            .bha
            .version
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedBody {
                message: "BHA.VERSION is empty".into(),
            })?;

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        Ok(Self {
            mac: non_empty(info.primary_mac_addr).or_else(|| non_empty(info.wifi_mac_addr)),
            device_type: info.device_type,
            firmware: info.firmware,
            build_number: info.build_number,
            relays: info.relays,
        })
    }
}
