// doorbird-api: Async Rust client for the Doorbird LAN API (commands + event monitor)

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod label;
pub mod models;
pub mod monitor;
pub mod request;
pub mod transport;
pub mod urls;

pub use client::DoorbirdClient;
pub use config::{ConnectFailurePolicy, Credentials, DeviceConfig, Timing};
pub use error::Error;
pub use events::{EventHandlers, Frame, Handler};
pub use models::DeviceIdentity;
pub use monitor::{MonitorHandle, MonitorState, MonitorStats};
pub use request::{RequestClient, RequestOptions};
pub use transport::{TlsMode, TransportConfig};
pub use urls::UrlBuilder;
