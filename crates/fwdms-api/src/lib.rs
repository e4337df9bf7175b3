// fwdms-api: Async Rust client for the firmware catalog and delivery service

pub mod catalog;
pub mod client;
pub mod download;
pub mod error;
pub mod install;
pub mod models;
pub mod transport;

pub use client::DmsClient;
pub use download::DownloadProgress;
pub use error::Error;
pub use models::{FirmwareVersion, InstallReport};
pub use transport::{TlsMode, TransportConfig};
