//! Reachability-aware firmware catalog sessions on top of `fwdms-api`.
//!
//! - **[`DmsSession`]**: one per device being updated. Starts a
//!   [`ReachabilityMonitor`] on construction, caches the most recent
//!   [`FirmwareList`], and exposes
//!   [`retrieve_available_versions()`](DmsSession::retrieve_available_versions)
//!   and [`load_firmware_version()`](DmsSession::load_firmware_version) as
//!   async calls returning `Result`.
//!
//! - **Events**: each session owns a broadcast channel of [`SessionEvent`]s
//!   (`ReachabilityChanged` on transitions only, `NewFirmwareList` on every
//!   successful retrieval). Sessions never share state.
//!
//! - **[`ReachabilitySource`]**: capability seam for reachability
//!   primitives. [`TcpProbeSource`] polls the service host with TCP
//!   handshakes.
//!
//! - **[`InstallReporter`]**: fire-and-forget installation analytics.

pub mod config;
pub mod error;
pub mod model;
pub mod reachability;
pub mod report;
pub mod session;
mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SessionConfig, TlsVerification};
pub use error::CoreError;
pub use model::{DeviceId, FirmwareList, FirmwareVersionEntry, HostTarget, ReachabilityState};
pub use reachability::{ReachabilityMonitor, ReachabilitySource, TcpProbeSource};
pub use report::InstallReporter;
pub use session::{DmsSession, SessionEvent};
pub use stream::EventStream;

pub use fwdms_api::DownloadProgress;
