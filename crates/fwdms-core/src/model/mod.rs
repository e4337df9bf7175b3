// ── Domain model ──

pub mod firmware;
pub mod reachability;

pub use firmware::{DeviceId, FirmwareList, FirmwareVersionEntry};
pub use reachability::{HostTarget, ReachabilityState};
