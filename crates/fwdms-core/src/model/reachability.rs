// ── Reachability domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;
use url::Url;

use crate::error::CoreError;

/// Whether the network path to the DMS host is currently usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityState {
    Reachable,
    Unreachable,
}

impl ReachabilityState {
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Reachable)
    }
}

impl From<bool> for ReachabilityState {
    fn from(reachable: bool) -> Self {
        if reachable {
            Self::Reachable
        } else {
            Self::Unreachable
        }
    }
}

/// The `host:port` pair a reachability source watches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTarget {
    pub host: String,
    pub port: u16,
}

impl HostTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Derive the target from a service URL, using the scheme's default
    /// port when none is given.
    pub fn from_url(url: &Url) -> Result<Self, CoreError> {
        let host = url
            .host_str()
            .ok_or_else(|| CoreError::monitor_init(format!("service URL has no host: {url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| CoreError::monitor_init(format!("service URL has no port: {url}")))?;
        Ok(Self::new(host.trim_start_matches('[').trim_end_matches(']'), port))
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
