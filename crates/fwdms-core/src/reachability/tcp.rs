// ── TCP connect probe ──
//
// Polls the DMS host by opening (and immediately dropping) a TCP
// connection. A completed handshake within the probe timeout counts as
// reachable; refusal, DNS failure or timeout counts as unreachable.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use super::ReachabilitySource;
use crate::error::CoreError;
use crate::model::{HostTarget, ReachabilityState};

/// Periodic TCP-handshake reachability source.
#[derive(Debug, Clone)]
pub struct TcpProbeSource {
    interval: Duration,
    timeout: Duration,
}

impl TcpProbeSource {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl ReachabilitySource for TcpProbeSource {
    fn subscribe(
        &self,
        target: &HostTarget,
    ) -> Result<BoxStream<'static, ReachabilityState>, CoreError> {
        if self.interval.is_zero() {
            return Err(CoreError::monitor_init("probe interval must be non-zero"));
        }
        if self.timeout.is_zero() {
            return Err(CoreError::monitor_init("probe timeout must be non-zero"));
        }

        let addr = target.to_string();
        let (interval, timeout) = (self.interval, self.timeout);

        let stream = async_stream::stream! {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                yield probe(&addr, timeout).await;
            }
        };
        Ok(stream.boxed())
    }
}

/// One connection attempt against `addr`.
pub(crate) async fn probe(addr: &str, timeout: Duration) -> ReachabilityState {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => {
            trace!(addr, "probe connected");
            ReachabilityState::Reachable
        }
        Ok(Err(e)) => {
            trace!(addr, error = %e, "probe failed");
            ReachabilityState::Unreachable
        }
        Err(_) => {
            trace!(addr, timeout_ms = timeout.as_millis(), "probe timed out");
            ReachabilityState::Unreachable
        }
    }
}
