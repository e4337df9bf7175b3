//! Reachability monitoring for the DMS host.
//!
//! A [`ReachabilitySource`] turns a host into a stream of raw
//! observations (a TCP probe, an OS network-change feed, a test script).
//! The [`ReachabilityMonitor`] drives that stream on a background task and
//! reports *transitions* only: repeated identical observations are folded
//! away, so observers never see the same state twice in a row.

mod tcp;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{HostTarget, ReachabilityState};

pub use tcp::TcpProbeSource;

// ── Capability seam ──────────────────────────────────────────────────

/// Something that can watch a host and report reachability observations.
///
/// Observations may repeat; deduplication is the monitor's job.
pub trait ReachabilitySource: Send + Sync {
    /// Start watching `target`.
    ///
    /// Returning an error means the underlying primitive could not be
    /// created; no monitoring is running in that case.
    fn subscribe(
        &self,
        target: &HostTarget,
    ) -> Result<BoxStream<'static, ReachabilityState>, CoreError>;
}

// ── ReachabilityMonitor ──────────────────────────────────────────────

/// Background watcher publishing reachability transitions.
///
/// Monitoring stops when the monitor is dropped or
/// [`shutdown`](Self::shutdown) is called.
pub struct ReachabilityMonitor {
    state: watch::Receiver<Option<ReachabilityState>>,
    cancel: CancellationToken,
}

impl ReachabilityMonitor {
    /// Subscribe to `source` and spawn the watch task.
    ///
    /// `on_transition` runs on the monitor task each time the state
    /// changes, including the first observation (unknown to known).
    /// Fails with [`CoreError::MonitorInit`] if there is no Tokio runtime
    /// to drive the task or the source refuses to subscribe.
    pub fn start(
        source: &dyn ReachabilitySource,
        target: &HostTarget,
        on_transition: impl Fn(ReachabilityState) + Send + Sync + 'static,
    ) -> Result<Self, CoreError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::monitor_init(format!("no async runtime: {e}")))?;

        let updates = source.subscribe(target).map_err(|e| match e {
            e @ CoreError::MonitorInit { .. } => e,
            other => CoreError::monitor_init(other.to_string()),
        })?;

        let (state_tx, state) = watch::channel(None);
        let cancel = CancellationToken::new();

        debug!(%target, "starting reachability monitor");
        runtime.spawn(monitor_loop(
            updates,
            state_tx,
            on_transition,
            cancel.clone(),
        ));

        Ok(Self { state, cancel })
    }

    /// Last known state, or `None` before the first observation.
    pub fn current(&self) -> Option<ReachabilityState> {
        *self.state.borrow()
    }

    /// Watch receiver over the deduplicated state.
    pub fn watch(&self) -> watch::Receiver<Option<ReachabilityState>> {
        self.state.clone()
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReachabilityMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background loop ──────────────────────────────────────────────────

async fn monitor_loop(
    mut updates: BoxStream<'static, ReachabilityState>,
    state: watch::Sender<Option<ReachabilityState>>,
    on_transition: impl Fn(ReachabilityState),
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = updates.next() => {
                let Some(observed) = next else {
                    debug!("reachability source ended");
                    break;
                };
                if record_transition(&state, observed) {
                    info!(state = %observed, "DMS reachability changed");
                    on_transition(observed);
                }
            }
        }
    }
}

/// Store `observed`, returning `true` only if it differs from the
/// previous state.
fn record_transition(
    state: &watch::Sender<Option<ReachabilityState>>,
    observed: ReachabilityState,
) -> bool {
    state.send_if_modified(|current| {
        if *current == Some(observed) {
            false
        } else {
            *current = Some(observed);
            true
        }
    })
}
