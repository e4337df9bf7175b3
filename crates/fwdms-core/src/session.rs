// ── DMS session ──
//
// One session per device being updated. Owns the reachability monitor,
// the cached firmware list and the event channel; catalog and download
// calls go straight to the service and never consult reachability first.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use fwdms_api::{DmsClient, DownloadProgress};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::firmware::path_component;
use crate::model::{DeviceId, FirmwareList, FirmwareVersionEntry, HostTarget, ReachabilityState};
use crate::reachability::{ReachabilityMonitor, ReachabilitySource, TcpProbeSource};
use crate::report::InstallReporter;
use crate::store::FirmwareStore;
use crate::stream::EventStream;

const EVENT_CHANNEL_SIZE: usize = 256;

// ── SessionEvent ─────────────────────────────────────────────────

/// Notifications published by a [`DmsSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The DMS host became reachable (`true`) or unreachable (`false`).
    /// Sent only on transitions.
    ReachabilityChanged(bool),
    /// A catalog retrieval succeeded. Carries the same snapshot the
    /// session now caches.
    NewFirmwareList(FirmwareList),
}

// ── DmsSession ───────────────────────────────────────────────────

/// Firmware catalog session for a single device.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Reachability monitoring
/// starts on construction and stops when the last clone is dropped.
#[derive(Clone)]
pub struct DmsSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    device_id: DeviceId,
    config: SessionConfig,
    client: DmsClient,
    store: FirmwareStore,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Receiver created before the monitor starts, handed to the first
    /// `subscribe()` caller so early reachability events are not lost.
    first_rx: Mutex<Option<broadcast::Receiver<SessionEvent>>>,
    monitor: ReachabilityMonitor,
}

impl DmsSession {
    /// Create a session for `device_id`, probing the service host over TCP.
    pub fn new(device_id: impl Into<String>, config: SessionConfig) -> Result<Self, CoreError> {
        let source = TcpProbeSource::new(config.probe_interval, config.probe_timeout);
        Self::with_source(device_id, config, &source)
    }

    /// Create a session with a custom reachability source.
    pub fn with_source(
        device_id: impl Into<String>,
        config: SessionConfig,
        source: &dyn ReachabilitySource,
    ) -> Result<Self, CoreError> {
        let device_id = DeviceId::new(device_id)?;
        let client = DmsClient::new(config.base_url.clone(), &config.transport())?;
        let target = HostTarget::from_url(&config.base_url)?;

        let (event_tx, first_rx) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let monitor_tx = event_tx.clone();
        let monitor = ReachabilityMonitor::start(source, &target, move |state| {
            // No subscribers is fine; the event is simply dropped.
            let _ = monitor_tx.send(SessionEvent::ReachabilityChanged(state.is_reachable()));
        })?;

        debug!(%device_id, %target, "DMS session created");

        Ok(Self {
            inner: Arc::new(SessionInner {
                device_id,
                config,
                client,
                store: FirmwareStore::new(),
                event_tx,
                first_rx: Mutex::new(Some(first_rx)),
                monitor,
            }),
        })
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ── Observation ──────────────────────────────────────────────

    /// The list from the last successful retrieval, or an empty list.
    pub fn firmware_list(&self) -> FirmwareList {
        self.inner.store.snapshot()
    }

    /// Watch receiver over the cached list.
    pub fn firmware_list_watch(&self) -> watch::Receiver<FirmwareList> {
        self.inner.store.subscribe()
    }

    /// Last known reachability, `None` until the first observation.
    ///
    /// Advisory only: operations never check it.
    pub fn reachability(&self) -> Option<ReachabilityState> {
        self.inner.monitor.current()
    }

    /// Watch receiver over the deduplicated reachability state.
    pub fn reachability_watch(&self) -> watch::Receiver<Option<ReachabilityState>> {
        self.inner.monitor.watch()
    }

    /// Subscribe to session events.
    ///
    /// The first subscriber receives every event since the session was
    /// created; later subscribers see events from the moment they
    /// subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        let first = self
            .inner
            .first_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        first.unwrap_or_else(|| self.inner.event_tx.subscribe())
    }

    /// Like [`subscribe`](Self::subscribe), as a `Stream`.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    // ── Operations ───────────────────────────────────────────────

    /// Fetch the firmware versions available for this device.
    ///
    /// On success the cache is replaced and `NewFirmwareList` is published
    /// before this returns; all three carry the same snapshot. On failure
    /// the cache is left untouched and nothing is published.
    pub async fn retrieve_available_versions(&self) -> Result<FirmwareList, CoreError> {
        let device_id = self.inner.device_id.as_str();
        let versions = self.inner.client.list_firmware(device_id).await.map_err(|e| {
            debug!(device_id, error = %e, "catalog retrieval failed");
            CoreError::from(e)
        })?;

        let list: FirmwareList = versions.into_iter().map(FirmwareVersionEntry::from).collect();
        let event_tx = &self.inner.event_tx;
        self.inner
            .store
            .replace(list.clone(), |published| {
                let _ = event_tx.send(SessionEvent::NewFirmwareList(published));
            })
            .await;

        Ok(list)
    }

    /// Download `version` and return the path of the complete image.
    ///
    /// The version is forwarded as-is; it does not have to be in the
    /// cached list. The returned path only ever names a fully written file.
    pub async fn load_firmware_version(&self, version: &str) -> Result<PathBuf, CoreError> {
        self.load_firmware_version_with_progress(version, |_| {})
            .await
    }

    /// Like [`load_firmware_version`](Self::load_firmware_version),
    /// reporting progress after each written chunk.
    pub async fn load_firmware_version_with_progress(
        &self,
        version: &str,
        progress: impl FnMut(DownloadProgress) + Send,
    ) -> Result<PathBuf, CoreError> {
        if version.trim().is_empty() {
            return Err(CoreError::InvalidArgument {
                message: "firmware version must not be empty".into(),
            });
        }

        let dest = self.image_path(version);
        let device_id = self.inner.device_id.as_str();
        self.inner
            .client
            .download_firmware_with_progress(device_id, version, &dest, progress)
            .await
            .map_err(|e| {
                debug!(device_id, version, error = %e, "firmware download failed");
                CoreError::from(e)
            })?;

        Ok(dest)
    }

    /// Where `version` for this device is stored once downloaded.
    pub fn image_path(&self, version: &str) -> PathBuf {
        self.inner
            .config
            .download_dir
            .join(path_component(self.inner.device_id.as_str()))
            .join(format!("{}.bin", path_component(version)))
    }

    /// Report an installation using this session's connection settings.
    ///
    /// Fire-and-forget; see [`InstallReporter::report`].
    pub fn report_installation(&self, device_uuid: &str, bundle_id: &str) {
        InstallReporter::from_client(self.inner.client.clone()).report(device_uuid, bundle_id);
    }

    /// Report an installation without a session.
    ///
    /// Fire-and-forget: failures (including a bad configuration) are
    /// logged and never reach the caller.
    pub fn report_installation_result(config: &SessionConfig, device_uuid: &str, bundle_id: &str) {
        match InstallReporter::new(config) {
            Ok(reporter) => reporter.report(device_uuid, bundle_id),
            Err(e) => warn!(error = %e, "install report dropped: cannot build client"),
        }
    }

    /// Stop reachability monitoring. Operations keep working.
    pub fn shutdown(&self) {
        self.inner.monitor.shutdown();
    }
}

impl std::fmt::Debug for DmsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmsSession")
            .field("device_id", &self.inner.device_id)
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("reachability", &self.reachability())
            .field("firmware_versions", &self.firmware_list().len())
            .finish_non_exhaustive()
    }
}
