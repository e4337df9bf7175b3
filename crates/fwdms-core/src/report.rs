// ── Installation reporting ──
//
// Best-effort analytics. Reports are sent on a detached task; the caller
// never learns whether delivery succeeded.

use tracing::{debug, warn};

use fwdms_api::DmsClient;

use crate::config::SessionConfig;
use crate::error::CoreError;

/// Fire-and-forget sender for installation reports.
#[derive(Debug, Clone)]
pub struct InstallReporter {
    client: DmsClient,
}

impl InstallReporter {
    pub fn new(config: &SessionConfig) -> Result<Self, CoreError> {
        let client = DmsClient::new(config.base_url.clone(), &config.transport())?;
        Ok(Self::from_client(client))
    }

    pub(crate) fn from_client(client: DmsClient) -> Self {
        Self { client }
    }

    /// Send one report and wait for the service to accept it.
    pub async fn send(&self, device_uuid: &str, bundle_id: &str) -> Result<(), CoreError> {
        self.client
            .report_installation(device_uuid, bundle_id)
            .await
            .map_err(CoreError::from)
    }

    /// Report that `bundle_id` was installed on `device_uuid`.
    ///
    /// Returns immediately. Failures are logged at `warn` and dropped;
    /// there is no retry. Outside a Tokio runtime the report is dropped.
    pub fn report(&self, device_uuid: &str, bundle_id: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(device_uuid, bundle_id, "install report dropped: no async runtime");
            return;
        };

        let reporter = self.clone();
        let device_uuid = device_uuid.to_owned();
        let bundle_id = bundle_id.to_owned();
        runtime.spawn(async move {
            match reporter.send(&device_uuid, &bundle_id).await {
                Ok(()) => debug!(%device_uuid, %bundle_id, "installation reported"),
                Err(e) => warn!(%device_uuid, %bundle_id, error = %e, "installation report failed"),
            }
        });
    }
}
