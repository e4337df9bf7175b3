// Install report endpoint.

use chrono::Utc;

use crate::client::DmsClient;
use crate::error::Error;
use crate::models::InstallReport;

impl DmsClient {
    /// Tell the DMS that `bundle_id` was installed on `device_uuid`.
    ///
    /// The response body is ignored; only the status is checked.
    pub async fn report_installation(&self, device_uuid: &str, bundle_id: &str) -> Result<(), Error> {
        let url = self.endpoint(&["installations"])?;
        let report = InstallReport {
            device_uuid,
            bundle_id,
            reported_at: Utc::now(),
        };
        self.post_json(url, &report).await
    }
}
