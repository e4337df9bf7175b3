// Catalog endpoint: list firmware compatible with a device.

use tracing::debug;

use crate::client::DmsClient;
use crate::error::Error;
use crate::models::{CatalogResponse, FirmwareVersion};

impl DmsClient {
    /// List firmware versions available for `device_id`.
    ///
    /// Order is whatever the service returns. An empty list means no
    /// compatible firmware exists and is not an error.
    pub async fn list_firmware(&self, device_id: &str) -> Result<Vec<FirmwareVersion>, Error> {
        let url = self.catalog_url(device_id)?;
        let response: CatalogResponse = self.get_json(url).await?;
        let versions = response.into_versions();
        debug!(device_id, count = versions.len(), "catalog retrieved");
        Ok(versions)
    }
}
