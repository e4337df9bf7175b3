// Wire types for the DMS API.
//
// Only the fields the client consumes are modelled; anything else the
// service sends is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One firmware version as listed by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Firmware flavor, e.g. `"stable"` or `"beta"`.
    #[serde(default)]
    pub tag: String,
    /// Image size in bytes.
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
}

/// Catalog response body.
///
/// The service normally wraps the list as `{"versions": [...]}`; some
/// deployments answer with the bare array, so both shapes are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CatalogResponse {
    Wrapped { versions: Vec<FirmwareVersion> },
    Bare(Vec<FirmwareVersion>),
}

impl CatalogResponse {
    pub(crate) fn into_versions(self) -> Vec<FirmwareVersion> {
        match self {
            Self::Wrapped { versions } | Self::Bare(versions) => versions,
        }
    }
}

/// Error body some DMS endpoints return alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(alias = "message")]
    pub error: String,
}

/// Installation report payload.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport<'a> {
    pub device_uuid: &'a str,
    pub bundle_id: &'a str,
    pub reported_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_accepts_wrapped_and_bare_shapes() {
        let wrapped: CatalogResponse = serde_json::from_str(
            r#"{"versions":[{"version":"1.2.0","description":"release","tag":"stable","size":45000}]}"#,
        )
        .unwrap();
        let bare: CatalogResponse =
            serde_json::from_str(r#"[{"version":"1.2.0","tag":"stable","size":45000}]"#).unwrap();

        let wrapped = wrapped.into_versions();
        let bare = bare.into_versions();
        assert_eq!(wrapped[0].size_bytes, 45000);
        assert_eq!(wrapped[0].description, "release");
        assert_eq!(bare[0].version, "1.2.0");
        assert_eq!(bare[0].description, "");
    }

    #[test]
    fn version_without_identifier_is_rejected() {
        let result = serde_json::from_str::<CatalogResponse>(r#"[{"tag":"stable"}]"#);
        assert!(result.is_err());
    }
}
