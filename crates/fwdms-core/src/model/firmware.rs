// ── Firmware catalog domain types ──

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque identifier of the physical device being updated.
///
/// Never empty. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidArgument {
                message: "device id must not be empty".into(),
            });
        }
        Ok(Self(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0.to_string()
    }
}

/// One firmware version offered for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersionEntry {
    pub version: String,
    pub description: String,
    /// Firmware flavor, e.g. `"stable"`.
    pub tag: String,
    pub size_bytes: u64,
}

impl From<fwdms_api::FirmwareVersion> for FirmwareVersionEntry {
    fn from(v: fwdms_api::FirmwareVersion) -> Self {
        Self {
            version: v.version,
            description: v.description,
            tag: v.tag,
            size_bytes: v.size_bytes,
        }
    }
}

/// Firmware versions in the order the service returned them.
///
/// Shared, immutable snapshot: the session cache, the value returned to
/// the caller and the `NewFirmwareList` event payload all point at the
/// same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FirmwareList(Arc<[FirmwareVersionEntry]>);

impl FirmwareList {
    pub fn new(entries: Vec<FirmwareVersionEntry>) -> Self {
        Self(entries.into())
    }

    /// Look up an entry by exact version string.
    pub fn find(&self, version: &str) -> Option<&FirmwareVersionEntry> {
        self.0.iter().find(|e| e.version == version)
    }

    /// Entries carrying the given flavor tag, in list order.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a FirmwareVersionEntry> {
        self.0.iter().filter(move |e| e.tag == tag)
    }

    /// `true` if both handles share one snapshot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for FirmwareList {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl Deref for FirmwareList {
    type Target = [FirmwareVersionEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<FirmwareVersionEntry> for FirmwareList {
    fn from_iter<I: IntoIterator<Item = FirmwareVersionEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FirmwareList {
    type Item = &'a FirmwareVersionEntry;
    type IntoIter = std::slice::Iter<'a, FirmwareVersionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Bytes that may appear verbatim in a path component.
const PATH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-');

/// Encode an identifier as a single path component.
///
/// Keeps `[A-Za-z0-9._-]` and percent-encodes every other byte (including
/// `%` itself), so distinct identifiers always map to distinct names. A
/// leading dot is encoded too: the result is never `.`, `..` or hidden.
pub(crate) fn path_component(raw: &str) -> String {
    if raw.is_empty() {
        // The encoder never emits a lone `%`.
        return "%".to_owned();
    }
    let encoded = utf8_percent_encode(raw, PATH_ENCODE).to_string();
    match encoded.strip_prefix('.') {
        Some(rest) => format!("%2E{rest}"),
        None => encoded,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(version: &str, tag: &str) -> FirmwareVersionEntry {
        FirmwareVersionEntry {
            version: version.into(),
            description: String::new(),
            tag: tag.into(),
            size_bytes: 1024,
        }
    }

    #[test]
    fn empty_device_id_is_rejected() {
        assert!(DeviceId::new("").is_err());
        assert!(DeviceId::new("   ").is_err());
        assert_eq!(DeviceId::new("ABC123").unwrap().as_str(), "ABC123");
    }

    #[test]
    fn list_keeps_service_order() {
        let list = FirmwareList::new(vec![entry("2.0.0", "beta"), entry("1.0.0", "stable")]);
        let versions: Vec<_> = list.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, ["2.0.0", "1.0.0"]);
    }

    #[test]
    fn find_and_filter_by_tag() {
        let list: FirmwareList = [entry("1.0.0", "stable"), entry("1.1.0", "beta"), entry("1.2.0", "stable")]
            .into_iter()
            .collect();
        assert_eq!(list.find("1.1.0").unwrap().tag, "beta");
        assert!(list.find("9.9.9").is_none());
        assert_eq!(list.with_tag("stable").count(), 2);
    }

    #[test]
    fn clones_share_the_snapshot() {
        let list = FirmwareList::new(vec![entry("1.0.0", "stable")]);
        let copy = list.clone();
        assert!(list.ptr_eq(&copy));
        assert!(!list.ptr_eq(&FirmwareList::new(vec![entry("1.0.0", "stable")])));
    }

    #[test]
    fn serializes_as_plain_array() {
        let list = FirmwareList::new(vec![entry("1.0.0", "stable")]);
        let json = serde_json::to_value(&list).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["version"], "1.0.0");
    }

    #[test]
    fn path_component_neutralizes_traversal() {
        assert_eq!(path_component("1.2.0"), "1.2.0");
        assert_eq!(path_component("../../etc/passwd"), "%2E.%2F..%2Fetc%2Fpasswd");
        assert_eq!(path_component(".."), "%2E.");
        assert_eq!(path_component(".hidden"), "%2Ehidden");
        assert_eq!(path_component("1.0 beta/2"), "1.0%20beta%2F2");
    }

    #[test]
    fn path_component_keeps_distinct_ids_distinct() {
        let ids = [
            "1.0/beta", "1.0_beta", "1.0%2Fbeta", "1.0 beta", "1.0+beta", ".1.0", "%2E1.0",
            "1.0-beta", "v1.0β", "v1.0_", "", "%",
        ];
        let names: std::collections::HashSet<_> = ids.iter().map(|id| path_component(id)).collect();
        assert_eq!(names.len(), ids.len(), "{names:?}");
        assert!(names.iter().all(|n| !n.is_empty() && !n.contains('/') && !n.starts_with('.')));
    }
}
