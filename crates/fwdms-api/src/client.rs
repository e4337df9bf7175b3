// DMS HTTP client
//
// Wraps `reqwest::Client` with DMS URL construction and status/body
// handling. Endpoint families (catalog, download, install) are inherent
// methods implemented in their own modules so this file stays focused on
// transport mechanics.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ErrorBody;
use crate::transport::TransportConfig;

const API_VERSION: &str = "v1";
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for the DMS API.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct DmsClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout the inner client was built with, if known.
    timeout: Option<Duration>,
}

impl DmsClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the service root (e.g. `https://dms.example.com` or
    /// `https://example.com/dms/`); versioned endpoint paths are appended
    /// to it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: None,
        }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/v1/{segments...}`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);
        Ok(url)
    }

    /// `{base}/v1/devices/{device_id}/firmware`
    pub(crate) fn catalog_url(&self, device_id: &str) -> Result<Url, Error> {
        self.endpoint(&["devices", device_id, "firmware"])
    }

    /// `{base}/v1/devices/{device_id}/firmware/{version}/image`
    pub(crate) fn image_url(&self, device_id: &str, version: &str) -> Result<Url, Error> {
        self.endpoint(&["devices", device_id, "firmware", version, "image"])
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = Self::check_status(resp).await?;

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// Send a POST request with a JSON body, discarding the response body.
    pub(crate) async fn post_json(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// Start a GET request whose body the caller will stream.
    pub(crate) async fn get_stream(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {} (streaming)", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(resp).await
    }

    /// Classify a reqwest failure, surfacing timeouts as `Error::Timeout`.
    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout { timeout },
            _ => Error::Transport(err),
        }
    }

    /// Pass successful responses through; turn anything else into
    /// `Error::Status` with the service's message when it sent one.
    pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| preview(&body).to_owned());

        Err(Error::Status {
            status: status.as_u16(),
            message: if message.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_owned()
            } else {
                message
            },
        })
    }
}

/// First few hundred characters of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    body.char_indices()
        .nth(BODY_PREVIEW_CHARS)
        .map_or(body, |(idx, _)| &body[..idx])
}
