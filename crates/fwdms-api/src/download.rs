// Image endpoint: stream a firmware image to disk.
//
// The body is written to a uniquely named `.part` file beside the
// destination and renamed over it only once every byte has been synced.
// Concurrent downloads of the same image each stage their own file, so the
// destination path never names a partial or interleaved image.

use std::ffi::OsString;
use std::path::Path;

use futures_util::StreamExt;
use tempfile::{Builder, NamedTempFile};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::client::DmsClient;
use crate::error::Error;

/// Progress of an in-flight image download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes written to disk so far.
    pub written: u64,
    /// Total size advertised by the service, if any.
    pub total: Option<u64>,
}

impl DmsClient {
    /// Download `version` for `device_id` to `dest`.
    ///
    /// Returns the number of bytes written. On error `dest` is untouched and
    /// the staging file is removed.
    pub async fn download_firmware(
        &self,
        device_id: &str,
        version: &str,
        dest: &Path,
    ) -> Result<u64, Error> {
        self.download_firmware_with_progress(device_id, version, dest, |_| {})
            .await
    }

    /// Like [`download_firmware`](Self::download_firmware), reporting
    /// progress after each chunk is written.
    pub async fn download_firmware_with_progress(
        &self,
        device_id: &str,
        version: &str,
        dest: &Path,
        mut progress: impl FnMut(DownloadProgress) + Send,
    ) -> Result<u64, Error> {
        let url = self.image_url(device_id, version)?;
        let resp = match self.get_stream(url).await {
            Err(Error::Status { status: 404, .. }) => {
                return Err(Error::NotFound {
                    version: version.to_owned(),
                });
            }
            other => other?,
        };

        let parent = dest.parent().unwrap_or(Path::new(""));
        fs::create_dir_all(parent).await.map_err(io_error(parent))?;

        // Each call stages into its own file; dropping `staged` deletes it.
        let (file, staged) = staging_file(dest, parent)?.into_parts();
        let written = self
            .write_body(resp, File::from_std(file), &staged, &mut progress)
            .await?;
        staged
            .persist(dest)
            .map_err(|e| io_error(dest)(e.error))?;

        info!(device_id, version, bytes = written, path = %dest.display(), "firmware downloaded");
        Ok(written)
    }

    /// Stream the response body into `path`, flushing and syncing before
    /// returning the byte count.
    async fn write_body(
        &self,
        resp: reqwest::Response,
        mut file: File,
        path: &Path,
        progress: &mut (impl FnMut(DownloadProgress) + Send),
    ) -> Result<u64, Error> {
        let total = resp.content_length();
        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.transport_error(e))?;
            file.write_all(&chunk).await.map_err(io_error(path))?;
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            progress(DownloadProgress { written, total });
        }

        if let Some(expected) = total {
            if written < expected {
                return Err(Error::Truncated {
                    expected,
                    received: written,
                });
            }
        }

        file.flush().await.map_err(io_error(path))?;
        file.sync_all().await.map_err(io_error(path))?;
        debug!(path = %path.display(), bytes = written, "image body written");
        Ok(written)
    }
}

/// Create a uniquely named staging file next to `dest`, e.g.
/// `foo/.1.2.0.bin.x7Gk2q.part` for `foo/1.2.0.bin`.
fn staging_file(dest: &Path, parent: &Path) -> Result<NamedTempFile, Error> {
    let mut prefix = OsString::from(".");
    prefix.push(dest.file_name().unwrap_or_default());
    prefix.push(".");
    Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(io_error(parent))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.display().to_string(),
        source,
    }
}
