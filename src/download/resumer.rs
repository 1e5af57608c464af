//! Completion markers and artifact materialization.
//!
//! An artifact file at its canonical path with non-zero size *is* the record
//! that an item is done. Bytes are streamed to a `.part` sibling and renamed
//! into place only after a complete, flushed transfer, so an interrupted run
//! never leaves something a later run would mistake for a finished artifact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use crate::gateway::ApiClient;

use super::error::DownloadError;
use super::filename::sanitize_filename;

/// Extension of exported artifacts.
pub const ARTIFACT_EXTENSION: &str = "fbx";

const PARTIAL_SUFFIX: &str = ".part";

/// Maps items onto canonical artifact paths and writes artifacts there.
#[derive(Debug, Clone)]
pub struct DownloadResumer {
    output_dir: PathBuf,
    extension: String,
}

impl DownloadResumer {
    /// Creates a resumer writing `.fbx` artifacts into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: ARTIFACT_EXTENSION.to_string(),
        }
    }

    /// Overrides the artifact extension (without the dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Directory artifacts are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Canonical artifact path for a display name.
    #[must_use]
    pub fn canonical_path(&self, name: &str) -> PathBuf {
        let stem = sanitize_filename(name);
        if self.extension.is_empty() {
            self.output_dir.join(stem)
        } else {
            self.output_dir.join(format!("{stem}.{}", self.extension))
        }
    }

    /// Returns the artifact size if a completion marker exists at `path`.
    ///
    /// Zero-length files and non-files do not count.
    pub async fn existing_marker(&self, path: &Path) -> Option<u64> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        (metadata.is_file() && metadata.len() > 0).then_some(metadata.len())
    }

    /// Streams the artifact at `url` to `path`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on request, stream, or file system failure and
    /// for empty bodies. No file is left at `path` in any error case.
    #[instrument(skip(self, client), fields(path = %path.display()))]
    pub async fn materialize(
        &self,
        client: &ApiClient,
        url: &str,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let response = client
            .fetch_artifact(url)
            .await
            .map_err(DownloadError::fetch)?;

        let partial = partial_path(path);
        let mut file = File::create(&partial)
            .await
            .map_err(|e| DownloadError::io(&partial, e))?;

        let stream_result = stream_to_file(&mut file, response, url, &partial).await;
        drop(file);
        let bytes_written = match stream_result {
            Ok(0) => Err(DownloadError::empty_body(url)),
            other => other,
        };
        let bytes_written = match bytes_written {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %partial.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(error);
            }
        };

        if let Err(error) = tokio::fs::rename(&partial, path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(DownloadError::io(path, error));
        }
        info!(bytes = bytes_written, "artifact saved");
        Ok(bytes_written)
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::stream(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    writer
        .get_mut()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("artifact"), OsString::from);
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::gateway::GatewayConfig;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_canonical_path_sanitizes_name() {
        let resumer = DownloadResumer::new("/out");
        assert_eq!(
            resumer.canonical_path("Walk/Run \"fast\""),
            PathBuf::from("/out/Walk-Run 'fast'.fbx")
        );
    }

    #[test]
    fn test_canonical_path_custom_extension() {
        let resumer = DownloadResumer::new("/out").with_extension("");
        assert_eq!(resumer.canonical_path("Idle"), PathBuf::from("/out/Idle"));
    }

    #[test]
    fn test_partial_path_is_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/Idle.fbx")),
            PathBuf::from("/out/Idle.fbx.part")
        );
    }

    #[tokio::test]
    async fn test_existing_marker_requires_non_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let resumer = DownloadResumer::new(temp_dir.path());
        let path = resumer.canonical_path("Idle");

        assert_eq!(resumer.existing_marker(&path).await, None);
        std::fs::write(&path, b"").unwrap();
        assert_eq!(resumer.existing_marker(&path).await, None);
        std::fs::write(&path, b"FBX").unwrap();
        assert_eq!(resumer.existing_marker(&path).await, Some(3));
        assert_eq!(resumer.existing_marker(temp_dir.path()).await, None);
    }

    #[test]
    fn test_materialize_invalid_url_leaves_no_marker() {
        let temp_dir = TempDir::new().unwrap();
        let resumer = DownloadResumer::new(temp_dir.path());
        let client = ApiClient::new(&GatewayConfig::default()).unwrap();
        let target = resumer.canonical_path("Broken");

        let result = tokio_test::block_on(resumer.materialize(&client, "not-a-valid-url", &target));

        assert!(matches!(result, Err(DownloadError::Fetch { .. })));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_materialize_writes_artifact_atomically() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(url_path("/results/idle.fbx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Kaydara FBX".to_vec()))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let resumer = DownloadResumer::new(temp_dir.path().join("out"));
        let client = ApiClient::new(&GatewayConfig::new(mock_server.uri())).unwrap();
        let target = resumer.canonical_path("Idle");

        let bytes = resumer
            .materialize(
                &client,
                &format!("{}/results/idle.fbx", mock_server.uri()),
                &target,
            )
            .await
            .unwrap();

        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read(&target).unwrap(), b"Kaydara FBX");
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn test_materialize_error_status_leaves_no_marker() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(url_path("/results/expired.fbx"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let resumer = DownloadResumer::new(temp_dir.path());
        let client = ApiClient::new(&GatewayConfig::new(mock_server.uri())).unwrap();
        let target = resumer.canonical_path("Expired");

        let result = resumer
            .materialize(
                &client,
                &format!("{}/results/expired.fbx", mock_server.uri()),
                &target,
            )
            .await;

        assert!(matches!(result, Err(DownloadError::Fetch { .. })));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn test_materialize_empty_body_leaves_no_marker() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(url_path("/results/empty.fbx"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let resumer = DownloadResumer::new(temp_dir.path());
        let client = ApiClient::new(&GatewayConfig::new(mock_server.uri())).unwrap();
        let target = resumer.canonical_path("Empty");

        let result = resumer
            .materialize(
                &client,
                &format!("{}/results/empty.fbx", mock_server.uri()),
                &target,
            )
            .await;

        assert!(matches!(result, Err(DownloadError::EmptyBody { .. })));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn test_materialize_timeout_leaves_no_marker() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(url_path("/results/slow.fbx"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let resumer = DownloadResumer::new(temp_dir.path());
        let config = GatewayConfig::new(mock_server.uri())
            .with_request_timeout(std::time::Duration::from_millis(100));
        let client = ApiClient::new(&config).unwrap();
        let target = resumer.canonical_path("Slow");

        let result = resumer
            .materialize(
                &client,
                &format!("{}/results/slow.fbx", mock_server.uri()),
                &target,
            )
            .await;

        assert!(result.unwrap_err().is_timeout());
        assert!(!target.exists());
    }
}
