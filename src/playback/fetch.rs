//! Fetch worker
//!
//! Downloads an episode's audio into a temporary file so the playback engine
//! can open it from local storage. The returned [`TempPath`] deletes the file
//! when dropped; [`discard`] removes it explicitly and logs failures.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Errors from downloading audio
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Download failed for {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to create temporary file in {dir}: {source}")]
    FileCreateFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write temporary file: {0}")]
    FileWriteFailed(#[source] std::io::Error),
}

/// Downloads remote audio into a session-scoped temporary file
#[derive(Debug, Clone)]
pub struct FetchWorker {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl FetchWorker {
    pub fn new(client: reqwest::Client, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Download `url` into a new temporary file and return its path
    pub async fn fetch(&self, url: &str) -> Result<TempPath, FetchError> {
        tracing::info!(url, "audio download started");

        let mut response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::RequestFailed {
                    url: url.to_string(),
                    source: e,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let temp = tempfile::Builder::new()
            .prefix("podtui-")
            .suffix(&format!(".{}", audio_extension(url)))
            .tempfile_in(&self.download_dir)
            .map_err(|e| FetchError::FileCreateFailed {
                dir: self.download_dir.clone(),
                source: e,
            })?;
        // From here on, dropping `path` on any error removes the partial file
        let (file, path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut bytes_downloaded: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::RequestFailed {
                url: url.to_string(),
                source: e,
            })?
        {
            file.write_all(&chunk)
                .await
                .map_err(FetchError::FileWriteFailed)?;
            bytes_downloaded += chunk.len() as u64;
        }

        file.flush().await.map_err(FetchError::FileWriteFailed)?;

        tracing::info!(url, bytes_downloaded, path = %path.display(), "audio download finished");
        Ok(path)
    }
}

/// Best-effort removal of a downloaded file
pub fn discard(path: TempPath) {
    let shown = path.display().to_string();
    match path.close() {
        Ok(()) => tracing::debug!(path = %shown, "temporary audio removed"),
        Err(e) => tracing::warn!(path = %shown, error = %e, "could not remove temporary audio"),
    }
}

/// File extension for the downloaded audio, guessed from the URL path
fn audio_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);

    last_segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "mp3".to_string())
}
