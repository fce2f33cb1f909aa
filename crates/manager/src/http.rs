//! Streaming HTTP fetcher for mod archives and images

use crate::config::ManagerConfig;
use crate::error::WorkflowError;
use crate::workflow::TaskProgress;
use futures::StreamExt;
use reqwest::Client;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// HTTP client wrapper shared by download and update-check tasks.
///
/// Files are streamed to a `.part` sibling and renamed into place on
/// completion, so a torn download never shadows a complete archive.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ManagerConfig) -> Self {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Remote size of a resource, from a HEAD request with a GET fallback
    /// for servers that reject HEAD
    pub async fn content_length(&self, url: &Url) -> Result<Option<u64>, WorkflowError> {
        debug!(%url, "querying content length");
        match self
            .client
            .head(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => {
                if let Some(length) = response.content_length() {
                    return Ok(Some(length));
                }
            }
            Err(e) => debug!(%url, error = %e, "HEAD request failed, falling back to GET"),
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| http_error(url, e))?;
        Ok(response.content_length())
    }

    /// Stream `url` into `dest`, ticking `progress` one unit per byte
    pub async fn download_to(
        &self,
        url: &Url,
        dest: &Path,
        progress: &TaskProgress,
    ) -> Result<u64, WorkflowError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        let temp_path = dest.with_extension("part");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| http_error(url, e))?;

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| http_error(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| io_error(&temp_path, e))?;
            downloaded += chunk.len() as u64;
            progress.tick(chunk.len() as u64);
        }
        file.flush().await.map_err(|e| io_error(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, dest)
            .await
            .map_err(|e| io_error(dest, e))?;
        debug!(%url, dest = %dest.display(), bytes = downloaded, "download complete");
        Ok(downloaded)
    }
}

fn http_error(url: &Url, source: reqwest::Error) -> WorkflowError {
    WorkflowError::Http {
        url: url.to_string(),
        source,
    }
}

fn io_error(path: &Path, source: io::Error) -> WorkflowError {
    WorkflowError::Io {
        path: path.to_path_buf(),
        source,
    }
}
