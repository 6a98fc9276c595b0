//! Product image download and storage.
//!
//! Images land in `pictures/<sanitized-category>/<sanitized-title>.jpg`,
//! deduplicated by that key: an existing file is reused, never overwritten.
//! Writes go through a temp name and a rename so a crash cannot leave a
//! truncated image at the final path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::AssetError;
use crate::http_client::HttpClient;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Downloads image assets into per-category directories.
pub struct AssetDownloader {
    http: Arc<HttpClient>,
    pictures_root: PathBuf,
}

impl AssetDownloader {
    pub fn new(http: Arc<HttpClient>, output_root: &Path) -> Self {
        Self {
            http,
            pictures_root: output_root.join("pictures"),
        }
    }

    /// Fetch `image_url` and store it under the `(category, title)` key,
    /// returning the local path. Idempotent per key: a file already present
    /// skips both the fetch and the write.
    pub async fn download(
        &self,
        image_url: &Url,
        category: &str,
        title: &str,
        token: &CancellationToken,
    ) -> Result<PathBuf, AssetError> {
        let dir = self.pictures_root.join(sanitize_component(category));
        let file_name = format!("{}.jpg", sanitize_component(title));
        let path = dir.join(&file_name);

        if fs::try_exists(&path).await.unwrap_or(false) {
            debug!("image already present, reusing {}", path.display());
            return Ok(path);
        }

        fs::create_dir_all(&dir).await.map_err(|source| AssetError::Io {
            path: dir.clone(),
            source,
        })?;

        let bytes = self
            .http
            .fetch_with_retry(image_url, token)
            .await
            .map_err(AssetError::Fetch)?;

        let tmp = dir.join(format!(
            ".{file_name}.{}.tmp",
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, &bytes).await.map_err(|source| AssetError::Io {
            path: tmp.clone(),
            source,
        })?;

        // A concurrent product with the same key may have won the race while
        // we were fetching; the existing file takes precedence.
        if fs::try_exists(&path).await.unwrap_or(false) {
            let _ = fs::remove_file(&tmp).await;
            debug!("image appeared concurrently, reusing {}", path.display());
            return Ok(path);
        }

        fs::rename(&tmp, &path).await.map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;

        debug!("stored image at {}", path.display());
        Ok(path)
    }
}

/// Replace filesystem-hostile characters with `-` so titles and category
/// names are safe as path components.
pub fn sanitize_component(raw: &str) -> String {
    let sanitized: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        "untitled".to_string()
    } else {
        sanitized
    }
}
