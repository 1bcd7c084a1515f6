use crate::storage::{url_digest, StorageError, StorageResult};
use std::path::{Path, PathBuf};
use url::Url;

/// Where a page body was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    /// Hex SHA-1 of the source URL (not of the body)
    pub content_hash: String,

    pub path: PathBuf,

    pub bytes_written: u64,
}

/// Content-addressable store for raw response bodies
///
/// Files are keyed by URL identity: fetching the same URL again overwrites
/// its file in place, and two URLs serving identical bytes get two files.
/// Bodies are written verbatim.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    extension: String,
}

impl ContentStore {
    /// Opens a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>, extension: impl Into<String>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;

        Ok(Self {
            root,
            extension: extension.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location for a URL's body
    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.root
            .join(format!("{}.{}", url_digest(url.as_str()), self.extension))
    }

    /// Writes `body` as the stored content of `url`, replacing any previous body
    ///
    /// The bytes go to a temporary sibling first and are renamed into place,
    /// so the final path only ever holds a complete body.
    pub async fn put(&self, url: &Url, body: &[u8]) -> StorageResult<StoredPage> {
        let content_hash = url_digest(url.as_str());
        let path = self.path_for(url);
        let staging = path.with_extension(format!("{}.tmp", self.extension));

        tokio::fs::write(&staging, body)
            .await
            .map_err(|e| StorageError::io(&staging, e))?;

        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StorageError::io(&path, e));
        }

        tracing::debug!("Stored {} bytes for {} at {}", body.len(), url, path.display());

        Ok(StoredPage {
            content_hash,
            path,
            bytes_written: body.len() as u64,
        })
    }

    /// Reads back the stored body of `url`, if any
    pub async fn get(&self, url: &Url) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }
}
