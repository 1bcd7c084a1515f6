use crate::extract::CompanyRecord;
use crate::storage::{url_digest, StorageError, StorageResult};
use std::path::{Path, PathBuf};

/// Writes extracted records as pretty JSON, one file per source URL
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Opens a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<sha1(source_url)>.json`
    pub fn path_for(&self, source_url: &str) -> PathBuf {
        self.root.join(format!("{}.json", url_digest(source_url)))
    }

    /// Saves `record`, replacing any earlier record for the same source URL
    pub async fn save(&self, record: &CompanyRecord) -> StorageResult<PathBuf> {
        let path = self.path_for(&record.source_url);
        let staging = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record)?;

        tokio::fs::write(&staging, &json)
            .await
            .map_err(|e| StorageError::io(&staging, e))?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StorageError::io(&path, e));
        }

        Ok(path)
    }

    /// Loads the record saved for `source_url`, if any
    pub async fn load(&self, source_url: &str) -> StorageResult<Option<CompanyRecord>> {
        let path = self.path_for(source_url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }
}
