use crate::snapshot::ScoreSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not find cache directory")]
    NoCacheDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub snapshot: ScoreSnapshot,
    pub cached_at: i64, // Unix timestamp
}

/// Last published snapshot, kept so the watch has something to show while
/// a fresh cycle runs
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub async fn new() -> Result<Self, CacheError> {
        let cache_dir = dirs::cache_dir()
            .ok_or(CacheError::NoCacheDir)?
            .join("ourawatch");
        Self::at(cache_dir).await
    }

    /// Cache rooted at an explicit directory
    pub async fn at(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).await?;
        Ok(Self { cache_dir })
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join("snapshot.json")
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub async fn get_snapshot(&self) -> Result<Option<CachedSnapshot>, CacheError> {
        let path = self.path();
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        let data = fs::read_to_string(&path).await?;
        let cached: CachedSnapshot = serde_json::from_str(&data)?;
        Ok(Some(cached))
    }

    pub async fn set_snapshot(&self, snapshot: &ScoreSnapshot) -> Result<(), CacheError> {
        let cached = CachedSnapshot {
            snapshot: snapshot.clone(),
            cached_at: chrono::Utc::now().timestamp(),
        };

        let json = serde_json::to_string_pretty(&cached)?;
        fs::write(self.path(), json).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        let path = self.path();
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
}
