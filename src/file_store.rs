use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use nanoid::nanoid;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub created_at: Instant,
}

/// Generated documents awaiting download, keyed by a random file id.
///
/// Entries expire after `ttl`; expired entries are invisible to [`lookup`]
/// and are deleted from disk by [`sweep`].
///
/// [`lookup`]: FileStore::lookup
/// [`sweep`]: FileStore::sweep
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    ttl: Option<Duration>,
    entries: DashMap<String, StoredFile>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` to a fresh file and registers it. Returns the file id.
    pub async fn save(&self, bytes: &[u8], extension: &str) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("document_{}.{extension}", nanoid!()));
        tokio::fs::write(&path, bytes).await?;

        let file_id = nanoid!();
        log::info!("stored generated file {} as {}", path.display(), file_id);
        self.entries.insert(
            file_id.clone(),
            StoredFile {
                path,
                created_at: Instant::now(),
            },
        );
        Ok(file_id)
    }

    pub fn lookup(&self, file_id: &str) -> Option<PathBuf> {
        let entry = self.entries.get(file_id)?;
        if self.is_expired(&entry) {
            return None;
        }
        Some(entry.path.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, file: &StoredFile) -> bool {
        match self.ttl {
            Some(ttl) => file.created_at.elapsed() >= ttl,
            None => false,
        }
    }

    /// Drops expired entries and deletes their files. Returns how many
    /// entries were removed.
    pub async fn sweep(&self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| self.is_expired(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for file_id in expired {
            let Some((_, file)) = self.entries.remove(&file_id) else {
                continue;
            };
            removed += 1;
            if let Err(e) = tokio::fs::remove_file(&file.path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    log::warn!("failed to delete expired file {}: {}", file.path.display(), e);
                }
            }
        }
        if removed > 0 {
            log::info!("evicted {removed} expired generated files");
        }
        removed
    }

    /// Sweeps every `every` until the returned task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}
