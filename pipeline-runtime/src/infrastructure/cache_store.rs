// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use pipeline_domain::artifact::Artifact;
use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::{CacheStore, CachedEntryInfo};
use pipeline_domain::value_objects::{CacheId, Digest128, NodeHash};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, instrument, warn};

/// A filesystem-backed [`CacheStore`].
///
/// Every cached node gets three paths under `root`, all sharing the
/// same `<cache_id>` stem (`node_hash__source_closure__validation_token`):
/// `<stem>.p` (the bincode-serialized artifact), `<stem>.info` (a small
/// marker file recording when the entry was written, so `latest_for_node`
/// doesn't need to stat the `.p` file on every lookup), and a `.cache/`
/// subdirectory reserved for stages that need scratch space of their own
/// rather than a single opaque artifact.
///
/// Writes go to a temporary file and are renamed into place, so a
/// process killed mid-write never leaves a corrupt cache entry for a
/// concurrent reader to pick up.
pub struct FilesystemCacheStore {
    root: PathBuf,
}

impl FilesystemCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilesystemCacheStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, cache_id: &CacheId) -> PathBuf {
        self.root.join(format!("{}.p", cache_id.to_file_stem()))
    }

    fn info_path(&self, cache_id: &CacheId) -> PathBuf {
        self.root.join(format!("{}.info", cache_id.to_file_stem()))
    }

    async fn write_atomically(&self, final_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let temp_path = final_path.with_extension(format!(
            "{}.tmp",
            final_path.extension().and_then(|e| e.to_str()).unwrap_or("")
        ));
        tokio::fs::write(&temp_path, bytes).await?;
        tokio::fs::rename(&temp_path, final_path).await?;
        Ok(())
    }

    async fn entries_for_node(&self, node_hash: &NodeHash) -> std::io::Result<Vec<(CacheId, PathBuf)>> {
        let prefix = format!("{}__", node_hash.to_hex());
        let mut found = Vec::new();

        if !self.root.is_dir() {
            return Ok(found);
        }

        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().and_then(|e| e.to_str()) != Some("info") {
                continue;
            }
            if !stem.starts_with(&prefix) {
                continue;
            }
            if let Some(cache_id) = parse_cache_id_from_stem(stem) {
                found.push((cache_id, path));
            }
        }

        Ok(found)
    }
}

fn parse_cache_id_from_stem(stem: &str) -> Option<CacheId> {
    let mut parts = stem.splitn(3, "__");
    let node_hash_hex = parts.next()?;
    let source_closure_hex = parts.next()?;
    let validation_token_hex = parts.next()?;

    let node_hash = NodeHash::from_digest(Digest128::from_hex(node_hash_hex).ok()?);
    let source_closure = Digest128::from_hex(source_closure_hex).ok()?;
    let validation_token = Digest128::from_hex(validation_token_hex).ok()?;

    Some(CacheId::from_parts(node_hash, source_closure, validation_token))
}

#[async_trait]
impl CacheStore for FilesystemCacheStore {
    #[instrument(skip(self), fields(cache_id = %cache_id))]
    async fn load(&self, cache_id: &CacheId) -> Result<Option<Artifact>, PipelineError> {
        let path = self.artifact_path(cache_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let artifact = bincode::deserialize(&bytes)
                    .map_err(|e| PipelineError::SerializationError(e.to_string()))?;
                Ok(Some(artifact))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::from(e)),
        }
    }

    #[instrument(skip(self, artifact), fields(cache_id = %cache_id))]
    async fn store(&self, cache_id: &CacheId, artifact: &Artifact) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.root).await?;

        // Drop any prior entry for this node under a different cache id
        // before writing the new one, so a node never has two live
        // cached artifacts at once.
        for (old_id, info_path) in self.entries_for_node(&cache_id.node_hash()).await? {
            if old_id != *cache_id {
                let old_artifact_path = self.artifact_path(&old_id);
                let _ = tokio::fs::remove_file(&old_artifact_path).await;
                let _ = tokio::fs::remove_file(&info_path).await;
            }
        }

        let bytes =
            bincode::serialize(artifact).map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        self.write_atomically(&self.artifact_path(cache_id), &bytes).await?;
        self.write_atomically(&self.info_path(cache_id), b"").await?;

        debug!("stored cache entry");
        Ok(())
    }

    async fn contains(&self, cache_id: &CacheId) -> Result<bool, PipelineError> {
        Ok(tokio::fs::metadata(self.artifact_path(cache_id)).await.is_ok())
    }

    async fn latest_for_node(&self, node_hash: &NodeHash) -> Result<Option<CachedEntryInfo>, PipelineError> {
        let mut entries = self.entries_for_node(node_hash).await?;
        let Some((cache_id, info_path)) = entries.pop() else {
            return Ok(None);
        };

        let modified_at = tokio::fs::metadata(&info_path)
            .await
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(Some(CachedEntryInfo { cache_id, modified_at }))
    }

    #[instrument(skip(self), fields(cache_id = %cache_id))]
    async fn remove(&self, cache_id: &CacheId) -> Result<(), PipelineError> {
        for path in [self.artifact_path(cache_id), self.info_path(cache_id)] {
            remove_with_retry(&path, Removal::File).await;
        }
        Ok(())
    }

    /// Recreating the scratch directory is idempotent: an already-empty
    /// directory is left alone, and a directory left over from a
    /// previous run is cleared first so stale scratch files can't leak
    /// into a fresh execution.
    async fn scratch_dir_for(&self, node_hash: &NodeHash) -> Result<PathBuf, PipelineError> {
        let dir = self.root.join(format!("{}.cache", node_hash.to_hex()));
        if dir.exists() {
            remove_with_retry(&dir, Removal::Dir).await;
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}

/// Which kind of filesystem entry a retried removal targets.
#[derive(Clone, Copy)]
enum Removal {
    File,
    Dir,
}

/// Retries a removal a handful of times before giving up silently. On
/// some platforms a concurrent reader can briefly hold a handle open
/// after a rename, which surfaces as an access-denied error rather than
/// not-found; a short retry loop rides that out instead of failing the
/// run over a cache entry that is about to be replaced anyway. A
/// write-protected entry left behind by a stage under a scratch
/// directory hits the same error kind, so a permission-denied failure
/// also relaxes the entry's (and, for a directory, its descendants')
/// read-only bit before the next attempt.
async fn remove_with_retry(path: &Path, kind: Removal) {
    const ATTEMPTS: u32 = 5;
    for attempt in 0..ATTEMPTS {
        let result = match kind {
            Removal::File => tokio::fs::remove_file(path).await,
            Removal::Dir => tokio::fs::remove_dir_all(path).await,
        };
        match result {
            Ok(()) => return,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                if let Err(relax_err) = relax_permissions(path).await {
                    warn!(path = %path.display(), error = %relax_err, "failed to relax permissions before retrying removal");
                }
            }
            Err(_) => {}
        }
        tokio::time::sleep(std::time::Duration::from_millis(10 * (attempt as u64 + 1))).await;
    }
    warn!(path = %path.display(), "failed to remove path after retries");
}

/// Recursively clears the read-only bit under `path` so a write-protected
/// entry doesn't keep blocking removal on the next retry.
fn relax_permissions(path: &Path) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + '_>> {
    Box::pin(async move {
        let metadata = tokio::fs::metadata(path).await?;
        let mut perms = metadata.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            tokio::fs::set_permissions(path, perms).await?;
        }
        if metadata.is_dir() {
            let mut dir = tokio::fs::read_dir(path).await?;
            while let Some(entry) = dir.next_entry().await? {
                relax_permissions(&entry.path()).await?;
            }
        }
        Ok(())
    })
}
