//! On-disk storage of uploaded files.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::UploadError;

/// Reduce a client-supplied file name to its final path component.
///
/// Both `/` and `\` count as separators so Windows-style names are handled
/// on every platform. Returns `None` when nothing usable remains.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned.to_string())
    }
}

const STAGING_DIR: &str = ".staging";

/// An upload written to the staging area, not yet in its final place.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    target: PathBuf,
}

impl StagedUpload {
    /// Where the bytes currently are.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where [`UploadStore::commit`] will move them.
    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// Writes uploads to `<root>/<session_id>/<file name>`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one session's uploads.
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.root.join(session_id.to_string())
    }

    /// Store `bytes` for `session_id`, returning the path written.
    ///
    /// An existing file with the same name is overwritten.
    pub async fn save(
        &self,
        session_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, UploadError> {
        let staged = self.stage(session_id, file_name, bytes).await?;
        self.commit(staged).await
    }

    /// Write `bytes` to a staging area of the session without touching any
    /// file already stored under the same name.
    pub async fn stage(
        &self,
        session_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StagedUpload, UploadError> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| UploadError::InvalidFileName(file_name.to_string()))?;
        let dir = self.session_dir(session_id);
        let staging = dir.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|source| UploadError::Storage { path: staging.clone(), source })?;

        let path = staging.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| UploadError::Storage { path: path.clone(), source })?;

        debug!(path = %path.display(), bytes = bytes.len(), "upload staged");
        Ok(StagedUpload { path, target: dir.join(name) })
    }

    /// Move a staged upload to its final path, replacing any previous file.
    pub async fn commit(&self, staged: StagedUpload) -> Result<PathBuf, UploadError> {
        tokio::fs::rename(&staged.path, &staged.target)
            .await
            .map_err(|source| UploadError::Storage { path: staged.target.clone(), source })?;
        debug!(path = %staged.target.display(), "upload stored");
        Ok(staged.target)
    }

    /// Delete a staged upload that will not be kept.
    pub async fn discard(&self, staged: StagedUpload) {
        if let Err(e) = tokio::fs::remove_file(&staged.path).await {
            warn!(path = %staged.path.display(), error = %e, "failed to remove staged upload");
        }
    }

    /// Remove every upload of `session_id`. Missing directories are ignored.
    pub async fn remove_session(&self, session_id: Uuid) -> Result<(), UploadError> {
        let dir = self.session_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(UploadError::Storage { path: dir, source }),
        }
    }
}
