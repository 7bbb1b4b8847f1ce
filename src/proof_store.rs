//! Filesystem storage for uploaded proof images.
//!
//! Files live under `<root>/<key>/<platform><ext>`, where `key` is first
//! an ephemeral session UUID and later the permanent ticket code. The
//! directory rename in [`ProofStore::rekey`] happens inside the
//! registration flow, before the database transaction commits, so a
//! failed rename aborts the registration instead of leaving proofs
//! orphaned under a session key.

use std::path::{Path, PathBuf};

use crate::domain::Platform;
use crate::error::AppError;

/// Filesystem-backed proof image storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct ProofStore {
    root: PathBuf,
}

impl ProofStore {
    /// Creates a store rooted at `root`. The directory is created lazily
    /// on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes proof bytes for `key` and returns the relative path stored
    /// in the database (`/uploads/<key>/<platform><ext>`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unsafe keys and
    /// [`AppError::Internal`] on filesystem failures.
    pub fn save(
        &self,
        key: &str,
        platform: Platform,
        ext: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        validate_key(key)?;

        let dir = self.root.join(key);
        std::fs::create_dir_all(&dir)
            .map_err(|e| AppError::Internal(format!("proof dir create failed: {e}")))?;

        let filename = format!("{platform}{ext}");
        let path = dir.join(&filename);
        std::fs::write(&path, bytes)
            .map_err(|e| AppError::Internal(format!("proof write failed: {e}")))?;

        Ok(format!("/uploads/{key}/{filename}"))
    }

    /// Renames the proof directory from `old_key` to `new_key`. A missing
    /// source directory is not an error (the registrant may have skipped
    /// uploads).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unsafe keys and
    /// [`AppError::Internal`] if the rename itself fails.
    pub fn rekey(&self, old_key: &str, new_key: &str) -> Result<(), AppError> {
        validate_key(old_key)?;
        validate_key(new_key)?;

        let old_dir = self.root.join(old_key);
        if !old_dir.exists() {
            return Ok(());
        }
        let new_dir = self.root.join(new_key);
        std::fs::rename(&old_dir, &new_dir)
            .map_err(|e| AppError::Internal(format!("proof rekey failed: {e}")))
    }

    /// Removes the proof directory for `key`, ignoring a missing one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unsafe keys and
    /// [`AppError::Internal`] on filesystem failures.
    pub fn remove(&self, key: &str) -> Result<(), AppError> {
        validate_key(key)?;
        let dir = self.root.join(key);
        if !dir.exists() {
            return Ok(());
        }
        std::fs::remove_dir_all(&dir)
            .map_err(|e| AppError::Internal(format!("proof remove failed: {e}")))
    }
}

/// Rejects keys that could escape the upload root.
fn validate_key(key: &str) -> Result<(), AppError> {
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains("..")
    {
        return Err(AppError::Validation(format!("invalid storage key: {key}")));
    }
    Ok(())
}
