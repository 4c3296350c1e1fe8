//! Idempotent filesystem staging: run-directory skeletons, copy, symlink, remove.
//!
//! Every primitive here is safe to re-run after a partial failure. There is no
//! transaction log, so re-entrancy is the only recovery mechanism.

use crate::error::{OrchestratorError, Result};
use crate::models::{SkipReason, StagingOutcome};
use crate::system::RunDirectory;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Create a directory, treating "already exists" as success.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(OrchestratorError::DirectoryCreation {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Creates the fixed run-directory skeleton.
pub fn build_run_directory(run: &RunDirectory) -> Result<()> {
    ensure_dir(run.root())?;
    for sub in run.subdirectories() {
        ensure_dir(&sub)?;
    }
    log::debug!("[Stage] [TREE] Run directory ready: {}", run.root().display());
    Ok(())
}

/// Copy `source` into `dest_dir`, keeping its file name.
///
/// Skips when the source is a directory or when the destination directory is
/// absent; callers rely on the latter to tolerate partially built trees.
pub fn copy_into(source: &Path, dest_dir: &Path) -> Result<StagingOutcome> {
    if source.is_dir() {
        return Ok(StagingOutcome::Skipped(SkipReason::SourceIsDirectory));
    }
    if !dest_dir.is_dir() {
        log::debug!(
            "[Stage] [COPY] Skipping {}: destination {} missing",
            source.display(),
            dest_dir.display()
        );
        return Ok(StagingOutcome::Skipped(SkipReason::DestinationMissing));
    }
    let file_name = match source.file_name() {
        Some(name) => name,
        None => return Ok(StagingOutcome::Skipped(SkipReason::SourceIsDirectory)),
    };
    let dest = dest_dir.join(file_name);
    match fs::copy(source, &dest) {
        Ok(_) => Ok(StagingOutcome::Applied),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Ok(StagingOutcome::Skipped(SkipReason::AlreadyPresent))
        }
        Err(source_err) => Err(OrchestratorError::Staging {
            action: "copy",
            path: source.to_path_buf(),
            source: source_err,
        }),
    }
}

/// Create a symbolic link at `dest` pointing at `source`.
///
/// An existing entry at `dest` counts as already satisfied.
pub fn link(source: &Path, dest: &Path) -> Result<StagingOutcome> {
    if source.is_dir() {
        return Ok(StagingOutcome::Skipped(SkipReason::SourceIsDirectory));
    }
    match std::os::unix::fs::symlink(source, dest) {
        Ok(()) => Ok(StagingOutcome::Applied),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Ok(StagingOutcome::Skipped(SkipReason::AlreadyPresent))
        }
        Err(source_err) => Err(OrchestratorError::Staging {
            action: "link",
            path: dest.to_path_buf(),
            source: source_err,
        }),
    }
}

/// Best-effort removal of a file or link. Never fails.
pub fn remove(path: &Path) -> StagingOutcome {
    match fs::remove_file(path) {
        Ok(()) => StagingOutcome::Applied,
        Err(e) if e.kind() == ErrorKind::NotFound => StagingOutcome::Skipped(SkipReason::Absent),
        Err(e) => {
            log::warn!("[Stage] [REMOVE] Could not remove {}: {}", path.display(), e);
            StagingOutcome::Skipped(SkipReason::RemoveFailed)
        }
    }
}

/// Remove `path` only if it is a symbolic link pointing at `target`.
///
/// Regular files and links to anything else are left in place.
pub fn unlink(path: &Path, target: &Path) -> StagingOutcome {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => StagingOutcome::Skipped(SkipReason::Absent),
        Err(e) => {
            log::warn!("[Stage] [REMOVE] Could not inspect {}: {}", path.display(), e);
            StagingOutcome::Skipped(SkipReason::RemoveFailed)
        }
        Ok(meta) if !meta.file_type().is_symlink() => {
            log::warn!("[Stage] [REMOVE] Keeping {}: not a link", path.display());
            StagingOutcome::Skipped(SkipReason::NotOurLink)
        }
        Ok(_) => match fs::read_link(path) {
            Ok(points_to) if points_to == target => remove(path),
            _ => {
                log::warn!(
                    "[Stage] [REMOVE] Keeping {}: does not point at {}",
                    path.display(),
                    target.display()
                );
                StagingOutcome::Skipped(SkipReason::NotOurLink)
            }
        },
    }
}

/// Sorted entries of a directory. Sorting keeps stage effects deterministic
/// regardless of the filesystem's listing order.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let listing_err = |source| OrchestratorError::Listing {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_err)? {
        entries.push(entry.map_err(listing_err)?.path());
    }
    entries.sort();
    Ok(entries)
}

/// Like `list_entries`, but a missing directory is an empty listing.
///
/// Used for optional sources whose absence only produces an incomplete tree.
pub fn list_entries_or_empty(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        log::warn!("[Stage] [LIST] Source directory missing, nothing staged from {}", dir.display());
        return Ok(Vec::new());
    }
    list_entries(dir)
}

/// Copy every entry of `source_dir` into `dest_dir` (directories are skipped).
pub fn copy_all(source_dir: &Path, dest_dir: &Path) -> Result<Vec<StagingOutcome>> {
    list_entries_or_empty(source_dir)?
        .iter()
        .map(|source| copy_into(source, dest_dir))
        .collect()
}
