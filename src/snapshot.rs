//! File snapshots backing best-effort rollback.
//!
//! A snapshot is a directory named by a second-resolution timestamp,
//! holding verbatim copies of files as they were before a change. The
//! fixed-width stamp makes lexicographic order equal to chronological
//! order, so "latest" is just the greatest name. Snapshots are created
//! lazily (only when an apply detects real drift) and never pruned here.

use crate::error::{Error, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

const DEFAULT_ROOT: &str = "/var/backups/hardkit";
const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Store of timestamped backup directories under one root.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_ROOT))
    }
}

impl SnapshotStore {
    /// Store rooted at an arbitrary directory. The directory is created
    /// on first use, not here.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new snapshot directory named by the current timestamp,
    /// creating the root first if needed. Two calls within the same
    /// second share a directory.
    pub fn create_dir(&self) -> Result<PathBuf> {
        let stamp = Local::now().format(STAMP_FORMAT).to_string();
        let dir = self.root.join(stamp);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Copy `src`'s current bytes into `dir` under its base filename.
    ///
    /// Two files sharing a base name within one snapshot collide; the
    /// last write wins. Returns the backup path.
    pub fn backup_file(&self, dir: &Path, src: &Path) -> Result<PathBuf> {
        let dst = Self::entry(dir, src);
        let bytes = std::fs::read(src)?;
        std::fs::write(&dst, bytes)?;
        Ok(dst)
    }

    /// Overwrite `dst` with previously captured bytes from `src`.
    pub fn restore_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let bytes = std::fs::read(src)?;
        std::fs::write(dst, bytes)?;
        Ok(())
    }

    /// Enumerate snapshot directories, sorted oldest first. A missing
    /// root means no snapshots yet.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.path())
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    /// The most recent snapshot directory, or NotFound when none exist.
    pub fn latest(&self) -> Result<PathBuf> {
        self.list()?
            .pop()
            .ok_or_else(|| Error::NotFound("no snapshots found".into()))
    }

    /// Where a backup of `src` lives inside snapshot `dir`.
    pub fn entry(dir: &Path, src: &Path) -> PathBuf {
        match src.file_name() {
            Some(base) => dir.join(base),
            None => dir.to_path_buf(),
        }
    }
}
