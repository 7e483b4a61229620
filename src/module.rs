//! The module contract: dry-run / apply / rollback over one
//! configuration domain, plus the diff types those operations exchange.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::snapshot::SnapshotStore;
use similar::TextDiff;
use std::fmt;
use std::path::{Path, PathBuf};

/// Drift for a single file: what is on disk vs what the policy wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub old: String,
    pub new: String,
}

impl FileDiff {
    /// Render a unified diff for display.
    pub fn render(&self) -> String {
        let diff = TextDiff::from_lines(&self.old, &self.new);
        diff.unified_diff()
            .header(
                &format!("{} (current)", self.path.display()),
                &format!("{} (desired)", self.path.display()),
            )
            .to_string()
    }
}

/// Aggregated outcome of one or more dry-runs. Produced fresh per call,
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct DryRunResult {
    pub diffs: Vec<FileDiff>,
    pub warnings: Vec<String>,
}

impl DryRunResult {
    /// True when no module reported drift. Warnings alone do not make a
    /// result dirty.
    pub fn is_clean(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn merge(&mut self, other: DryRunResult) {
        self.diffs.extend(other.diffs);
        self.warnings.extend(other.warnings);
    }
}

/// A named unit implementing the three-operation contract for one
/// configuration domain.
///
/// Modules are stateless holders of a policy subset plus distro identity,
/// constructed once per run. The contract:
///
/// - `dry_run` compares policy-derived desired state byte-for-byte
///   against persisted state and reports empty diffs exactly when they
///   are equal. It never mutates anything and needs no privilege.
/// - `apply` repeats the comparison and returns immediately when clean:
///   no privilege check, no snapshot, no write. On drift it gates on
///   privilege, snapshots the pre-change file, syntax-checks where the
///   target subsystem offers a checker, writes atomically, and fires a
///   best-effort reload.
/// - `rollback` restores the backed-up file from the latest snapshot.
pub trait Module: fmt::Debug {
    fn name(&self) -> &'static str;

    fn dry_run(&self, ctx: &RunContext) -> Result<DryRunResult>;

    fn apply(&self, ctx: &RunContext) -> Result<()>;

    fn rollback(&self, ctx: &RunContext) -> Result<()>;
}

/// Boxed module for type-erased storage.
pub type BoxedModule = Box<dyn Module>;

/// Current bytes of a config file; a file that does not exist yet reads
/// as empty, which the diff protocol treats as maximal drift.
pub(crate) fn read_or_empty(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

/// Write `content` to `path` via a sibling temp file and rename, so a
/// crash mid-write never leaves a truncated config behind.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = match path.file_name() {
        Some(base) => {
            let mut name = base.to_os_string();
            name.push(".tmp");
            path.with_file_name(name)
        }
        None => path.with_file_name("hardkit.tmp"),
    };
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Restore `path` from the most recent snapshot. Fails with NotFound
/// when no snapshot exists or the snapshot holds no backup of `path`.
pub(crate) fn restore_latest(ctx: &RunContext, path: &Path) -> Result<()> {
    let latest = ctx.snapshots.latest()?;
    let entry = SnapshotStore::entry(&latest, path);
    if !entry.exists() {
        return Err(Error::NotFound(format!(
            "no backup of {} in {}",
            path.display(),
            latest.display()
        )));
    }
    ctx.snapshots.restore_file(&entry, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_shows_both_sides() {
        let diff = FileDiff {
            path: PathBuf::from("/etc/ssh/sshd_config"),
            old: "Port 22\n".into(),
            new: "Port 2222\n".into(),
        };
        let text = diff.render();
        assert!(text.contains("-Port 22"));
        assert!(text.contains("+Port 2222"));
        assert!(text.contains("/etc/ssh/sshd_config (desired)"));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf");
        std::fs::write(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        // No temp litter left behind.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_reads_empty() {
        assert_eq!(read_or_empty(Path::new("/nonexistent/conf")), "");
    }
}
