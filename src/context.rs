//! Run context handed to every module operation.

use crate::error::{Error, Result};
use crate::exec::CancelToken;
use crate::snapshot::SnapshotStore;
use std::path::PathBuf;

/// Shared per-run state: cancellation, the snapshot store, and whether
/// this process may perform privileged writes.
///
/// The privilege flag is probed once at construction (effective uid 0)
/// rather than per write, and is overridable so composition roots and
/// tests can run the engine against scratch paths without root.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub cancel: CancelToken,
    pub snapshots: SnapshotStore,
    privileged: bool,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Context with the default snapshot root and the real euid probe.
    pub fn new() -> Self {
        // SAFETY: geteuid has no failure modes and touches no memory.
        let privileged = unsafe { libc::geteuid() } == 0;
        Self {
            cancel: CancelToken::new(),
            snapshots: SnapshotStore::default(),
            privileged,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_snapshot_root(mut self, root: PathBuf) -> Self {
        self.snapshots = SnapshotStore::new(root);
        self
    }

    /// Override the privilege probe. Intended for composition roots that
    /// already hold a privileged broker, and for tests.
    pub fn with_privilege(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Gate for privileged writes.
    pub fn require_privilege(&self, target: &std::path::Path) -> Result<()> {
        if self.privileged {
            Ok(())
        } else {
            Err(Error::needs_root(target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_gate() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("f");

        let ctx = RunContext::new()
            .with_snapshot_root(tmp.path().join("snaps"))
            .with_privilege(false);
        assert!(matches!(
            ctx.require_privilege(&target),
            Err(Error::Permission(_))
        ));

        let ctx = ctx.with_privilege(true);
        assert!(ctx.require_privilege(&target).is_ok());
    }
}
