//! Kernel parameter hardening via a sysctl.d drop-in.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::exec;
use crate::module::{self, DryRunResult, FileDiff, Module};
use crate::policy::{Policy, SysctlPolicy};
use std::fmt::Write as _;
use std::path::PathBuf;

const DROPIN: &str = "/etc/sysctl.d/60-hardkit.conf";

#[derive(Debug)]
pub struct SysctlModule {
    policy: SysctlPolicy,
    path: PathBuf,
}

impl SysctlModule {
    pub fn new(policy: &Policy) -> Self {
        Self {
            policy: policy.sysctl.clone(),
            path: PathBuf::from(DROPIN),
        }
    }

    /// Point the module at an alternate drop-in path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Render `key = value` lines in key order. The params map is
    /// ordered, so output is byte-identical regardless of how the policy
    /// document listed the keys.
    fn desired(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.policy.params {
            let _ = writeln!(out, "{key} = {value}");
        }
        out
    }

    fn drift(&self) -> Option<FileDiff> {
        let old = module::read_or_empty(&self.path);
        let new = self.desired();
        if old == new {
            None
        } else {
            Some(FileDiff {
                path: self.path.clone(),
                old,
                new,
            })
        }
    }
}

impl Module for SysctlModule {
    fn name(&self) -> &'static str {
        "sysctl"
    }

    fn dry_run(&self, _ctx: &RunContext) -> Result<DryRunResult> {
        Ok(DryRunResult {
            diffs: self.drift().into_iter().collect(),
            warnings: Vec::new(),
        })
    }

    fn apply(&self, ctx: &RunContext) -> Result<()> {
        let Some(diff) = self.drift() else {
            return Ok(());
        };
        ctx.require_privilege(&self.path)?;

        let snap = ctx.snapshots.create_dir()?;
        // First apply: there may be no drop-in to back up yet.
        match ctx.snapshots.backup_file(&snap, &self.path) {
            Ok(_) => {}
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        module::write_atomic(&self.path, &diff.new)?;

        // System-wide reload of kernel parameters, best-effort.
        if exec::lookup("sysctl") {
            exec::run_best_effort(&ctx.cancel, "sysctl", &["--system"])?;
        }
        Ok(())
    }

    fn rollback(&self, ctx: &RunContext) -> Result<()> {
        module::restore_latest(ctx, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Profile;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn policy_with(pairs: &[(&str, &str)]) -> Policy {
        let mut params = BTreeMap::new();
        for (k, v) in pairs {
            params.insert((*k).to_string(), (*v).to_string());
        }
        Policy {
            name: "test".into(),
            profile: Profile::Prod,
            ssh: crate::policy::SshPolicy {
                port: 22,
                ..Default::default()
            },
            sysctl: SysctlPolicy { params },
            firewall: Default::default(),
            meta: BTreeMap::new(),
        }
    }

    fn test_ctx(dir: &Path) -> RunContext {
        RunContext::new()
            .with_snapshot_root(dir.join("snapshots"))
            .with_privilege(true)
    }

    #[test]
    fn rendering_is_sorted_and_insertion_order_independent() {
        let forward = policy_with(&[
            ("kernel.kptr_restrict", "2"),
            ("net.ipv4.ip_forward", "0"),
            ("fs.protected_symlinks", "1"),
        ]);
        let reverse = policy_with(&[
            ("fs.protected_symlinks", "1"),
            ("net.ipv4.ip_forward", "0"),
            ("kernel.kptr_restrict", "2"),
        ]);

        let a = SysctlModule::new(&forward).desired();
        let b = SysctlModule::new(&reverse).desired();
        assert_eq!(a, b);
        assert_eq!(
            a,
            "fs.protected_symlinks = 1\nkernel.kptr_restrict = 2\nnet.ipv4.ip_forward = 0\n"
        );
    }

    #[test]
    fn first_apply_tolerates_missing_dropin() {
        let tmp = tempfile::tempdir().unwrap();
        let pol = policy_with(&[("net.ipv4.ip_forward", "0")]);
        let m = SysctlModule::new(&pol).with_path(tmp.path().join("60-hardkit.conf"));
        let ctx = test_ctx(tmp.path());

        m.apply(&ctx).unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("60-hardkit.conf")).unwrap(),
            "net.ipv4.ip_forward = 0\n"
        );
        // Snapshot dir exists even though there was nothing to back up.
        assert_eq!(ctx.snapshots.list().unwrap().len(), 1);
    }

    #[test]
    fn second_apply_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let pol = policy_with(&[("net.ipv4.ip_forward", "0")]);
        let m = SysctlModule::new(&pol).with_path(tmp.path().join("60-hardkit.conf"));
        let ctx = test_ctx(tmp.path());

        m.apply(&ctx).unwrap();
        assert!(m.dry_run(&ctx).unwrap().is_clean());

        // Unprivileged second apply succeeds because it never reaches
        // the privilege gate.
        let unpriv = test_ctx(tmp.path()).with_privilege(false);
        m.apply(&unpriv).unwrap();
        assert_eq!(ctx.snapshots.list().unwrap().len(), 1);
    }

    #[test]
    fn rollback_restores_previous_dropin() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("60-hardkit.conf");
        std::fs::write(&path, "old = 1\n").unwrap();

        let pol = policy_with(&[("net.ipv4.ip_forward", "0")]);
        let m = SysctlModule::new(&pol).with_path(path.clone());
        let ctx = test_ctx(tmp.path());

        m.apply(&ctx).unwrap();
        m.rollback(&ctx).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old = 1\n");
    }

    #[test]
    fn rollback_with_snapshot_but_no_entry_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let pol = policy_with(&[("net.ipv4.ip_forward", "0")]);
        let m = SysctlModule::new(&pol).with_path(tmp.path().join("60-hardkit.conf"));
        let ctx = test_ctx(tmp.path());

        // First apply creates a snapshot with no backup entry (the
        // drop-in did not exist), so rollback has nothing to restore.
        m.apply(&ctx).unwrap();
        assert!(matches!(m.rollback(&ctx), Err(Error::NotFound(_))));
    }
}
