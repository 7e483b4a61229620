//! SSH daemon hardening.
//!
//! Renders a deterministic sshd_config from the policy, and refuses to
//! install anything the daemon's own syntax checker rejects.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::module::{self, DryRunResult, FileDiff, Module};
use crate::policy::{Policy, SshPolicy};
use crate::distro::DistroInfo;
use crate::exec;
use crate::service;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

const SSHD_CONFIG: &str = "/etc/ssh/sshd_config";

#[derive(Debug)]
pub struct SshModule {
    policy: SshPolicy,
    #[allow(dead_code)]
    distro: DistroInfo,
    path: PathBuf,
    checker: &'static str,
}

impl SshModule {
    pub fn new(policy: &Policy, distro: &DistroInfo) -> Self {
        Self {
            policy: policy.ssh.clone(),
            distro: distro.clone(),
            path: PathBuf::from(SSHD_CONFIG),
            checker: "sshd",
        }
    }

    /// Point the module at an alternate sshd_config path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Use an alternate daemon binary for the pre-install syntax check.
    pub fn with_checker(mut self, checker: &'static str) -> Self {
        self.checker = checker;
        self
    }

    /// Deterministic rendering of the hardened configuration: port,
    /// password authentication, then root-login policy. An unset
    /// `permit_root_login` hardens to `prohibit-password`.
    fn desired(&self) -> String {
        let mut lines = Vec::with_capacity(3);
        if self.policy.port > 0 {
            lines.push(format!("Port {}", self.policy.port));
        }
        lines.push(format!(
            "PasswordAuthentication {}",
            if self.policy.password_auth { "yes" } else { "no" }
        ));
        let prl = match self.policy.permit_root_login.to_lowercase() {
            s if s.is_empty() => "prohibit-password".to_string(),
            s => s,
        };
        lines.push(format!("PermitRootLogin {prl}"));
        lines.join("\n") + "\n"
    }

    /// Validate `content` with `sshd -t` against a temporary copy. A
    /// syntax failure blocks the install; a host without sshd on PATH
    /// skips the check.
    fn syntax_check(&self, ctx: &RunContext, content: &str) -> Result<()> {
        if !exec::lookup(self.checker) {
            return Ok(());
        }
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let tmp = std::env::temp_dir().join(format!(
            "sshd_config.{}.{}",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, content)?;
        let tmp_arg = tmp.to_string_lossy();
        let result = exec::run(&ctx.cancel, self.checker, &["-t", "-f", tmp_arg.as_ref()]);
        let _ = std::fs::remove_file(&tmp);

        let out = result?;
        if !out.status.success() {
            return Err(Error::ExternalTool {
                tool: format!("{} -t", self.checker),
                detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
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

impl Module for SshModule {
    fn name(&self) -> &'static str {
        "ssh"
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
        ctx.snapshots.backup_file(&snap, &self.path)?;

        self.syntax_check(ctx, &diff.new)?;
        module::write_atomic(&self.path, &diff.new)?;

        service::reload(&ctx.cancel, &["sshd", "ssh"]);
        Ok(())
    }

    fn rollback(&self, ctx: &RunContext) -> Result<()> {
        module::restore_latest(ctx, &self.path)
    }
}
