//! Firewall configuration through distribution-native frontends.
//!
//! The backend follows the package-manager family: apt systems drive
//! ufw, everything else drives firewalld. The two differ in what they
//! can undo, and that asymmetry is surfaced as capability metadata
//! instead of being papered over.

use crate::context::RunContext;
use crate::distro::{DistroInfo, PkgFamily};
use crate::error::Result;
use crate::exec;
use crate::module::{DryRunResult, FileDiff, Module};
use crate::policy::{FirewallPolicy, Policy};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// What a backend can undo after its rules were pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackSupport {
    /// No undo at all; rollback is a documented no-op.
    Unsupported,
    /// Rollback reloads the last permanently committed configuration.
    ReloadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ufw,
    Firewalld,
}

impl Backend {
    pub fn for_family(family: PkgFamily) -> Self {
        match family {
            PkgFamily::Apt => Self::Ufw,
            PkgFamily::Dnf | PkgFamily::Yum | PkgFamily::Pacman => Self::Firewalld,
        }
    }

    /// ufw applies rules to the live ruleset with no atomic undo;
    /// firewalld keeps a permanent configuration it can reload from.
    pub fn rollback_support(self) -> RollbackSupport {
        match self {
            Self::Ufw => RollbackSupport::Unsupported,
            Self::Firewalld => RollbackSupport::ReloadOnly,
        }
    }
}

/// How an allow token translates into a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Port,
    Service,
}

/// Classify an allow token: a 1-5 digit number, optionally suffixed
/// `/tcp` or `/udp`, opens a port; anything else names a service.
pub fn classify(token: &str) -> RuleKind {
    static PORT_RE: OnceLock<Regex> = OnceLock::new();
    let re = PORT_RE.get_or_init(|| Regex::new(r"^\d{1,5}(/tcp|/udp)?$").unwrap());
    if re.is_match(token) {
        RuleKind::Port
    } else {
        RuleKind::Service
    }
}

fn firewalld_add_arg(token: &str) -> String {
    match classify(token) {
        RuleKind::Port => format!("--add-port={token}"),
        RuleKind::Service => format!("--add-service={token}"),
    }
}

#[derive(Debug)]
pub struct FirewallModule {
    policy: FirewallPolicy,
    backend: Backend,
}

impl FirewallModule {
    pub fn new(policy: &Policy, distro: &DistroInfo) -> Self {
        Self {
            policy: policy.firewall.clone(),
            backend: Backend::for_family(distro.pkg_family),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The exact command transcript apply would run, one command per
    /// line. Shown as the dry-run "file" since there is no config file
    /// to diff against.
    fn transcript(&self) -> String {
        let mut out = String::new();
        match self.backend {
            Backend::Ufw => {
                out.push_str("ufw enable\n");
                for token in &self.policy.allow {
                    out.push_str(&format!("ufw allow {token}\n"));
                }
            }
            Backend::Firewalld => {
                for token in &self.policy.allow {
                    out.push_str(&format!(
                        "firewall-cmd --permanent {}\n",
                        firewalld_add_arg(token)
                    ));
                }
                out.push_str("firewall-cmd --reload\n");
            }
        }
        out
    }
}

impl Module for FirewallModule {
    fn name(&self) -> &'static str {
        "firewall"
    }

    fn dry_run(&self, _ctx: &RunContext) -> Result<DryRunResult> {
        if !self.policy.enabled {
            return Ok(DryRunResult {
                diffs: Vec::new(),
                warnings: vec!["Firewall disabled in policy".into()],
            });
        }
        Ok(DryRunResult {
            diffs: vec![FileDiff {
                path: PathBuf::from("firewall"),
                old: String::new(),
                new: self.transcript(),
            }],
            warnings: Vec::new(),
        })
    }

    /// Push the allow rules. Individual command failures are advisory
    /// and swallowed; cancellation still aborts the sequence. Rules are
    /// pushed in policy order, one command per token.
    fn apply(&self, ctx: &RunContext) -> Result<()> {
        if !self.policy.enabled {
            return Ok(());
        }
        match self.backend {
            Backend::Ufw => {
                exec::run_best_effort(&ctx.cancel, "ufw", &["enable"])?;
                for token in &self.policy.allow {
                    exec::run_best_effort(&ctx.cancel, "ufw", &["allow", token.as_str()])?;
                }
            }
            Backend::Firewalld => {
                for token in &self.policy.allow {
                    let arg = firewalld_add_arg(token);
                    exec::run_best_effort(&ctx.cancel, "firewall-cmd", &["--permanent", arg.as_str()])?;
                }
                exec::run_best_effort(&ctx.cancel, "firewall-cmd", &["--reload"])?;
            }
        }
        Ok(())
    }

    fn rollback(&self, ctx: &RunContext) -> Result<()> {
        match self.backend.rollback_support() {
            // ufw has no atomic undo. Deliberate no-op.
            RollbackSupport::Unsupported => Ok(()),
            RollbackSupport::ReloadOnly => {
                exec::run_best_effort(&ctx.cancel, "firewall-cmd", &["--reload"])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Profile;
    use std::collections::BTreeMap;

    fn policy(enabled: bool, allow: &[&str]) -> Policy {
        Policy {
            name: "test".into(),
            profile: Profile::Prod,
            ssh: crate::policy::SshPolicy {
                port: 22,
                ..Default::default()
            },
            sysctl: Default::default(),
            firewall: FirewallPolicy {
                enabled,
                allow: allow.iter().map(|s| (*s).to_string()).collect(),
            },
            meta: BTreeMap::new(),
        }
    }

    fn distro(id: &str) -> DistroInfo {
        DistroInfo::from_os_release_str(&format!("ID={id}\nNAME=x\n"))
    }

    #[test]
    fn token_classification() {
        assert_eq!(classify("22/tcp"), RuleKind::Port);
        assert_eq!(classify("8080"), RuleKind::Port);
        assert_eq!(classify("53/udp"), RuleKind::Port);
        assert_eq!(classify("ssh"), RuleKind::Service);
        assert_eq!(classify("http"), RuleKind::Service);
        assert_eq!(classify("22/sctp"), RuleKind::Service);
    }

    #[test]
    fn backend_follows_package_family() {
        let ufw = FirewallModule::new(&policy(true, &[]), &distro("ubuntu"));
        assert_eq!(ufw.backend(), Backend::Ufw);
        assert_eq!(ufw.backend().rollback_support(), RollbackSupport::Unsupported);

        let fwd = FirewallModule::new(&policy(true, &[]), &distro("fedora"));
        assert_eq!(fwd.backend(), Backend::Firewalld);
        assert_eq!(fwd.backend().rollback_support(), RollbackSupport::ReloadOnly);
    }

    #[test]
    fn ufw_transcript_is_sequential() {
        let m = FirewallModule::new(&policy(true, &["22/tcp", "http"]), &distro("debian"));
        let dry = m.dry_run(&RunContext::new().with_privilege(false)).unwrap();
        assert_eq!(dry.diffs.len(), 1);
        assert_eq!(
            dry.diffs[0].new,
            "ufw enable\nufw allow 22/tcp\nufw allow http\n"
        );
    }

    #[test]
    fn firewalld_transcript_classifies_and_reloads() {
        let m = FirewallModule::new(&policy(true, &["8080", "ssh"]), &distro("rhel"));
        let dry = m.dry_run(&RunContext::new().with_privilege(false)).unwrap();
        assert_eq!(
            dry.diffs[0].new,
            "firewall-cmd --permanent --add-port=8080\n\
             firewall-cmd --permanent --add-service=ssh\n\
             firewall-cmd --reload\n"
        );
    }

    #[test]
    fn disabled_policy_warns_and_applies_nothing() {
        let m = FirewallModule::new(&policy(false, &["ssh"]), &distro("ubuntu"));
        let ctx = RunContext::new().with_privilege(false);

        let dry = m.dry_run(&ctx).unwrap();
        assert!(dry.is_clean());
        assert_eq!(dry.warnings, vec!["Firewall disabled in policy"]);
        assert!(m.apply(&ctx).is_ok());
    }

    #[test]
    fn ufw_rollback_is_a_no_op() {
        let m = FirewallModule::new(&policy(true, &["ssh"]), &distro("ubuntu"));
        assert!(m.rollback(&RunContext::new().with_privilege(false)).is_ok());
    }
}
