//! Orchestrator: runs the module list sequentially and aggregates
//! results.

use crate::context::RunContext;
use crate::distro::DistroInfo;
use crate::error::{Error, Result};
use crate::module::{BoxedModule, DryRunResult};
use crate::policy::Policy;
use crate::registry::Registry;

/// Per-module outcome of an apply run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub module: &'static str,
    /// Whether the module found drift and converged it, as opposed to
    /// already being in the desired state.
    pub changed: bool,
}

/// Summary of a completed apply run.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<ApplyOutcome>,
}

impl ApplyReport {
    pub fn total_changed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed).count()
    }
}

/// Drives the full module list for one validated policy against one
/// host. Modules run strictly sequentially in registration order; there
/// is no cross-module transaction, each module's apply/rollback pair is
/// its own unit of atomicity.
#[derive(Debug)]
pub struct Engine {
    policy: Policy,
    distro: DistroInfo,
    registry: Registry,
}

impl Engine {
    /// Validate the policy and capture the run inputs. A validation
    /// failure is fatal before any module runs.
    pub fn new(policy: Policy, distro: DistroInfo, registry: Registry) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            distro,
            registry,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn distro(&self) -> &DistroInfo {
        &self.distro
    }

    /// Build the module list for this run: built-ins in fixed order,
    /// then plugins.
    pub fn modules(&self) -> Vec<BoxedModule> {
        self.registry.build(&self.policy, &self.distro)
    }

    /// Dry-run every module, concatenating diffs and warnings in module
    /// order. Fail-fast: the first module error aborts aggregation and
    /// surfaces unchanged, with no partial report.
    pub fn dry_run_all(&self, ctx: &RunContext) -> Result<DryRunResult> {
        let mut agg = DryRunResult::default();
        for module in self.modules() {
            let res = module.dry_run(ctx)?;
            agg.merge(res);
        }
        Ok(agg)
    }

    /// Apply every module in order, stopping at the first failure.
    ///
    /// Modules already converged before the failure stay converged;
    /// their names are logged so the caller can decide about per-module
    /// rollbacks.
    pub fn apply_all(&self, ctx: &RunContext) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        for module in self.modules() {
            let changed = !module.dry_run(ctx)?.is_clean();
            if let Err(e) = module.apply(ctx) {
                log::error!(
                    "apply failed in module {} (completed: {:?})",
                    module.name(),
                    report
                        .outcomes
                        .iter()
                        .map(|o| o.module)
                        .collect::<Vec<_>>()
                );
                return Err(e);
            }
            report.outcomes.push(ApplyOutcome {
                module: module.name(),
                changed,
            });
        }
        Ok(report)
    }

    /// Roll back one named module from its latest snapshot.
    pub fn rollback(&self, name: &str, ctx: &RunContext) -> Result<()> {
        let module = self
            .modules()
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| Error::NotFound(format!("no module named {name}")))?;
        module.rollback(ctx)
    }
}
