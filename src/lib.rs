//! # hardkit
//!
//! A policy-driven host-hardening engine: declare the desired security
//! configuration of a host, preview the drift, converge, and roll back
//! from file snapshots when a change goes wrong.
//!
//! ## Core Concepts
//!
//! - **Policy**: declarative desired configuration (SSH, sysctl, firewall)
//! - **Module**: one configuration domain implementing dry-run / apply /
//!   rollback
//! - **Snapshot**: timestamped copies of pre-change files, consumed by
//!   rollback
//! - **Engine**: runs the module list sequentially and aggregates results
//!
//! ## Example
//!
//! ```no_run
//! use hardkit::{DistroInfo, Engine, Policy, Registry, RunContext};
//!
//! # fn main() -> hardkit::Result<()> {
//! let policy = Policy::load(std::path::Path::new("/etc/hardkit/policy.toml"))?;
//! let engine = Engine::new(policy, DistroInfo::detect(), Registry::new())?;
//!
//! let ctx = RunContext::new();
//! let preview = engine.dry_run_all(&ctx)?;
//! for diff in &preview.diffs {
//!     println!("{}", diff.render());
//! }
//! if !preview.is_clean() {
//!     engine.apply_all(&ctx)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Contract
//!
//! Dry-run reports an empty diff list exactly when apply would perform
//! no write; a converged apply is a cheap no-op with no privilege check
//! and no snapshot. Modules run strictly sequentially, and at most one
//! engine run per host may be active at a time; serializing runs is the
//! caller's responsibility.
//!
//! Plugins extend the engine through [`Registry::register`], supplying a
//! factory from `(Policy, DistroInfo)` to a boxed [`Module`]. The
//! registry is a plain value owned by the composition root.

pub mod context;
pub mod distro;
pub mod engine;
pub mod error;
pub mod exec;
pub mod module;
pub mod modules;
pub mod policy;
pub mod registry;
pub mod service;
pub mod snapshot;

// Re-export main types at crate root
pub use context::RunContext;
pub use distro::{DistroInfo, PkgFamily};
pub use engine::{ApplyOutcome, ApplyReport, Engine};
pub use error::{Error, Result};
pub use exec::CancelToken;
pub use module::{BoxedModule, DryRunResult, FileDiff, Module};
pub use modules::{FirewallModule, SshModule, SysctlModule};
pub use policy::{FirewallPolicy, Policy, Profile, SshPolicy, SysctlPolicy};
pub use registry::{ModuleFactory, Registry};
pub use snapshot::SnapshotStore;
