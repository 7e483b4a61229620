//! Module composition: built-ins plus registered plugin factories.
//!
//! The registry is a plain value owned by the composition root. There is
//! no process-global registration; whoever builds the engine decides
//! which plugins exist, and registration must finish before modules are
//! built for a run.

use crate::distro::DistroInfo;
use crate::module::BoxedModule;
use crate::modules::{FirewallModule, SshModule, SysctlModule};
use crate::policy::Policy;

/// Factory mapping one run's inputs to a module instance.
pub type ModuleFactory = Box<dyn Fn(&Policy, &DistroInfo) -> BoxedModule>;

#[derive(Default)]
pub struct Registry {
    plugins: Vec<ModuleFactory>,
}

impl Registry {
    /// Registry with only the built-in modules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin factory. Plugins always build after the built-ins,
    /// in registration order.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn(&Policy, &DistroInfo) -> BoxedModule + 'static,
    {
        self.plugins.push(Box::new(factory));
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Build the full module list for one run: SSH, firewall, sysctl in
    /// fixed order, then plugins. Later modules may rely on side effects
    /// of earlier ones, so this order is part of the contract.
    pub fn build(&self, policy: &Policy, distro: &DistroInfo) -> Vec<BoxedModule> {
        let mut modules: Vec<BoxedModule> = vec![
            Box::new(SshModule::new(policy, distro)),
            Box::new(FirewallModule::new(policy, distro)),
            Box::new(SysctlModule::new(policy)),
        ];
        for factory in &self.plugins {
            modules.push(factory(policy, distro));
        }
        modules
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
