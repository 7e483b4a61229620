//! Built-in configuration domains.

pub mod firewall;
pub mod ssh;
pub mod sysctl;

pub use firewall::FirewallModule;
pub use ssh::SshModule;
pub use sysctl::SysctlModule;
