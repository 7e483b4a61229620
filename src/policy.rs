//! Policy schema, validation, and document load/save.
//!
//! A [`Policy`] is the declarative description of the desired security
//! configuration for one host. It is loaded and validated once, then handed
//! by value to module construction; modules never mutate it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Named deployment context. Validated but not behaviorally
/// differentiated inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Prod,
    Dev,
    Laptop,
}

impl Default for Profile {
    fn default() -> Self {
        Self::Prod
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
            Self::Laptop => "laptop",
        };
        f.write_str(s)
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            "laptop" => Ok(Self::Laptop),
            other => Err(Error::Validation(format!("invalid profile: {other}"))),
        }
    }
}

/// Desired sshd configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshPolicy {
    /// `PermitRootLogin` value: yes / no / prohibit-password.
    /// Empty means the hardened default (`prohibit-password`).
    #[serde(default)]
    pub permit_root_login: String,

    /// Whether `PasswordAuthentication` stays enabled.
    #[serde(default)]
    pub password_auth: bool,

    /// Listening port. Must be in 1..=65535 to validate.
    #[serde(default)]
    pub port: u32,
}

/// Desired kernel parameters, keyed uniquely and kept sorted so the
/// rendered drop-in file is byte-identical across insertion orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SysctlPolicy {
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Desired firewall state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallPolicy {
    #[serde(default)]
    pub enabled: bool,

    /// Allow-rule tokens, applied in order. A numeric token (optionally
    /// suffixed `/tcp` or `/udp`) opens a port; anything else names a
    /// service.
    #[serde(default)]
    pub allow: Vec<String>,
}

/// Declarative security configuration for a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,

    #[serde(default)]
    pub profile: Profile,

    #[serde(default)]
    pub ssh: SshPolicy,

    #[serde(default)]
    pub sysctl: SysctlPolicy,

    #[serde(default)]
    pub firewall: FirewallPolicy,

    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl Policy {
    /// Check every policy invariant. Total and side-effect-free; returns
    /// the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Validation("name required".into()));
        }
        if self.ssh.port == 0 || self.ssh.port > 65535 {
            return Err(Error::Validation(format!(
                "ssh.port out of range: {}",
                self.ssh.port
            )));
        }
        Ok(())
    }

    /// Load a policy document from a TOML file.
    ///
    /// Unknown profiles and malformed fields are reported as validation
    /// errors so callers see one failure mode for a bad document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Validation(e.to_string()))
    }

    /// Save the policy document as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| Error::Validation(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
