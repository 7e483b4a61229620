//! Distribution identity and package-manager family detection.
//!
//! Read-only. When the identity source is unreadable the provider falls
//! back to a generic default rather than failing, so the engine can still
//! run on unusual hosts.

use std::fmt;
use std::path::Path;

const OS_RELEASE: &str = "/etc/os-release";

/// Package-manager family, used to pick firewall backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkgFamily {
    Apt,
    Dnf,
    Yum,
    Pacman,
}

impl PkgFamily {
    /// Map a distro `ID` to its package-manager family. Unknown distros
    /// fall back to apt, matching the generic default identity.
    pub fn for_distro(id: &str) -> Self {
        match id {
            "ubuntu" | "debian" => Self::Apt,
            "fedora" => Self::Dnf,
            "centos" | "rhel" => Self::Yum,
            "arch" => Self::Pacman,
            _ => Self::Apt,
        }
    }
}

impl fmt::Display for PkgFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
        };
        f.write_str(s)
    }
}

/// Operating-system identity as seen by the modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub pkg_family: PkgFamily,
}

impl Default for DistroInfo {
    /// Generic identity used when `/etc/os-release` is unreadable.
    fn default() -> Self {
        Self {
            id: "unknown".into(),
            name: "Linux".into(),
            version: String::new(),
            pkg_family: PkgFamily::Apt,
        }
    }
}

impl DistroInfo {
    /// Read the host identity from `/etc/os-release`.
    pub fn detect() -> Self {
        Self::from_file(Path::new(OS_RELEASE))
    }

    /// Read identity from an os-release file at an arbitrary path.
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_os_release_str(&text),
            Err(_) => Self::default(),
        }
    }

    /// Parse os-release `KEY=VALUE` lines, stripping surrounding quotes.
    pub fn from_os_release_str(text: &str) -> Self {
        let mut id = String::new();
        let mut name = String::new();
        let mut version = String::new();

        for line in text.lines() {
            let Some((key, raw)) = line.split_once('=') else {
                continue;
            };
            let value = raw.trim_matches('"');
            match key {
                "ID" => id = value.to_string(),
                "NAME" => name = value.to_string(),
                "VERSION_ID" => version = value.to_string(),
                _ => {}
            }
        }

        let pkg_family = PkgFamily::for_distro(&id);
        Self {
            id,
            name,
            version,
            pkg_family,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_os_release() {
        let text = "NAME=\"Ubuntu\"\nID=ubuntu\nVERSION_ID=\"24.04\"\nPRETTY_NAME=\"Ubuntu 24.04\"\n";
        let info = DistroInfo::from_os_release_str(text);
        assert_eq!(info.id, "ubuntu");
        assert_eq!(info.name, "Ubuntu");
        assert_eq!(info.version, "24.04");
        assert_eq!(info.pkg_family, PkgFamily::Apt);
    }

    #[test]
    fn maps_families() {
        assert_eq!(PkgFamily::for_distro("fedora"), PkgFamily::Dnf);
        assert_eq!(PkgFamily::for_distro("rhel"), PkgFamily::Yum);
        assert_eq!(PkgFamily::for_distro("arch"), PkgFamily::Pacman);
        assert_eq!(PkgFamily::for_distro("gentoo"), PkgFamily::Apt);
    }

    #[test]
    fn unreadable_source_falls_back_to_generic() {
        let info = DistroInfo::from_file(Path::new("/nonexistent/os-release"));
        assert_eq!(info, DistroInfo::default());
        assert_eq!(info.id, "unknown");
        assert_eq!(info.pkg_family, PkgFamily::Apt);
    }
}
