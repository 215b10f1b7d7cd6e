//! Support window per package manager.

use super::name::PackageManagerName;
use serde::Serialize;

/// Support policy for one package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportPolicy {
    /// Majors that are fully supported.
    pub supported: &'static [u64],
    /// Majors that still work but are scheduled for removal.
    pub deprecated: &'static [u64],
    /// Majors below this are unsupported.
    pub minimum: u64,
}

const NPM_POLICY: SupportPolicy = SupportPolicy {
    supported: &[7, 8, 9, 10],
    deprecated: &[6],
    minimum: 7,
};

const YARN_POLICY: SupportPolicy = SupportPolicy {
    supported: &[1, 2, 3, 4],
    deprecated: &[],
    minimum: 1,
};

const PNPM_POLICY: SupportPolicy = SupportPolicy {
    supported: &[7, 8, 9],
    deprecated: &[6],
    minimum: 7,
};

/// Look up the static policy for a manager.
#[must_use]
pub fn policy(name: PackageManagerName) -> &'static SupportPolicy {
    match name {
        PackageManagerName::Npm => &NPM_POLICY,
        PackageManagerName::Yarn => &YARN_POLICY,
        PackageManagerName::Pnpm => &PNPM_POLICY,
    }
}

/// Support status of a resolved version.
///
/// All flags are false when the version is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SupportStatus {
    pub supported: bool,
    pub deprecated: bool,
    pub unsupported: bool,
}

impl SupportStatus {
    /// Evaluate a major version against a manager's policy.
    ///
    /// `check_unsupported` gates whether versions below the window are
    /// reported as unsupported.
    #[must_use]
    pub fn evaluate(name: PackageManagerName, major: Option<u64>, check_unsupported: bool) -> Self {
        let Some(major) = major else {
            return Self::default();
        };
        let policy = policy(name);

        let deprecated = policy.deprecated.contains(&major);
        let unsupported = check_unsupported && major < policy.minimum;
        let supported = !deprecated && !unsupported && policy.supported.contains(&major);

        Self {
            supported,
            deprecated,
            unsupported,
        }
    }
}

/// Leading numeric component of a version string (`"7.5.2"` → 7, `"8"` → 8).
#[must_use]
pub fn major_of(version: &str) -> Option<u64> {
    let version = version.trim().trim_start_matches('v');
    let end = version
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(version.len());
    version[..end].parse().ok()
}
