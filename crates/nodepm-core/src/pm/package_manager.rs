//! The resolved package manager.

use super::detect::DetectedVersion;
use super::name::PackageManagerName;
use super::requirement::Requirement;
use super::support::{major_of, SupportStatus};
use serde::Serialize;

/// A package manager with its detected version and support metadata.
///
/// Built once per resolution and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageManager {
    name: PackageManagerName,
    detected_version: Option<DetectedVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installed_version: Option<DetectedVersion>,
    support: SupportStatus,
    requirement: Option<Requirement>,
}

impl PackageManager {
    /// Build a package manager and evaluate its support status.
    #[must_use]
    pub fn new(
        name: PackageManagerName,
        detected_version: Option<DetectedVersion>,
        requirement: Option<Requirement>,
        check_unsupported: bool,
    ) -> Self {
        let major = detected_version.as_ref().and_then(|d| major_of(&d.version));
        Self {
            name,
            detected_version,
            installed_version: None,
            support: SupportStatus::evaluate(name, major, check_unsupported),
            requirement,
        }
    }

    /// Attach the version actually installed on the host.
    #[must_use]
    pub fn with_installed_version(mut self, installed: DetectedVersion) -> Self {
        self.installed_version = Some(installed);
        self
    }

    #[must_use]
    pub fn name(&self) -> PackageManagerName {
        self.name
    }

    #[must_use]
    pub fn detected_version(&self) -> Option<&DetectedVersion> {
        self.detected_version.as_ref()
    }

    /// Detected version string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.detected_version.as_ref().map(|d| d.version.as_str())
    }

    #[must_use]
    pub fn major(&self) -> Option<u64> {
        self.version().and_then(major_of)
    }

    #[must_use]
    pub fn installed_version(&self) -> Option<&DetectedVersion> {
        self.installed_version.as_ref()
    }

    /// Whether the installed major differs from the detected major.
    ///
    /// False when either side is unknown.
    #[must_use]
    pub fn has_version_mismatch(&self) -> bool {
        let installed = self
            .installed_version
            .as_ref()
            .and_then(|d| major_of(&d.version));
        matches!((self.major(), installed), (Some(a), Some(b)) if a != b)
    }

    #[must_use]
    pub fn support(&self) -> SupportStatus {
        self.support
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.support.supported
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.support.deprecated
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.support.unsupported
    }

    /// Engine requirement declared for this manager.
    #[must_use]
    pub fn requirement(&self) -> Option<&Requirement> {
        self.requirement.as_ref()
    }
}
