//! Package manager resolution for one update job.
//!
//! Every query reads the same borrowed inputs and none of them write to
//! anything another query reads. The only internal state is the
//! installed-version cache, which no other query consults.

use super::detect::{DetectedVersion, VersionDetector};
use super::lockfile::LockfileSet;
use super::manifest::Manifest;
use super::name::PackageManagerName;
use super::package_manager::PackageManager;
use super::probe::{CommandRunner, InstalledVersions, LockfileNumericVersion, NumericVersionSource};
use super::requirement::{Requirement, RequirementError};
use crate::error::Error;
use crate::flags::{FeatureFlags, UNSUPPORTED_VERSION_CHECK};
use serde::Serialize;

/// Why a package manager was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    PackageManagerField,
    Engines,
    Lockfile,
    Default,
}

impl Selection {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackageManagerField => "packageManager",
            Self::Engines => "engines",
            Self::Lockfile => "lockfile",
            Self::Default => "default",
        }
    }
}

/// Resolves which package manager a project uses and at what version.
pub struct PackageManagerResolver<'a> {
    manifest: &'a Manifest,
    lockfiles: &'a LockfileSet,
    runner: &'a dyn CommandRunner,
    flags: &'a dyn FeatureFlags,
    numeric: Option<&'a dyn NumericVersionSource>,
    installed: InstalledVersions,
}

impl<'a> PackageManagerResolver<'a> {
    #[must_use]
    pub fn new(
        manifest: &'a Manifest,
        lockfiles: &'a LockfileSet,
        runner: &'a dyn CommandRunner,
        flags: &'a dyn FeatureFlags,
    ) -> Self {
        Self {
            manifest,
            lockfiles,
            runner,
            flags,
            numeric: None,
            installed: InstalledVersions::new(),
        }
    }

    /// Replace the lockfile-based numeric fallback used by the probe.
    #[must_use]
    pub fn with_numeric_source(mut self, numeric: &'a dyn NumericVersionSource) -> Self {
        self.numeric = Some(numeric);
        self
    }

    fn detector(&self) -> VersionDetector<'a> {
        VersionDetector::new(self.manifest, self.lockfiles)
    }

    /// Pick the package manager and report why.
    ///
    /// Order: `packageManager` field, a single known `engines` key, the first
    /// lockfile in npm > yarn > pnpm order, then npm.
    #[must_use]
    pub fn select(&self) -> (PackageManagerName, Selection) {
        if let Some(name) = self
            .manifest
            .package_manager_field()
            .and_then(|field| field.manager())
        {
            return (name, Selection::PackageManagerField);
        }

        if let [name] = self.manifest.engine_managers().as_slice() {
            return (*name, Selection::Engines);
        }

        if let Some(name) = self.lockfiles.managers().next() {
            return (name, Selection::Lockfile);
        }

        (PackageManagerName::Npm, Selection::Default)
    }

    /// The package manager in use.
    #[must_use]
    pub fn package_manager_name(&self) -> PackageManagerName {
        self.select().0
    }

    /// Resolve the package manager from project inputs alone.
    #[must_use]
    pub fn resolve(&self) -> PackageManager {
        let (name, selection) = self.select();
        tracing::debug!(package_manager = %name, ?selection, "selected package manager");

        PackageManager::new(
            name,
            self.detect_version(name),
            self.find_engine_constraints_as_requirement(name),
            self.flags.enabled(UNSUPPORTED_VERSION_CHECK),
        )
    }

    /// Like [`resolve`](Self::resolve), with the host's installed version attached.
    ///
    /// # Errors
    /// Returns [`Error::ProbeUnavailable`] if the version cannot be probed.
    pub fn resolve_with_installed(&self) -> Result<PackageManager, Error> {
        let pm = self.resolve();
        let installed = self.installed(pm.name())?;
        Ok(pm.with_installed_version(installed))
    }

    /// Version to use for `name`, from manifest and lockfile signals.
    #[must_use]
    pub fn detect_version(&self, name: PackageManagerName) -> Option<DetectedVersion> {
        self.detector().detect(name)
    }

    /// The `engines[name]` constraint as a [`Requirement`].
    ///
    /// Malformed constraints are logged and treated as absent.
    #[must_use]
    pub fn find_engine_constraints_as_requirement(
        &self,
        name: PackageManagerName,
    ) -> Option<Requirement> {
        let constraint = self.manifest.engine(name)?;
        match Requirement::parse(constraint, name) {
            Ok(requirement) => Some(requirement),
            Err(RequirementError::Empty { .. }) => None,
            Err(RequirementError::Invalid { token, .. }) => {
                tracing::warn!(
                    package_manager = %name,
                    constraint,
                    token = %token,
                    "ignoring invalid engines constraint"
                );
                None
            }
        }
    }

    /// Installed version of `name`, probed once per resolver.
    ///
    /// # Errors
    /// Returns [`Error::ProbeUnavailable`] if both the probe and the numeric
    /// fallback fail.
    pub fn installed_version(&self, name: PackageManagerName) -> Result<String, Error> {
        self.installed(name).map(|d| d.version)
    }

    /// Installed version of `name` with its provenance.
    ///
    /// # Errors
    /// See [`installed_version`](Self::installed_version).
    pub fn installed(&self, name: PackageManagerName) -> Result<DetectedVersion, Error> {
        match self.numeric {
            Some(numeric) => self.installed.get_or_probe(name, self.runner, numeric),
            None => self.installed.get_or_probe(
                name,
                self.runner,
                &LockfileNumericVersion::new(self.lockfiles),
            ),
        }
    }
}
