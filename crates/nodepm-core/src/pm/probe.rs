//! Installed-version probing with per-name memoization.
//!
//! The probe asks corepack for the real version of a tool. If that fails or
//! prints something that is not a version, a numeric fallback is used. The
//! first answer per name is kept for the lifetime of the cache.

use super::detect::{DetectedVersion, VersionSource};
use super::lockfile::{version_hint, LockfileSet};
use super::name::PackageManagerName;
use crate::error::Error;
use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Error from the process-execution collaborator.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to run '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' exited with code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("'{command}' timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },
}

/// Runs a shell command and returns its stdout.
pub trait CommandRunner {
    /// `tag` identifies the call in logs.
    fn run(&self, command: &str, tag: &str) -> Result<String, ProbeError>;
}

/// Best-effort numeric version when the probe fails.
///
/// The returned version carries its own provenance.
pub trait NumericVersionSource {
    fn numeric_version(&self, name: PackageManagerName) -> Option<DetectedVersion>;
}

/// Major assumed for a manager when nothing else is known.
#[must_use]
pub fn default_major(name: PackageManagerName) -> &'static str {
    match name {
        PackageManagerName::Npm | PackageManagerName::Pnpm => "8",
        PackageManagerName::Yarn => "1",
    }
}

/// Numeric fallback from lockfile fingerprints, then [`default_major`].
///
/// Tagged [`VersionSource::Lockfile`] or [`VersionSource::Default`]
/// accordingly.
#[derive(Debug, Clone, Copy)]
pub struct LockfileNumericVersion<'a> {
    lockfiles: &'a LockfileSet,
}

impl<'a> LockfileNumericVersion<'a> {
    #[must_use]
    pub fn new(lockfiles: &'a LockfileSet) -> Self {
        Self { lockfiles }
    }
}

impl NumericVersionSource for LockfileNumericVersion<'_> {
    fn numeric_version(&self, name: PackageManagerName) -> Option<DetectedVersion> {
        let version = match self
            .lockfiles
            .get(name)
            .and_then(|lock| version_hint(name, &lock.content))
        {
            Some(hint) => DetectedVersion::new(hint, VersionSource::Lockfile),
            None => DetectedVersion::new(default_major(name), VersionSource::Default),
        };
        Some(version)
    }
}

/// Command used to ask the host for a tool's version.
#[must_use]
pub fn probe_command(name: PackageManagerName) -> String {
    format!("corepack {name} -v")
}

/// Tag attached to probe calls.
#[must_use]
pub fn probe_tag(name: PackageManagerName) -> String {
    format!("{name}_version")
}

/// Memoized installed versions, one entry per manager.
#[derive(Debug, Default)]
pub struct InstalledVersions {
    cache: Mutex<BTreeMap<PackageManagerName, DetectedVersion>>,
}

impl InstalledVersions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached version for `name`, without probing.
    #[must_use]
    pub fn cached(&self, name: PackageManagerName) -> Option<DetectedVersion> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .cloned()
    }

    /// Return the cached version or probe for it.
    ///
    /// A probed version is tagged [`VersionSource::Installed`]; a fallback
    /// keeps the source its [`NumericVersionSource`] gave it. The lock is
    /// held across the probe, so one instance never probes the same name
    /// twice.
    ///
    /// # Errors
    /// Returns [`Error::ProbeUnavailable`] if both the probe and the
    /// fallback fail. Nothing is cached in that case.
    pub fn get_or_probe(
        &self,
        name: PackageManagerName,
        runner: &dyn CommandRunner,
        numeric: &dyn NumericVersionSource,
    ) -> Result<DetectedVersion, Error> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(version) = cache.get(&name) {
            return Ok(version.clone());
        }

        let version = match probe(name, runner) {
            Some(version) => DetectedVersion::new(version, VersionSource::Installed),
            None => {
                let fallback = numeric
                    .numeric_version(name)
                    .ok_or(Error::ProbeUnavailable { name })?;
                tracing::debug!(
                    package_manager = %name,
                    version = %fallback.version,
                    source = %fallback.source,
                    "using numeric version fallback"
                );
                fallback
            }
        };

        cache.insert(name, version.clone());
        Ok(version)
    }
}

fn probe(name: PackageManagerName, runner: &dyn CommandRunner) -> Option<String> {
    let command = probe_command(name);
    let output = match runner.run(&command, &probe_tag(name)) {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(package_manager = %name, error = %e, "installed version probe failed");
            return None;
        }
    };

    let version = output.trim();
    if semver::Version::parse(version).is_ok() {
        Some(version.to_string())
    } else {
        tracing::debug!(package_manager = %name, output = version, "probe output is not a version");
        None
    }
}
