//! Version detection for a named package manager.
//!
//! # Precedence
//! 1. `packageManager` field naming this manager with a plain version
//! 2. a pinned `engines` entry (`"8.0.0"` or `"=8.0.0"`)
//! 3. the major implied by this manager's lockfile format
//!
//! A `packageManager` field that names this manager with a version that is
//! not a plain version stops detection with no result.

use super::lockfile::{version_hint, LockfileSet};
use super::manifest::{Manifest, PackageManagerField};
use super::name::PackageManagerName;
use super::requirement::{parse_version_token, Requirement};
use serde::Serialize;
use std::fmt;

/// Where a version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    PackageManagerField,
    Engines,
    Lockfile,
    Installed,
    Default,
}

impl VersionSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackageManagerField => "packageManager",
            Self::Engines => "engines",
            Self::Lockfile => "lockfile",
            Self::Installed => "installed",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A version string tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedVersion {
    pub version: String,
    pub source: VersionSource,
}

impl DetectedVersion {
    #[must_use]
    pub fn new(version: impl Into<String>, source: VersionSource) -> Self {
        Self {
            version: version.into(),
            source,
        }
    }
}

/// Outcome of the `packageManager` step.
enum FieldStep {
    Found(String),
    Stop,
    Continue,
}

/// Detects versions from borrowed, read-only project inputs.
#[derive(Debug, Clone, Copy)]
pub struct VersionDetector<'a> {
    manifest: &'a Manifest,
    lockfiles: &'a LockfileSet,
}

impl<'a> VersionDetector<'a> {
    #[must_use]
    pub fn new(manifest: &'a Manifest, lockfiles: &'a LockfileSet) -> Self {
        Self {
            manifest,
            lockfiles,
        }
    }

    /// Detect the version to use for `name`.
    #[must_use]
    pub fn detect(&self, name: PackageManagerName) -> Option<DetectedVersion> {
        let detected = match self.from_package_manager_field(name) {
            FieldStep::Found(version) => {
                Some(DetectedVersion::new(version, VersionSource::PackageManagerField))
            }
            FieldStep::Stop => None,
            FieldStep::Continue => self
                .from_engines(name)
                .map(|v| DetectedVersion::new(v, VersionSource::Engines))
                .or_else(|| {
                    self.from_lockfile(name)
                        .map(|v| DetectedVersion::new(v, VersionSource::Lockfile))
                }),
        };

        match &detected {
            Some(d) => tracing::debug!(
                package_manager = %name,
                version = %d.version,
                source = %d.source,
                "detected package manager version"
            ),
            None => tracing::debug!(package_manager = %name, "no version detected"),
        }

        detected
    }

    fn from_package_manager_field(&self, name: PackageManagerName) -> FieldStep {
        let Some(raw) = self.manifest.package_manager() else {
            return FieldStep::Continue;
        };
        let Ok(field) = PackageManagerField::parse(raw) else {
            return FieldStep::Continue;
        };
        if field.name != name.as_str() {
            return FieldStep::Continue;
        }

        match field.version.as_deref() {
            None => FieldStep::Continue,
            Some(version) => match parse_version_token(version) {
                Some(v) => FieldStep::Found(v.to_string()),
                None => {
                    tracing::debug!(
                        package_manager = %name,
                        field = raw,
                        "packageManager version is not a plain version"
                    );
                    FieldStep::Stop
                }
            },
        }
    }

    fn from_engines(&self, name: PackageManagerName) -> Option<String> {
        let constraint = self.manifest.engine(name)?;
        let requirement = Requirement::parse(constraint, name).ok()?;
        requirement.pinned_version().map(String::from)
    }

    fn from_lockfile(&self, name: PackageManagerName) -> Option<String> {
        let lockfile = self.lockfiles.get(name)?;
        version_hint(name, &lockfile.content).map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NPM: PackageManagerName = PackageManagerName::Npm;

    fn manifest(value: serde_json::Value) -> Manifest {
        Manifest::from_value(value).unwrap()
    }

    fn npm_lock(version: u64) -> LockfileSet {
        LockfileSet::new().with_content(NPM, json!({ "lockfileVersion": version }).to_string())
    }

    #[test]
    fn test_field_wins_over_engines_and_lockfile() {
        let m = manifest(json!({
            "packageManager": "npm@7.5.2",
            "engines": { "npm": ">=7.0.0 <8.0.0" }
        }));
        let locks = npm_lock(2);
        let detected = VersionDetector::new(&m, &locks).detect(NPM).unwrap();
        assert_eq!(detected.version, "7.5.2");
        assert_eq!(detected.source, VersionSource::PackageManagerField);
    }

    #[test]
    fn test_pinned_engine_wins_over_lockfile() {
        let m = manifest(json!({
            "packageManager": "npm",
            "engines": { "npm": "8.0.0" }
        }));
        let locks = npm_lock(1);
        let detected = VersionDetector::new(&m, &locks).detect(NPM).unwrap();
        assert_eq!(detected.version, "8.0.0");
        assert_eq!(detected.source, VersionSource::Engines);
    }

    #[test]
    fn test_engine_range_does_not_short_circuit() {
        let m = manifest(json!({ "engines": { "npm": ">=7 <8" } }));
        let locks = npm_lock(2);
        let detected = VersionDetector::new(&m, &locks).detect(NPM).unwrap();
        assert_eq!(detected, DetectedVersion::new("8", VersionSource::Lockfile));
    }

    #[test]
    fn test_lockfile_only() {
        let m = Manifest::default();
        let locks = npm_lock(2);
        assert_eq!(
            VersionDetector::new(&m, &locks).detect(NPM).map(|d| d.version),
            Some("8".to_string())
        );
    }

    #[test]
    fn test_other_managers_lockfile_does_not_leak() {
        let m = Manifest::default();
        let locks =
            LockfileSet::new().with_content(PackageManagerName::Yarn, "# yarn lockfile v1\n");
        assert_eq!(VersionDetector::new(&m, &locks).detect(NPM), None);
    }

    #[test]
    fn test_other_managers_field_is_ignored() {
        let m = manifest(json!({ "packageManager": "yarn@3.6.0" }));
        let locks = npm_lock(2);
        let detector = VersionDetector::new(&m, &locks);
        assert_eq!(detector.detect(NPM).unwrap().source, VersionSource::Lockfile);
        assert_eq!(
            detector.detect(PackageManagerName::Yarn).unwrap().version,
            "3.6.0"
        );
    }

    #[test]
    fn test_malformed_name_is_absent() {
        let m = manifest(json!({ "packageManager": "npm^@1.2.3" }));
        let locks = LockfileSet::new();
        assert_eq!(VersionDetector::new(&m, &locks).detect(NPM), None);
    }

    #[test]
    fn test_malformed_version_stops_detection() {
        let m = manifest(json!({
            "packageManager": "npm@not-a-version",
            "engines": { "npm": "8.0.0" }
        }));
        let locks = npm_lock(2);
        assert_eq!(VersionDetector::new(&m, &locks).detect(NPM), None);

        let m = manifest(json!({ "packageManager": "npm@^7.0.0" }));
        assert_eq!(VersionDetector::new(&m, &locks).detect(NPM), None);
    }

    #[test]
    fn test_field_major_only() {
        let m = manifest(json!({ "packageManager": "npm@6" }));
        let locks = npm_lock(1);
        assert_eq!(
            VersionDetector::new(&m, &locks).detect(NPM).unwrap().version,
            "6"
        );
    }

    #[test]
    fn test_field_with_hash() {
        let m = manifest(json!({ "packageManager": "pnpm@8.6.0+sha512.abcdef" }));
        let locks = LockfileSet::new();
        assert_eq!(
            VersionDetector::new(&m, &locks)
                .detect(PackageManagerName::Pnpm)
                .unwrap()
                .version,
            "8.6.0"
        );
    }

    #[test]
    fn test_malformed_engine_falls_through() {
        let m = manifest(json!({ "engines": { "npm": "~8" } }));
        let locks = npm_lock(3);
        assert_eq!(
            VersionDetector::new(&m, &locks).detect(NPM),
            Some(DetectedVersion::new("9", VersionSource::Lockfile))
        );
    }
}
