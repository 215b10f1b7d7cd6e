//! Package manager resolution.
//!
//! Provides:
//! - Parsing `packageManager` and `engines` from package.json
//! - Parsing engine constraints into structured requirements
//! - Fingerprinting lockfile formats to a tool major version
//! - Detecting the version to use for npm, yarn and pnpm
//! - Probing the installed version through corepack, memoized per job
//! - Selecting the project's package manager and its support status

pub mod detect;
pub mod lockfile;
pub mod manifest;
pub mod name;
pub mod package_manager;
pub mod probe;
pub mod requirement;
pub mod resolver;
pub mod runner;
pub mod support;

pub use detect::{DetectedVersion, VersionDetector, VersionSource};
pub use lockfile::{version_hint, Lockfile, LockfileSet};
pub use manifest::{Manifest, ManifestFieldError, PackageManagerField, MANIFEST_NAME};
pub use name::PackageManagerName;
pub use package_manager::PackageManager;
pub use probe::{
    CommandRunner, InstalledVersions, LockfileNumericVersion, NumericVersionSource, ProbeError,
};
pub use requirement::{Clause, Op, Requirement, RequirementError};
pub use resolver::{PackageManagerResolver, Selection};
pub use runner::SystemCommandRunner;
pub use support::{SupportPolicy, SupportStatus};
