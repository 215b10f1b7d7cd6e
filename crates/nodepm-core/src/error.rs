use crate::pm::PackageManagerName;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes for machine-readable output.
pub mod codes {
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const MANIFEST_NOT_FOUND: &str = "MANIFEST_NOT_FOUND";
    pub const MANIFEST_INVALID: &str = "MANIFEST_INVALID";
    pub const PROBE_UNAVAILABLE: &str = "PROBE_UNAVAILABLE";
    pub const UNKNOWN_PACKAGE_MANAGER: &str = "UNKNOWN_PACKAGE_MANAGER";
    pub const OTHER: &str = "OTHER";
}

/// Core error type for nodepm operations.
///
/// Only infrastructure failures end up here. Ambiguous or malformed project
/// input is recovered to "no value" inside the resolver.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("package.json not found in {dir}")]
    ManifestNotFound { dir: PathBuf },

    #[error("Failed to parse package.json: {0}")]
    ManifestParse(#[source] serde_json::Error),

    #[error("Could not determine installed version of {name}: probe and fallback both failed")]
    ProbeUnavailable { name: PackageManagerName },

    #[error("Unknown package manager: {0}")]
    UnknownPackageManager(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Get the stable error code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => codes::IO_ERROR,
            Self::ManifestNotFound { .. } => codes::MANIFEST_NOT_FOUND,
            Self::ManifestParse(_) => codes::MANIFEST_INVALID,
            Self::ProbeUnavailable { .. } => codes::PROBE_UNAVAILABLE,
            Self::UnknownPackageManager(_) => codes::UNKNOWN_PACKAGE_MANAGER,
            Self::Other(_) => codes::OTHER,
        }
    }
}
