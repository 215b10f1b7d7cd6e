#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod error;
pub mod flags;
pub mod pm;
pub mod version;

pub use config::Config;
pub use error::Error;
pub use flags::{FeatureFlags, StaticFeatureFlags};
pub use pm::{
    DetectedVersion, LockfileSet, Manifest, PackageManager, PackageManagerName,
    PackageManagerResolver, Requirement, SupportStatus, VersionSource,
};
pub use version::VERSION;
