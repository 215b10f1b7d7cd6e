//! Lockfile handles and format fingerprinting.
//!
//! Only the format fields are read. Each lockfile format maps to the major
//! version of the tool that writes it:
//!
//! | lockfile            | field                        | major |
//! |---------------------|------------------------------|-------|
//! | `package-lock.json` | `lockfileVersion` 1 / 2 / 3+ | 6 / 8 / 9 |
//! | `yarn.lock`         | `# yarn lockfile v1`         | 1     |
//! | `yarn.lock`         | `__metadata.version` <8 / 8+ | 3 / 4 |
//! | `pnpm-lock.yaml`    | `lockfileVersion` 5.3 / 5.4 / 6.x / 9.x | 6 / 7 / 8 / 9 |

use super::name::PackageManagerName;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// A lockfile as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    pub name: String,
    pub content: String,
}

impl Lockfile {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// At most one lockfile per package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockfileSet {
    files: BTreeMap<PackageManagerName, Lockfile>,
}

impl LockfileSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lockfile, replacing any earlier one for the same manager.
    #[must_use]
    pub fn with(mut self, name: PackageManagerName, lockfile: Lockfile) -> Self {
        self.files.insert(name, lockfile);
        self
    }

    /// Add a lockfile named after the manager's conventional filename.
    #[must_use]
    pub fn with_content(self, name: PackageManagerName, content: impl Into<String>) -> Self {
        self.with(name, Lockfile::new(name.lockfile_name(), content))
    }

    /// Load the well-known lockfiles present in a project directory.
    ///
    /// # Errors
    /// Returns an error if a lockfile exists but cannot be read.
    pub fn read_dir(dir: &Path) -> io::Result<Self> {
        let mut set = Self::new();
        for pm in PackageManagerName::ALL {
            let path = dir.join(pm.lockfile_name());
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    set.files.insert(pm, Lockfile::new(pm.lockfile_name(), content));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(set)
    }

    #[must_use]
    pub fn get(&self, name: PackageManagerName) -> Option<&Lockfile> {
        self.files.get(&name)
    }

    #[must_use]
    pub fn contains(&self, name: PackageManagerName) -> bool {
        self.files.contains_key(&name)
    }

    /// Managers with a lockfile, in priority order.
    pub fn managers(&self) -> impl Iterator<Item = PackageManagerName> + '_ {
        self.files.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Infer the major version of `name` from its lockfile content.
#[must_use]
pub fn version_hint(name: PackageManagerName, content: &str) -> Option<&'static str> {
    match name {
        PackageManagerName::Npm => npm_version_hint(content),
        PackageManagerName::Yarn => yarn_version_hint(content),
        PackageManagerName::Pnpm => pnpm_version_hint(content),
    }
}

/// npm major from `package-lock.json`.
#[must_use]
pub fn npm_version_hint(content: &str) -> Option<&'static str> {
    let lock: Value = serde_json::from_str(content).ok()?;
    let version = match lock.get("lockfileVersion")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    match version {
        0 => None,
        1 => Some("6"),
        2 => Some("8"),
        _ => Some("9"),
    }
}

/// Yarn major from `yarn.lock`.
///
/// Classic lockfiles are not YAML and are recognized by their header.
/// Berry lockfiles are YAML with a top-level `__metadata` mapping.
#[must_use]
pub fn yarn_version_hint(content: &str) -> Option<&'static str> {
    if content
        .lines()
        .any(|line| line.starts_with("# yarn lockfile v"))
    {
        return Some("1");
    }

    let lock: BerryLockfile = first_document(content)?;
    let metadata = lock.metadata?;
    match metadata.version.as_ref() {
        None => Some("3"),
        Some(version) => {
            let version: u32 = yaml_scalar(version)?.parse().ok()?;
            Some(if version >= 8 { "4" } else { "3" })
        }
    }
}

/// pnpm major from the top-level `lockfileVersion` of `pnpm-lock.yaml`.
#[must_use]
pub fn pnpm_version_hint(content: &str) -> Option<&'static str> {
    let lock: PnpmLockfile = first_document(content)?;
    let version = yaml_scalar(lock.lockfile_version.as_ref()?)?;

    let (major, minor) = match version.split_once('.') {
        Some((major, minor)) => (major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?),
        None => (version.parse::<u32>().ok()?, 0),
    };

    match (major, minor) {
        v if v >= (9, 0) => Some("9"),
        v if v >= (6, 0) => Some("8"),
        v if v >= (5, 4) => Some("7"),
        v if v >= (5, 3) => Some("6"),
        _ => None,
    }
}

#[derive(Deserialize)]
struct BerryLockfile {
    #[serde(rename = "__metadata")]
    metadata: Option<BerryMetadata>,
}

#[derive(Deserialize)]
struct BerryMetadata {
    version: Option<serde_yaml::Value>,
}

#[derive(Deserialize)]
struct PnpmLockfile {
    #[serde(rename = "lockfileVersion")]
    lockfile_version: Option<serde_yaml::Value>,
}

/// Deserialize the first YAML document; pnpm may append more.
fn first_document<T: serde::de::DeserializeOwned>(content: &str) -> Option<T> {
    let document = serde_yaml::Deserializer::from_str(content).next()?;
    T::deserialize(document).ok()
}

/// A scalar version field as text (`9.0`, `'9.0'` and `8` all work).
fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_lockfile_versions() {
        assert_eq!(npm_version_hint(r#"{"lockfileVersion": 1}"#), Some("6"));
        assert_eq!(npm_version_hint(r#"{"lockfileVersion": 2}"#), Some("8"));
        assert_eq!(npm_version_hint(r#"{"lockfileVersion": 3}"#), Some("9"));
        assert_eq!(npm_version_hint(r#"{"lockfileVersion": "2"}"#), Some("8"));
    }

    #[test]
    fn test_npm_lockfile_unparsable() {
        assert_eq!(npm_version_hint(""), None);
        assert_eq!(npm_version_hint("not json"), None);
        assert_eq!(npm_version_hint(r#"{"name": "app"}"#), None);
        assert_eq!(npm_version_hint(r#"{"lockfileVersion": true}"#), None);
    }

    #[test]
    fn test_yarn_classic() {
        let content = "# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.\n\
                       # yarn lockfile v1\n\n\
                       lodash@^4.17.21:\n  version \"4.17.21\"\n";
        assert_eq!(yarn_version_hint(content), Some("1"));
    }

    #[test]
    fn test_yarn_berry() {
        let v3 = "# This file is generated by running \"yarn install\"\n\n\
                  __metadata:\n  version: 6\n  cacheKey: 8\n\n\
                  \"lodash@npm:^4.17.21\":\n  version: 4.17.21\n";
        assert_eq!(yarn_version_hint(v3), Some("3"));

        let v4 = "__metadata:\n  version: 8\n  cacheKey: 10c0\n";
        assert_eq!(yarn_version_hint(v4), Some("4"));

        let no_version = "__metadata:\n  cacheKey: 8\n\nfoo:\n  version: 1.0.0\n";
        assert_eq!(yarn_version_hint(no_version), Some("3"));
    }

    #[test]
    fn test_yarn_berry_flow_metadata() {
        assert_eq!(yarn_version_hint("__metadata: {version: 8, cacheKey: 10c0}\n"), Some("4"));
        assert_eq!(yarn_version_hint("__metadata:\n  version: \"6\"\n"), Some("3"));
    }

    #[test]
    fn test_yarn_unknown() {
        assert_eq!(yarn_version_hint(""), None);
        assert_eq!(yarn_version_hint("lodash@^4:\n  version \"4.0.0\"\n"), None);
    }

    #[test]
    fn test_pnpm_lockfile_versions() {
        assert_eq!(pnpm_version_hint("lockfileVersion: '9.0'\n"), Some("9"));
        assert_eq!(pnpm_version_hint("lockfileVersion: '6.0'\n"), Some("8"));
        assert_eq!(pnpm_version_hint("lockfileVersion: 5.4\n"), Some("7"));
        assert_eq!(pnpm_version_hint("lockfileVersion: 5.3\n"), Some("6"));
        assert_eq!(pnpm_version_hint("lockfileVersion: 5.1\n"), None);
        assert_eq!(pnpm_version_hint("lockfileVersion: \"6.1\"\n"), Some("8"));
    }

    #[test]
    fn test_pnpm_yaml_forms() {
        assert_eq!(pnpm_version_hint("lockfileVersion: '9.0' # pnpm 9\n"), Some("9"));
        assert_eq!(pnpm_version_hint("lockfileVersion:   6\n"), Some("8"));

        let two_documents =
            "---\nlockfileVersion: '9.0'\nimporters: {}\n---\nlockfileVersion: '6.0'\n";
        assert_eq!(pnpm_version_hint(two_documents), Some("9"));

        assert_eq!(pnpm_version_hint("lockfileVersion: [9]\n"), None);
        assert_eq!(pnpm_version_hint(": not yaml : ["), None);
    }

    #[test]
    fn test_pnpm_ignores_nested_keys() {
        let content = "settings:\n  lockfileVersion: '9.0'\n";
        assert_eq!(pnpm_version_hint(content), None);
        assert_eq!(pnpm_version_hint("lockfileVersion: abc\n"), None);
    }

    #[test]
    fn test_set_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yarn.lock"), "# yarn lockfile v1\n").unwrap();

        let set = LockfileSet::read_dir(dir.path()).unwrap();
        assert!(set.contains(PackageManagerName::Yarn));
        assert!(!set.contains(PackageManagerName::Npm));
        assert_eq!(set.get(PackageManagerName::Yarn).unwrap().name, "yarn.lock");
        assert_eq!(set.managers().collect::<Vec<_>>(), vec![PackageManagerName::Yarn]);
    }

    #[test]
    fn test_set_priority_order() {
        let set = LockfileSet::new()
            .with_content(PackageManagerName::Pnpm, "")
            .with_content(PackageManagerName::Npm, "");
        assert_eq!(
            set.managers().collect::<Vec<_>>(),
            vec![PackageManagerName::Npm, PackageManagerName::Pnpm]
        );
    }
}
