//! Read-only view of the package.json fields the resolver consults.

use super::name::PackageManagerName;
use crate::error::Error;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Manifest filename.
pub const MANIFEST_NAME: &str = "package.json";

/// Error parsing the `packageManager` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestFieldError {
    #[error("empty packageManager field")]
    Empty,

    #[error("invalid character '{ch}' in package manager name '{name}'")]
    InvalidName { name: String, ch: char },

    #[error("empty version in packageManager field '{0}'")]
    EmptyVersion(String),
}

/// A parsed `packageManager` field: `<name>[@<version>[+<hash>]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerField {
    pub name: String,
    /// Version segment as written. May still be a range or garbage.
    pub version: Option<String>,
    /// Corepack integrity suffix, e.g. `sha512.abc...`.
    pub hash: Option<String>,
}

impl PackageManagerField {
    /// Parse a `packageManager` value.
    ///
    /// # Errors
    /// Returns an error if the name is empty or has characters outside
    /// `[A-Za-z0-9._-]`, or if an `@` is followed by nothing.
    pub fn parse(input: &str) -> Result<Self, ManifestFieldError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ManifestFieldError::Empty);
        }

        let (name, rest) = match input.split_once('@') {
            Some((name, rest)) => (name, Some(rest)),
            None => (input, None),
        };

        if name.is_empty() {
            return Err(ManifestFieldError::Empty);
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
        {
            return Err(ManifestFieldError::InvalidName {
                name: name.to_string(),
                ch,
            });
        }

        let (version, hash) = match rest {
            None => (None, None),
            Some(rest) => {
                let (version, hash) = match rest.split_once('+') {
                    Some((v, h)) => (v, Some(h.to_string())),
                    None => (rest, None),
                };
                if version.is_empty() {
                    return Err(ManifestFieldError::EmptyVersion(input.to_string()));
                }
                (Some(version.to_string()), hash)
            }
        };

        Ok(Self {
            name: name.to_string(),
            version,
            hash,
        })
    }

    /// The manager this field names, if it is one we know.
    #[must_use]
    pub fn manager(&self) -> Option<PackageManagerName> {
        PackageManagerName::from_name(&self.name)
    }
}

/// The `packageManager` and `engines` fields of a package.json.
///
/// Built once from the manifest text and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    package_manager: Option<String>,
    engines: BTreeMap<String, String>,
}

impl Manifest {
    /// Parse package.json text.
    ///
    /// Unknown fields and non-string `engines` values are ignored.
    ///
    /// # Errors
    /// Returns an error if the text is not a JSON object.
    pub fn from_json(content: &str) -> Result<Self, Error> {
        let object: Map<String, Value> =
            serde_json::from_str(content).map_err(Error::ManifestParse)?;
        Ok(Self::from_object(&object))
    }

    /// Build from an already parsed package.json value.
    ///
    /// # Errors
    /// Returns an error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let object: Map<String, Value> =
            serde_json::from_value(value).map_err(Error::ManifestParse)?;
        Ok(Self::from_object(&object))
    }

    /// Read `package.json` from a project directory.
    ///
    /// # Errors
    /// Returns [`Error::ManifestNotFound`] if the file is missing.
    pub fn read_dir(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(MANIFEST_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ManifestNotFound {
                    dir: dir.to_path_buf(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json(&content)
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let package_manager = object
            .get("packageManager")
            .and_then(Value::as_str)
            .map(String::from);

        let engines = object
            .get("engines")
            .and_then(Value::as_object)
            .map(|engines| {
                engines
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            package_manager,
            engines,
        }
    }

    /// Raw `packageManager` value.
    #[must_use]
    pub fn package_manager(&self) -> Option<&str> {
        self.package_manager.as_deref()
    }

    /// Parsed `packageManager` value. Malformed values read as absent.
    #[must_use]
    pub fn package_manager_field(&self) -> Option<PackageManagerField> {
        let raw = self.package_manager.as_deref()?;
        match PackageManagerField::parse(raw) {
            Ok(field) => Some(field),
            Err(e) => {
                tracing::debug!(field = raw, error = %e, "ignoring malformed packageManager field");
                None
            }
        }
    }

    /// Raw `engines[name]` constraint.
    #[must_use]
    pub fn engine(&self, name: PackageManagerName) -> Option<&str> {
        self.engines.get(name.as_str()).map(String::as_str)
    }

    /// Known package managers that appear as `engines` keys, in priority order.
    #[must_use]
    pub fn engine_managers(&self) -> Vec<PackageManagerName> {
        PackageManagerName::ALL
            .into_iter()
            .filter(|pm| self.engines.contains_key(pm.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_name_and_version() {
        let field = PackageManagerField::parse("npm@7.5.2").unwrap();
        assert_eq!(field.name, "npm");
        assert_eq!(field.version.as_deref(), Some("7.5.2"));
        assert_eq!(field.hash, None);
        assert_eq!(field.manager(), Some(PackageManagerName::Npm));
    }

    #[test]
    fn test_field_without_version() {
        let field = PackageManagerField::parse("npm").unwrap();
        assert_eq!(field.version, None);
    }

    #[test]
    fn test_field_with_corepack_hash() {
        let field = PackageManagerField::parse("pnpm@8.6.0+sha512.deadbeef").unwrap();
        assert_eq!(field.version.as_deref(), Some("8.6.0"));
        assert_eq!(field.hash.as_deref(), Some("sha512.deadbeef"));
    }

    #[test]
    fn test_field_invalid_name() {
        assert_eq!(
            PackageManagerField::parse("npm^@1.2.3"),
            Err(ManifestFieldError::InvalidName {
                name: "npm^".to_string(),
                ch: '^'
            })
        );
        assert!(PackageManagerField::parse("@1.2.3").is_err());
        assert!(PackageManagerField::parse("npm@").is_err());
        assert!(PackageManagerField::parse("  ").is_err());
    }

    #[test]
    fn test_field_unknown_manager() {
        let field = PackageManagerField::parse("bun@1.0.0").unwrap();
        assert_eq!(field.manager(), None);
    }

    #[test]
    fn test_manifest_reads_fields() {
        let manifest = Manifest::from_value(json!({
            "name": "app",
            "packageManager": "yarn@3.6.0",
            "engines": { "node": ">=18", "yarn": ">=3 <4", "npm": 7 }
        }))
        .unwrap();

        assert_eq!(manifest.package_manager(), Some("yarn@3.6.0"));
        assert_eq!(manifest.engine(PackageManagerName::Yarn), Some(">=3 <4"));
        // Non-string values are ignored
        assert_eq!(manifest.engine(PackageManagerName::Npm), None);
        assert_eq!(manifest.engine_managers(), vec![PackageManagerName::Yarn]);
    }

    #[test]
    fn test_manifest_non_string_package_manager() {
        let manifest = Manifest::from_value(json!({ "packageManager": ["npm"] })).unwrap();
        assert_eq!(manifest.package_manager(), None);
        assert_eq!(manifest.package_manager_field(), None);
    }

    #[test]
    fn test_manifest_malformed_field_reads_as_absent() {
        let manifest = Manifest::from_value(json!({ "packageManager": "npm^@1.2.3" })).unwrap();
        assert_eq!(manifest.package_manager(), Some("npm^@1.2.3"));
        assert_eq!(manifest.package_manager_field(), None);
    }

    #[test]
    fn test_manifest_rejects_non_object() {
        assert!(matches!(
            Manifest::from_json("[1, 2]"),
            Err(Error::ManifestParse(_))
        ));
        assert!(matches!(
            Manifest::from_json("{ not json"),
            Err(Error::ManifestParse(_))
        ));
    }

    #[test]
    fn test_read_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Manifest::read_dir(dir.path()),
            Err(Error::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_NAME),
            r#"{ "packageManager": "pnpm@9.1.0" }"#,
        )
        .unwrap();
        let manifest = Manifest::read_dir(dir.path()).unwrap();
        assert_eq!(manifest.package_manager(), Some("pnpm@9.1.0"));
    }
}
