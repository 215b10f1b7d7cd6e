//! Feature flags gating optional resolver behavior.
//!
//! Flags are looked up by name. A flag with no explicit value falls back to
//! its entry in [`DEFAULTS`]; a flag missing from both is disabled.

use std::collections::BTreeMap;

/// Environment variable holding flag overrides, e.g. `a,-b`.
pub const FEATURES_ENV: &str = "NODEPM_FEATURES";

/// Report versions below the support window as unsupported.
pub const UNSUPPORTED_VERSION_CHECK: &str = "unsupported_version_check";

/// Bound the installed-version probe by the configured timeout.
pub const SHARED_COMMAND_TIMEOUT: &str = "shared_command_timeout";

/// Documented default for every known flag.
pub const DEFAULTS: &[(&str, bool)] = &[
    (UNSUPPORTED_VERSION_CHECK, true),
    (SHARED_COMMAND_TIMEOUT, false),
];

/// Source of feature flag values.
pub trait FeatureFlags {
    fn enabled(&self, name: &str) -> bool;
}

/// Look up the documented default for a flag.
#[must_use]
pub fn default_for(name: &str) -> bool {
    DEFAULTS
        .iter()
        .find(|(flag, _)| *flag == name)
        .is_some_and(|(_, value)| *value)
}

/// Flags with explicit overrides on top of [`DEFAULTS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticFeatureFlags {
    overrides: BTreeMap<String, bool>,
}

impl StaticFeatureFlags {
    /// Create flags with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag explicitly.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.overrides.insert(name.into(), enabled);
        self
    }

    /// Parse a comma-separated override list.
    ///
    /// `name` enables a flag and `-name` disables it. Blank entries are skipped.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut flags = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.strip_prefix('-') {
                Some(name) if !name.is_empty() => {
                    flags.overrides.insert(name.to_string(), false);
                }
                Some(_) => {}
                None => {
                    flags.overrides.insert(entry.to_string(), true);
                }
            }
        }
        flags
    }

    /// Read overrides from [`FEATURES_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(FEATURES_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

impl FeatureFlags for StaticFeatureFlags {
    fn enabled(&self, name: &str) -> bool {
        self.overrides
            .get(name)
            .copied()
            .unwrap_or_else(|| default_for(name))
    }
}
