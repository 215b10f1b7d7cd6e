//! Engine constraint parsing.
//!
//! Parses constraint strings such as:
//! - `7.5.0` (implicit `=`)
//! - `>=6.0.0 <8.0.0`
//! - `=8` or `<=9.1`
//!
//! Parsing is all-or-nothing: a [`Requirement`] only exists when every token
//! of the input was a valid clause.

use super::name::PackageManagerName;
use regex_lite::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Error parsing a constraint string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    /// No constraint at all. Callers treat this as absence.
    #[error("empty constraint for {name}")]
    Empty { name: PackageManagerName },

    #[error("invalid constraint for {name}: '{constraint}' (bad token '{token}')")]
    Invalid {
        name: PackageManagerName,
        constraint: String,
        token: String,
    },
}

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Gte,
    Lte,
    Gt,
    Lt,
}

impl Op {
    /// Longest operators first, so `>=` is not read as `>` followed by `=`.
    const BY_LENGTH: [Self; 5] = [Self::Gte, Self::Lte, Self::Gt, Self::Lt, Self::Eq];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(operator, version)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    pub op: Op,
    /// Version without any leading `v`.
    pub version: String,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A parsed engine constraint: a non-empty, ordered list of clauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    clauses: Vec<Clause>,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^v?(\d+(?:\.\d+(?:\.\d+(?:-[0-9A-Za-z][0-9A-Za-z.-]*)?(?:\+[0-9A-Za-z][0-9A-Za-z.-]*)?)?)?)$",
        )
        .expect("version regex is valid")
    })
}

/// Parse a bare version token (`8`, `8.1`, `v8.1.0`, `8.1.0-rc.1`).
///
/// Returns the version without its `v` prefix.
#[must_use]
pub fn parse_version_token(token: &str) -> Option<&str> {
    version_regex()
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Check whether a string is a plain dotted version (no operators, no ranges).
#[must_use]
pub fn is_plain_version(s: &str) -> bool {
    parse_version_token(s.trim()).is_some()
}

fn parse_clause(token: &str) -> Option<Clause> {
    let (op, rest) = Op::BY_LENGTH
        .iter()
        .find_map(|op| token.strip_prefix(op.as_str()).map(|rest| (*op, rest)))
        .unwrap_or((Op::Eq, token));

    let version = parse_version_token(rest)?;
    Some(Clause {
        op,
        version: version.to_string(),
    })
}

impl Requirement {
    /// Parse a constraint string declared for `name`.
    ///
    /// # Errors
    /// Returns [`RequirementError::Empty`] for blank input and
    /// [`RequirementError::Invalid`] if any token is not `<op><version>`.
    pub fn parse(constraint: &str, name: PackageManagerName) -> Result<Self, RequirementError> {
        let constraint = constraint.trim();
        if constraint.is_empty() {
            return Err(RequirementError::Empty { name });
        }

        let clauses = constraint
            .split_whitespace()
            .map(|token| {
                parse_clause(token).ok_or_else(|| RequirementError::Invalid {
                    name,
                    constraint: constraint.to_string(),
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { clauses })
    }

    /// The clauses in declaration order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The version of a single `=` clause, if that is all this requirement says.
    #[must_use]
    pub fn pinned_version(&self) -> Option<&str> {
        match self.clauses.as_slice() {
            [Clause { op: Op::Eq, version }] => Some(version),
            _ => None,
        }
    }

    /// Convert to a [`semver::VersionReq`].
    ///
    /// Returns `None` when semver rejects a clause (e.g. build metadata).
    #[must_use]
    pub fn to_version_req(&self) -> Option<semver::VersionReq> {
        let joined = self
            .clauses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        semver::VersionReq::parse(&joined).ok()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

impl Serialize for Requirement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NPM: PackageManagerName = PackageManagerName::Npm;

    fn pairs(req: &Requirement) -> Vec<(Op, &str)> {
        req.clauses()
            .iter()
            .map(|c| (c.op, c.version.as_str()))
            .collect()
    }

    #[test]
    fn test_bare_version_is_implicit_eq() {
        let req = Requirement::parse("7.5.0", NPM).unwrap();
        assert_eq!(pairs(&req), vec![(Op::Eq, "7.5.0")]);
        assert_eq!(req.pinned_version(), Some("7.5.0"));
    }

    #[test]
    fn test_range_keeps_order() {
        let req = Requirement::parse(">=6.0.0 <8.0.0", NPM).unwrap();
        assert_eq!(pairs(&req), vec![(Op::Gte, "6.0.0"), (Op::Lt, "8.0.0")]);
        assert_eq!(req.pinned_version(), None);
    }

    #[test]
    fn test_all_operators() {
        let req = Requirement::parse("=1 >=2.0 <=3.0.0 >4 <5.1", NPM).unwrap();
        assert_eq!(
            pairs(&req),
            vec![
                (Op::Eq, "1"),
                (Op::Gte, "2.0"),
                (Op::Lte, "3.0.0"),
                (Op::Gt, "4"),
                (Op::Lt, "5.1"),
            ]
        );
    }

    #[test]
    fn test_v_prefix_and_prerelease() {
        let req = Requirement::parse("v8.0.0-rc.1", NPM).unwrap();
        assert_eq!(req.pinned_version(), Some("8.0.0-rc.1"));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(
            Requirement::parse("", NPM),
            Err(RequirementError::Empty { name: NPM })
        );
        assert_eq!(
            Requirement::parse("   \t", NPM),
            Err(RequirementError::Empty { name: NPM })
        );
    }

    #[test]
    fn test_one_bad_token_fails_whole_string() {
        let err = Requirement::parse(">=6.0.0 ^8", NPM).unwrap_err();
        match err {
            RequirementError::Invalid {
                name,
                constraint,
                token,
            } => {
                assert_eq!(name, NPM);
                assert_eq!(constraint, ">=6.0.0 ^8");
                assert_eq!(token, "^8");
            }
            RequirementError::Empty { .. } => panic!("expected Invalid"),
        }
    }

    #[test]
    fn test_rejects_npm_range_syntax() {
        assert!(Requirement::parse("~7.0.0", NPM).is_err());
        assert!(Requirement::parse("7.x", NPM).is_err());
        assert!(Requirement::parse("1.0.0 - 2.0.0", NPM).is_err());
        assert!(Requirement::parse(">= 7", NPM).is_err());
        assert!(Requirement::parse("1.2-beta", NPM).is_err());
    }

    #[test]
    fn test_display_round_trips_clauses() {
        let req = Requirement::parse(">=7.0.0   <8.0.0", NPM).unwrap();
        assert_eq!(req.to_string(), ">=7.0.0 <8.0.0");
        assert_eq!(Requirement::parse(&req.to_string(), NPM).unwrap(), req);
    }

    #[test]
    fn test_to_version_req() {
        let req = Requirement::parse(">=7.0.0 <8.0.0", NPM).unwrap();
        let vr = req.to_version_req().unwrap();
        assert!(vr.matches(&semver::Version::new(7, 5, 2)));
        assert!(!vr.matches(&semver::Version::new(8, 0, 0)));

        let exact = Requirement::parse("8.0.0", NPM).unwrap().to_version_req().unwrap();
        assert!(exact.matches(&semver::Version::new(8, 0, 0)));
        assert!(!exact.matches(&semver::Version::new(8, 0, 1)));
    }

    #[test]
    fn test_is_plain_version() {
        assert!(is_plain_version("7.5.2"));
        assert!(is_plain_version("6"));
        assert!(!is_plain_version(">=7"));
        assert!(!is_plain_version("^7.0.0"));
        assert!(!is_plain_version("latest"));
    }
}
