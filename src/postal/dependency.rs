//! Dependency records from `buildpack.toml` and version handling.

use chrono::{DateTime, NaiveDate, Utc};
use semver::{Version, VersionReq};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `[[metadata.dependencies]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub stacks: Vec<String>,
    #[serde(default)]
    pub uri: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`, written either as a TOML
    /// datetime or as a string.
    #[serde(
        default,
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub deprecation_date: Option<String>,
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<toml::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(toml::Value::Datetime(datetime)) => Ok(Some(datetime.to_string())),
        Some(toml::Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(de::Error::custom(format!(
            "invalid deprecation_date: expected a date, found {}",
            other.type_str()
        ))),
    }
}

impl Dependency {
    /// `"*"` in `stacks` matches every stack.
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.iter().any(|s| s == stack || s == "*")
    }

    pub fn deprecation_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.deprecation_date.as_deref()?.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            return Some(datetime.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn is_deprecated(&self, now: DateTime<Utc>) -> bool {
        self.deprecation_date()
            .map(|date| date <= now)
            .unwrap_or(false)
    }
}

/// The parts of `buildpack.toml` the dependency service reads.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BuildpackToml {
    #[serde(default)]
    pub metadata: BuildpackMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BuildpackMetadata {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default, rename = "default-versions")]
    pub default_versions: HashMap<String, String>,
}

/// Parses a dependency version, padding missing minor/patch components
/// (`1.1` becomes `1.1.0`).
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim().trim_start_matches('v');
    let split = trimmed.find(&['-', '+'][..]).unwrap_or(trimmed.len());
    let (core, rest) = trimmed.split_at(split);

    let mut parts: Vec<&str> = core.split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }

    Version::parse(&format!("{}{}", parts.join("."), rest))
}

/// Parses a version constraint. A bare version is an exact match rather than
/// semver's default caret requirement.
pub fn parse_constraint(raw: &str) -> Result<VersionReq, semver::Error> {
    let trimmed = raw.trim();
    match Version::parse(trimmed) {
        Ok(version) => VersionReq::parse(&format!("={}", version)),
        Err(_) => VersionReq::parse(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        full = { "1.1.4", "1.1.4" },
        two_parts = { "1.1", "1.1.0" },
        one_part = { "2", "2.0.0" },
        leading_v = { "v1.2.3", "1.2.3" },
        prerelease = { "1.2-beta.1", "1.2.0-beta.1" },
    )]
    fn test_parse_version(raw: &str, expected: &str) {
        assert_eq!(parse_version(raw).unwrap(), Version::parse(expected).unwrap());
    }

    #[parameterized(
        star = { "*", "1.1.4", true },
        wildcard_minor = { "1.1.*", "1.1.4", true },
        wildcard_minor_miss = { "1.1.*", "1.2.0", false },
        caret = { "^1.1", "1.9.0", true },
        exact = { "1.1.4", "1.1.4", true },
        exact_is_not_caret = { "1.1.4", "1.1.5", false },
    )]
    fn test_parse_constraint(constraint: &str, version: &str, matches: bool) {
        let req = parse_constraint(constraint).unwrap();
        assert_eq!(req.matches(&Version::parse(version).unwrap()), matches);
    }

    #[test]
    fn test_supports_stack() {
        let dependency = Dependency {
            stacks: vec!["io.buildpacks.stacks.bionic".to_string()],
            ..Default::default()
        };
        assert!(dependency.supports_stack("io.buildpacks.stacks.bionic"));
        assert!(!dependency.supports_stack("io.paketo.stacks.tiny"));

        let any = Dependency {
            stacks: vec!["*".to_string()],
            ..Default::default()
        };
        assert!(any.supports_stack("io.paketo.stacks.tiny"));
    }

    #[test]
    fn test_deprecation_date() {
        let dependency: Dependency = toml::from_str(
            r#"
id = "poetry"
version = "1.1.4"
deprecation_date = 2021-04-01T00:00:00Z
"#,
        )
        .unwrap();

        let before = DateTime::parse_from_rfc3339("2021-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let after = DateTime::parse_from_rfc3339("2021-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(!dependency.is_deprecated(before));
        assert!(dependency.is_deprecated(after));
    }

    #[test]
    fn test_deprecation_date_local_date() {
        let dependency: Dependency = toml::from_str(
            "id = \"poetry\"\nversion = \"1.1.4\"\ndeprecation_date = 2021-04-01\n",
        )
        .unwrap();

        let date = dependency.deprecation_date().unwrap();
        assert_eq!(date.to_rfc3339(), "2021-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_deprecation_date_quoted_string() {
        let dependency: Dependency = toml::from_str(
            "id = \"poetry\"\nversion = \"1.1.4\"\ndeprecation_date = \"2021-04-01T00:00:00Z\"\n",
        )
        .unwrap();

        let date = dependency.deprecation_date().unwrap();
        assert_eq!(date.to_rfc3339(), "2021-04-01T00:00:00+00:00");
        assert!(dependency.is_deprecated(Utc::now()));
    }

    #[test]
    fn test_deprecation_date_wrong_type() {
        let result: Result<Dependency, _> =
            toml::from_str("id = \"poetry\"\nversion = \"1.1.4\"\ndeprecation_date = 2021\n");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("deprecation_date"));
    }

    #[test]
    fn test_no_deprecation_date() {
        let dependency = Dependency::default();
        assert!(!dependency.is_deprecated(Utc::now()));
    }
}
