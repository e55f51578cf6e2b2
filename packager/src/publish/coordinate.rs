//! Maven publication coordinates.
//!
//! A coordinate is the (group, artifact, version) triple that identifies one
//! published artifact. The group is a dotted identifier; artifact id and
//! version are free-form but must be safe to use as path segments.

use crate::error::{PackagerError, Result};
use std::fmt;

/// A validated Maven coordinate.
///
/// # Examples
///
/// ```
/// use spatialite_aar::publish::coordinate::Coordinate;
///
/// let coordinate = Coordinate::new("org.spatialite", "spatialite", "2.0.10")
///     .expect("valid coordinate");
/// assert_eq!(coordinate.to_string(), "org.spatialite:spatialite:2.0.10");
/// assert_eq!(
///     coordinate.file_path("aar"),
///     "org/spatialite/spatialite/2.0.10/spatialite-2.0.10.aar"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    group: String,
    artifact: String,
    version: String,
}

impl Coordinate {
    /// Validate and build a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidCoordinate`] naming the first invalid
    /// component.
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let coordinate = Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        };
        validate_dotted_identifier("group", &coordinate.group)?;
        validate_path_segment("artifact", &coordinate.artifact)?;
        validate_path_segment("version", &coordinate.version)?;
        Ok(coordinate)
    }

    /// Return the group identifier.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Return the artifact identifier.
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Return the version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return a copy with a different version.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidCoordinate`] if `version` is invalid.
    pub fn with_version(&self, version: impl Into<String>) -> Result<Self> {
        Self::new(self.group.clone(), self.artifact.clone(), version)
    }

    /// Repository-relative directory holding every version of the artifact.
    #[must_use]
    pub fn artifact_dir(&self) -> String {
        format!("{}/{}", self.group.replace('.', "/"), self.artifact)
    }

    /// Repository-relative directory holding this version.
    #[must_use]
    pub fn version_dir(&self) -> String {
        format!("{}/{}", self.artifact_dir(), self.version)
    }

    /// File name of this version's file with the given extension.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}-{}.{extension}", self.artifact, self.version)
    }

    /// Repository-relative path of this version's file with the given extension.
    #[must_use]
    pub fn file_path(&self, extension: &str) -> String {
        format!("{}/{}", self.version_dir(), self.file_name(extension))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Why `value` is not a dotted Java-style identifier such as
/// `org.spatialite`, or `None` when it is one.
///
/// Shared with the manifest namespace check, which follows the same rule.
pub(crate) fn dotted_identifier_problem(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some("must not be empty");
    }
    for segment in value.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            None => return Some("contains an empty segment"),
            Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
                return Some("segments must start with a letter or underscore");
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Some("segments may only contain letters, digits, and underscores");
        }
    }
    None
}

fn validate_dotted_identifier(field: &'static str, value: &str) -> Result<()> {
    match dotted_identifier_problem(value) {
        None => Ok(()),
        Some(reason) => Err(PackagerError::InvalidCoordinate {
            field,
            value: value.to_owned(),
            reason: reason.to_owned(),
        }),
    }
}

fn validate_path_segment(field: &'static str, value: &str) -> Result<()> {
    let invalid = |reason: &str| PackagerError::InvalidCoordinate {
        field,
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value == "." || value == ".." {
        return Err(invalid("must not be a relative path component"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':'))
    {
        return Err(invalid(&format!("must not contain {bad:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn maps_to_maven_layout() {
        let coordinate =
            Coordinate::new("org.spatialite", "spatialite", "2.0.10").expect("valid coordinate");
        assert_eq!(coordinate.artifact_dir(), "org/spatialite/spatialite");
        assert_eq!(coordinate.version_dir(), "org/spatialite/spatialite/2.0.10");
        assert_eq!(coordinate.file_name("pom"), "spatialite-2.0.10.pom");
    }

    #[rstest]
    #[case::empty_group("", "spatialite", "1.0", "group")]
    #[case::double_dot("org..spatialite", "spatialite", "1.0", "group")]
    #[case::digit_segment("org.1spatialite", "spatialite", "1.0", "group")]
    #[case::slash_artifact("org.spatialite", "spatia/lite", "1.0", "artifact")]
    #[case::empty_version("org.spatialite", "spatialite", "", "version")]
    #[case::spaced_version("org.spatialite", "spatialite", "2.0 beta", "version")]
    #[case::parent_version("org.spatialite", "spatialite", "..", "version")]
    fn rejects_invalid_components(
        #[case] group: &str,
        #[case] artifact: &str,
        #[case] version: &str,
        #[case] field: &str,
    ) {
        let err = Coordinate::new(group, artifact, version).expect_err("invalid coordinate");
        assert!(
            matches!(err, PackagerError::InvalidCoordinate { field: f, .. } if f == field),
            "expected {field} to be rejected, got {err:?}"
        );
    }

    #[test]
    fn with_version_keeps_group_and_artifact() {
        let coordinate =
            Coordinate::new("org.spatialite", "spatialite", "2.0.8").expect("valid coordinate");
        let bumped = coordinate.with_version("2.0.10").expect("valid version");
        assert_eq!(bumped.to_string(), "org.spatialite:spatialite:2.0.10");
    }
}
