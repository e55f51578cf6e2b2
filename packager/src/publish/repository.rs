//! Publication destinations.
//!
//! A [`Repository`] stores files at Maven-layout relative paths. Version
//! files are handed over as one batch so each backend can make the version
//! appear as a unit; metadata is written separately afterwards.

use super::coordinate::Coordinate;
use super::error::PublishError;
use super::http::{Credentials, HttpRepository};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::Write;

/// One file of a version publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    /// File name inside the version directory.
    pub name: String,
    /// File contents.
    pub contents: Vec<u8>,
}

/// A Maven repository that can receive a publication.
#[cfg_attr(test, mockall::automock)]
pub trait Repository {
    /// Human-readable location for messages.
    fn describe(&self) -> String;

    /// Whether a file exists at the repository-relative `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be queried.
    fn exists(&self, path: &str) -> Result<bool, PublishError>;

    /// Read the file at `path`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be read.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, PublishError>;

    /// Store every file of `coordinate`'s version directory.
    ///
    /// On failure no file of the version is left behind, or the error names
    /// the ones that could not be removed.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::DuplicateCoordinate`] if the version already
    /// exists, [`PublishError::IncompleteRollback`] if a failed upload could
    /// not be fully undone, or an I/O or HTTP error.
    fn publish_version(
        &self,
        coordinate: &Coordinate,
        files: &[PublishedFile],
    ) -> Result<(), PublishError>;

    /// Create or replace the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O or HTTP error.
    fn write(&self, path: &str, contents: &[u8]) -> Result<(), PublishError>;
}

/// Open the repository named by `value`.
///
/// `http://` and `https://` URLs select [`HttpRepository`] with
/// `credentials`; `file://` URLs and plain paths select [`LocalRepository`],
/// with relative paths resolved against `project_root`.
///
/// # Errors
///
/// Returns [`PublishError::InvalidRepository`] for other URL schemes or an
/// empty value.
pub fn open_repository(
    value: &str,
    project_root: &Utf8Path,
    credentials: Option<Credentials>,
) -> Result<Box<dyn Repository>, PublishError> {
    let invalid = |reason: &str| PublishError::InvalidRepository {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };
    if value.trim().is_empty() {
        return Err(invalid("repository must not be empty"));
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(Box::new(HttpRepository::new(value, credentials)));
    }
    if let Some(path) = value.strip_prefix("file://") {
        if path.is_empty() {
            return Err(invalid("file:// URL has no path"));
        }
        return Ok(Box::new(LocalRepository::new(project_root.join(path))));
    }
    if value.contains("://") {
        return Err(invalid("expected a path, file://, http://, or https:// URL"));
    }
    Ok(Box::new(LocalRepository::new(project_root.join(value))))
}

/// A Maven repository in a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
    root: Utf8PathBuf,
}

impl LocalRepository {
    /// Repository rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl Repository for LocalRepository {
    fn describe(&self) -> String {
        self.root.to_string()
    }

    fn exists(&self, path: &str) -> Result<bool, PublishError> {
        Ok(self.root.join(path).exists())
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, PublishError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(full)?))
    }

    /// Stage files in a temporary directory beside the version directory and
    /// rename it into place, so the version is either complete or absent.
    fn publish_version(
        &self,
        coordinate: &Coordinate,
        files: &[PublishedFile],
    ) -> Result<(), PublishError> {
        let artifact_dir = self.root.join(coordinate.artifact_dir());
        let version_dir = self.root.join(coordinate.version_dir());
        if version_dir.exists() {
            return Err(PublishError::DuplicateCoordinate {
                coordinate: coordinate.clone(),
            });
        }

        fs::create_dir_all(&artifact_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&artifact_dir)?;
        for file in files {
            fs::write(staging.path().join(&file.name), &file.contents)?;
        }
        fs::rename(staging.path(), &version_dir)?;
        debug!("published {} files to {version_dir}", files.len());
        Ok(())
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<(), PublishError> {
        let full = self.root.join(path);
        let parent = full.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(contents)?;
        staged.persist(&full).map_err(|e| PublishError::Io(e.error))?;
        Ok(())
    }
}
