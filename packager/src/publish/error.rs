//! Error types for Maven publication.

use super::coordinate::Coordinate;
use thiserror::Error;

/// Errors arising from publishing an artifact to a Maven repository.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The destination already holds files for this coordinate.
    #[error("{coordinate} is already published; bump the version to publish again")]
    DuplicateCoordinate {
        /// The coordinate that already exists.
        coordinate: Coordinate,
    },

    /// An HTTP request failed.
    #[error("HTTP request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// An upload failed and files already uploaded could not all be removed.
    #[error("{cause}; these files are left in the repository: {}", .left.join(", "))]
    IncompleteRollback {
        /// The failure that aborted the upload.
        cause: Box<PublishError>,
        /// Repository-relative paths that are still present.
        left: Vec<String>,
    },

    /// The configured repository is not a path, `file://`, or `http(s)://` URL.
    #[error("unsupported repository \"{value}\": {reason}")]
    InvalidRepository {
        /// The configured repository string.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Existing `maven-metadata.xml` could not be understood.
    #[error("cannot update {path}: {reason}")]
    Metadata {
        /// Repository-relative path of the metadata file.
        path: String,
        /// Description of the problem.
        reason: String,
    },

    /// A publication was attempted twice.
    #[error("publication of {coordinate} was already attempted")]
    AlreadyAttempted {
        /// The coordinate of the earlier attempt.
        coordinate: Coordinate,
    },

    /// I/O error reading the artifact or writing a local repository.
    #[error("I/O error during publication: {0}")]
    Io(#[from] std::io::Error),
}
