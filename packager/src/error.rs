//! Error types for the AAR packaging pipeline.
//!
//! This module defines semantic error variants that tell the user which stage
//! failed and, where the failure is tied to one architecture, which ABI. Each
//! variant carries enough context to act on without re-running with `-v`.

use crate::aar::packaging_error::PackagingError;
use crate::abi::AndroidAbi;
use crate::publish::error::PublishError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while building, packaging, or publishing the AAR.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The build description file could not be read.
    #[error("failed to read build description {path}: {reason}")]
    ConfigRead {
        /// Path of the build description.
        path: Utf8PathBuf,
        /// Description of the I/O failure.
        reason: String,
    },

    /// The build description file is not valid TOML or has unknown keys.
    #[error("invalid build description {path}: {reason}")]
    ConfigParse {
        /// Path of the build description.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// A configuration value violates a constraint.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },

    /// An ABI identifier is not in the supported set.
    #[error("unsupported ABI \"{value}\"; expected one of: {expected}")]
    UnsupportedAbi {
        /// The rejected identifier.
        value: String,
        /// Comma-separated list of accepted identifiers.
        expected: String,
    },

    /// ABIs declared for packaging are not built as static archives.
    #[error("ABIs {missing} are packaged but not requested from the static library build")]
    AbiSetMismatch {
        /// Comma-separated list of packaged ABIs without static archives.
        missing: String,
    },

    /// A publication coordinate component is malformed.
    #[error("invalid publication coordinate {field} \"{value}\": {reason}")]
    InvalidCoordinate {
        /// Which component was rejected (group, artifact, version).
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Description of the violated rule.
        reason: String,
    },

    /// No usable Android NDK could be located.
    #[error("Android NDK not found: {reason}; set NDK_HOME or pass --ndk-home")]
    NdkNotFound {
        /// Description of where the search looked.
        reason: String,
    },

    /// The NDK on disk does not match the pinned version.
    #[error("NDK at {path} is version {found}, but {expected} is pinned")]
    NdkVersionMismatch {
        /// Root of the NDK that was found.
        path: Utf8PathBuf,
        /// Pinned version from the build description.
        expected: String,
        /// Version reported by the NDK's `source.properties`.
        found: String,
    },

    /// The static library build script exited unsuccessfully.
    #[error("static library build failed: {reason}")]
    StaticBuildFailed {
        /// Captured stderr or spawn failure.
        reason: String,
    },

    /// A static archive expected after the static build is absent.
    #[error("static archive for {abi} missing at {path}")]
    StaticArchiveMissing {
        /// ABI whose archive is missing.
        abi: AndroidAbi,
        /// Path that was checked.
        path: Utf8PathBuf,
    },

    /// Configuring or building the native CMake project failed for one ABI.
    #[error("native {step} failed for {abi}: {reason}")]
    NativeBuildFailed {
        /// ABI being built.
        abi: AndroidAbi,
        /// Which CMake step failed (configure or build).
        step: &'static str,
        /// Captured stderr or spawn failure.
        reason: String,
    },

    /// The native build produced no shared object for an ABI.
    #[error("no shared object produced for {abi} in {dir}")]
    SharedObjectMissing {
        /// ABI without output.
        abi: AndroidAbi,
        /// Directory that was scanned.
        dir: Utf8PathBuf,
    },

    /// The same shared object name is both built and supplied prebuilt.
    #[error("shared object {name} for {abi} is both built and supplied in jniLibs")]
    DuplicateSharedObject {
        /// ABI with the conflicting library.
        abi: AndroidAbi,
        /// File name that appears twice.
        name: String,
    },

    /// Another run holds the work directory lock.
    #[error("work directory {path} is locked by another run")]
    WorkDirLocked {
        /// Path of the lock file.
        path: Utf8PathBuf,
    },

    /// A path on disk is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// Packaging the AAR failed.
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    /// Publishing the artifact failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
