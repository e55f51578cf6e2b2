//! Error types for AAR packaging operations.
//!
//! Covers I/O and zip failures plus the ABI consistency checks that guard
//! against shipping an archive with missing or unexpected architectures.

use crate::abi::AndroidAbi;
use thiserror::Error;

/// Errors arising from AAR packaging.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (reading shared objects, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a zip entry failed.
    #[error("zip error during packaging: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// No ABIs were declared for packaging.
    #[error("no ABIs declared for packaging")]
    NoAbis,

    /// A declared ABI has no shared object.
    #[error("declared ABI {abi} has no shared object to package")]
    MissingAbi {
        /// The ABI without a shared object.
        abi: AndroidAbi,
    },

    /// Shared objects were supplied for an ABI that is not declared.
    #[error("shared objects supplied for undeclared ABI {abi}")]
    UndeclaredAbi {
        /// The unexpected ABI.
        abi: AndroidAbi,
    },

    /// A computed digest failed validation.
    #[error("invalid digest: {reason}")]
    InvalidDigest {
        /// Description of the validation failure.
        reason: String,
    },
}
