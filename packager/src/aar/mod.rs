//! AAR assembly.
//!
//! Turns per-ABI shared objects into a single Android archive with the
//! layout the Android Gradle plugin produces for native-only libraries.
//!
//! # Sub-modules
//!
//! - [`digest`]: SHA-256 digest newtype and hashing helpers.
//! - [`manifest`]: `AndroidManifest.xml` rendering.
//! - [`packaging`]: Archive creation.
//! - [`packaging_error`]: Error types for packaging operations.

pub mod digest;
pub mod manifest;
pub mod packaging;
pub mod packaging_error;
