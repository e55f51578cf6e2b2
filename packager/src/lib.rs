//! SpatiaLite Android library packager.
//!
//! This crate builds the SpatiaLite native library and its dependencies for
//! the supported Android ABIs, packages the shared objects as an AAR, and
//! publishes the AAR to a Maven repository. It is used by the
//! `spatialite-aar` CLI binary and can be driven programmatically for testing
//! or custom release workflows.
//!
//! # Modules
//!
//! - [`aar`] - AAR assembly, manifests, and digests
//! - [`abi`] - Supported Android ABIs and ABI sets
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Build description loading, overrides, and validation
//! - [`error`] - Semantic error types naming the failing stage and ABI
//! - [`executor`] - External command abstraction
//! - [`lock`] - Work directory locking
//! - [`native`] - CMake configure and build per ABI
//! - [`ndk`] - Android NDK discovery and version pinning
//! - [`output`] - User-facing progress and dry-run output
//! - [`pipeline`] - Typed stage composition
//! - [`publish`] - Maven coordinates, POMs, metadata, and repositories
//! - [`static_libs`] - Static library build and archive verification

pub mod aar;
pub mod abi;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod lock;
pub mod native;
pub mod ndk;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod static_libs;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
