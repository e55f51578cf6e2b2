//! Maven publication of the packaged AAR.
//!
//! # Sub-modules
//!
//! - [`coordinate`]: Validated group/artifact/version triple and layout paths.
//! - [`error`]: Error types for publication.
//! - [`http`]: `PUT`-based HTTP repository backend.
//! - [`metadata`]: `maven-metadata.xml` parsing and rendering.
//! - [`pom`]: POM rendering.
//! - [`publisher`]: The publication state machine.
//! - [`repository`]: The repository trait and the local directory backend.

pub mod coordinate;
pub mod error;
pub mod http;
pub mod metadata;
pub mod pom;
pub mod publisher;
pub mod repository;
