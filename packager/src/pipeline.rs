//! Typed build pipeline.
//!
//! Each step is a [`Stage`] whose output type is the next stage's input
//! type, and stages are composed with [`StageExt::then`]. Running packaging
//! without native objects, or publishing without a packaged artifact, does
//! not type-check.
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | [`DiscardStaleArtifactStage`] | `()` | `()` |
//! | [`StaticLibraryStage`] | `()` | [`StaticArchives`] |
//! | [`NativeBuildStage`] | [`StaticArchives`] | [`SharedObjects`] |
//! | [`PackagingStage`] | [`SharedObjects`] | [`PackagedArtifact`] |
//! | [`PublicationStage`] | [`PackagedArtifact`] | [`PublicationReceipt`] |

use crate::aar::manifest::LibraryManifest;
use crate::aar::packaging::{AarParams, PackagedAar, package_aar};
use crate::config::BuildPlan;
use crate::error::Result;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::native::{NativeBuilder, SharedObjects};
use crate::ndk::Ndk;
use crate::output::{
    packaged_message, published_message, static_libs_message, write_line,
};
use crate::publish::coordinate::Coordinate;
use crate::publish::publisher::{Publication, PublicationReceipt};
use crate::publish::repository::Repository;
use crate::static_libs::{StaticArchives, StaticLibraryBuilder};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};

/// Everything the build stages share.
#[derive(Clone, Copy)]
pub struct BuildEnvironment<'a> {
    /// Validated build description.
    pub plan: &'a BuildPlan,
    /// Located NDK.
    pub ndk: &'a Ndk,
    /// Runner for the static build script and CMake.
    pub executor: &'a dyn CommandExecutor,
    /// CMake build parallelism.
    pub jobs: Option<usize>,
}

/// User-facing progress sink.
pub struct Progress<'w> {
    stderr: &'w mut dyn Write,
    quiet: bool,
}

impl<'w> Progress<'w> {
    /// Report to `stderr` unless `quiet`.
    pub fn new(stderr: &'w mut dyn Write, quiet: bool) -> Self {
        Self { stderr, quiet }
    }

    /// Write one progress line.
    pub fn line(&mut self, message: impl std::fmt::Display) {
        if !self.quiet {
            write_line(self.stderr, message);
        }
    }
}

/// One step of the pipeline.
pub trait Stage {
    /// Value consumed from the previous stage.
    type Input;
    /// Value handed to the next stage.
    type Output;

    /// Short name used in progress output.
    fn name(&self) -> &'static str;

    /// Run the stage.
    ///
    /// # Errors
    ///
    /// Returns the stage's failure; later stages do not run.
    fn run(&self, input: Self::Input, progress: &mut Progress<'_>) -> Result<Self::Output>;
}

/// Two stages run in sequence.
#[derive(Debug, Clone, Copy)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Stage for Chain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn name(&self) -> &'static str {
        self.second.name()
    }

    fn run(&self, input: Self::Input, progress: &mut Progress<'_>) -> Result<Self::Output> {
        let intermediate = self.first.run(input, progress)?;
        self.second.run(intermediate, progress)
    }
}

/// Composition helpers for [`Stage`].
pub trait StageExt: Stage + Sized {
    /// Run `next` on this stage's output.
    fn then<B>(self, next: B) -> Chain<Self, B>
    where
        B: Stage<Input = Self::Output>,
    {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<S: Stage> StageExt for S {}

/// Deletes the AAR an earlier run left at the output path.
///
/// A run that fails before packaging must not leave an artifact behind.
pub struct DiscardStaleArtifactStage<'a> {
    plan: &'a BuildPlan,
}

impl<'a> DiscardStaleArtifactStage<'a> {
    /// Stage clearing `plan`'s AAR path.
    #[must_use]
    pub fn new(plan: &'a BuildPlan) -> Self {
        Self { plan }
    }
}

impl Stage for DiscardStaleArtifactStage<'_> {
    type Input = ();
    type Output = ();

    fn name(&self) -> &'static str {
        "clean"
    }

    fn run(&self, (): (), _progress: &mut Progress<'_>) -> Result<()> {
        let path = self.plan.aar_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed AAR from an earlier run at {path}");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Runs the static library script and verifies the archives.
pub struct StaticLibraryStage<'a> {
    env: BuildEnvironment<'a>,
}

impl<'a> StaticLibraryStage<'a> {
    /// Stage over `env`.
    #[must_use]
    pub fn new(env: BuildEnvironment<'a>) -> Self {
        Self { env }
    }

    fn builder(&self) -> StaticLibraryBuilder<'a> {
        StaticLibraryBuilder::new(
            &self.env.plan.static_build,
            &self.env.plan.project_root,
            self.env.ndk,
            self.env.executor,
        )
    }
}

impl Stage for StaticLibraryStage<'_> {
    type Input = ();
    type Output = StaticArchives;

    fn name(&self) -> &'static str {
        "static-libs"
    }

    fn run(&self, (): (), progress: &mut Progress<'_>) -> Result<StaticArchives> {
        if self.env.plan.static_build.skip {
            progress.line("Checking prebuilt static archives...");
        } else {
            progress.line(format!(
                "Building static libraries for {}...",
                self.env.plan.static_build.abis
            ));
        }
        let archives = self.builder().build()?;
        progress.line(static_libs_message(&archives));
        Ok(archives)
    }
}

/// Links the per-ABI shared objects with CMake.
pub struct NativeBuildStage<'a> {
    env: BuildEnvironment<'a>,
}

impl<'a> NativeBuildStage<'a> {
    /// Stage over `env`.
    #[must_use]
    pub fn new(env: BuildEnvironment<'a>) -> Self {
        Self { env }
    }
}

impl Stage for NativeBuildStage<'_> {
    type Input = StaticArchives;
    type Output = SharedObjects;

    fn name(&self) -> &'static str {
        "native"
    }

    fn run(&self, archives: StaticArchives, progress: &mut Progress<'_>) -> Result<SharedObjects> {
        progress.line(format!(
            "Building native libraries for {}...",
            self.env.plan.abis
        ));
        NativeBuilder::new(self.env.plan, self.env.ndk, self.env.executor)
            .with_jobs(self.env.jobs)
            .build_all(&archives)
    }
}

/// An AAR together with the coordinate it is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    /// Group, artifact id, and version.
    pub coordinate: Coordinate,
    /// The archive on disk.
    pub aar: PackagedAar,
}

/// Assembles the AAR.
pub struct PackagingStage<'a> {
    plan: &'a BuildPlan,
}

impl<'a> PackagingStage<'a> {
    /// Stage packaging according to `plan`.
    #[must_use]
    pub fn new(plan: &'a BuildPlan) -> Self {
        Self { plan }
    }
}

impl Stage for PackagingStage<'_> {
    type Input = SharedObjects;
    type Output = PackagedArtifact;

    fn name(&self) -> &'static str {
        "package"
    }

    fn run(&self, objects: SharedObjects, progress: &mut Progress<'_>) -> Result<PackagedArtifact> {
        progress.line("Packaging AAR...");
        let aar = package_aar(AarParams {
            manifest: LibraryManifest {
                namespace: self.plan.namespace.clone(),
                min_sdk: self.plan.min_sdk,
                target_sdk: self.plan.compile_sdk,
            },
            declared: self.plan.abis.clone(),
            shared_objects: objects,
            output_dir: self.plan.output_dir.clone(),
            file_name: self.plan.coordinate.file_name("aar"),
        })?;
        progress.line(packaged_message(&aar));
        Ok(PackagedArtifact {
            coordinate: self.plan.coordinate.clone(),
            aar,
        })
    }
}

/// Publishes the packaged AAR.
pub struct PublicationStage<'a> {
    plan: &'a BuildPlan,
    repository: &'a dyn Repository,
    timestamp: String,
}

impl<'a> PublicationStage<'a> {
    /// Stage publication to `repository`, stamping metadata with `timestamp`.
    #[must_use]
    pub fn new(plan: &'a BuildPlan, repository: &'a dyn Repository, timestamp: String) -> Self {
        Self {
            plan,
            repository,
            timestamp,
        }
    }
}

impl Stage for PublicationStage<'_> {
    type Input = PackagedArtifact;
    type Output = PublicationReceipt;

    fn name(&self) -> &'static str {
        "publish"
    }

    fn run(
        &self,
        artifact: PackagedArtifact,
        progress: &mut Progress<'_>,
    ) -> Result<PublicationReceipt> {
        progress.line(format!(
            "Publishing {} to {}...",
            artifact.coordinate,
            self.repository.describe()
        ));
        let mut publication = Publication::new(
            artifact.coordinate,
            &artifact.aar.path,
            self.plan.pom.clone(),
        );
        let receipt = publication.publish(self.repository, &self.timestamp)?;
        info!("{} is {:?}", publication.coordinate(), publication.state());
        progress.line(published_message(&receipt));
        Ok(receipt)
    }
}

/// Static libraries only.
#[must_use]
pub fn static_libs_pipeline(env: BuildEnvironment<'_>) -> StaticLibraryStage<'_> {
    StaticLibraryStage::new(env)
}

/// Static libraries, native build, and packaging.
///
/// Any AAR left by an earlier run is removed first.
pub fn build_pipeline<'a>(
    env: BuildEnvironment<'a>,
) -> impl Stage<Input = (), Output = PackagedArtifact> + 'a {
    DiscardStaleArtifactStage::new(env.plan)
        .then(StaticLibraryStage::new(env))
        .then(NativeBuildStage::new(env))
        .then(PackagingStage::new(env.plan))
}

/// The full pipeline, ending in publication.
pub fn publish_pipeline<'a>(
    env: BuildEnvironment<'a>,
    repository: &'a dyn Repository,
    timestamp: String,
) -> impl Stage<Input = (), Output = PublicationReceipt> + 'a {
    build_pipeline(env).then(PublicationStage::new(env.plan, repository, timestamp))
}

/// External commands the static library stage would run.
#[must_use]
pub fn planned_static_commands(env: BuildEnvironment<'_>) -> Vec<CommandSpec> {
    if env.plan.static_build.skip {
        return Vec::new();
    }
    vec![StaticLibraryStage::new(env).builder().command()]
}

/// External commands the pipeline would run, in order.
#[must_use]
pub fn planned_commands(env: BuildEnvironment<'_>) -> Vec<CommandSpec> {
    let plan = env.plan;
    let mut commands = planned_static_commands(env);
    let native = NativeBuilder::new(plan, env.ndk, env.executor).with_jobs(env.jobs);
    for abi in plan.abis.iter() {
        commands.push(native.configure_command(abi, &plan.static_build.archive_dir(abi)));
        commands.push(native.build_command(abi));
    }
    commands
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
