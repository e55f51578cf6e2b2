//! CLI argument definitions for the SpatiaLite AAR packager.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::abi::AndroidAbi;
use crate::config::ConfigOverrides;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Build, package, and publish the SpatiaLite Android library.
#[derive(Parser, Debug)]
#[command(name = "spatialite-aar")]
#[command(about)]
#[command(long_about = concat!(
    "Build, package, and publish the SpatiaLite Android library.\n\n",
    "The pipeline cross-compiles the vendored native dependencies into static ",
    "archives (only with --static-build; otherwise prebuilt archives are checked), ",
    "links one shared object per ABI through CMake and the Android NDK, ",
    "packages them into an AAR, and publishes the AAR with its POM and checksums ",
    "to a Maven repository.\n\n",
    "Each subcommand runs the pipeline up to and including its stage. Settings ",
    "come from spatialite-aar.toml in the project root; flags override it.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build the static archives and the AAR for every ABI:\n",
    "    $ spatialite-aar build --static-build\n\n",
    "  Reuse existing static archives and build only arm64-v8a:\n",
    "    $ spatialite-aar build --skip-static-build --abi arm64-v8a\n\n",
    "  Publish to a remote repository:\n",
    "    $ MAVEN_USERNAME=ci MAVEN_PASSWORD=... \\\n",
    "      spatialite-aar publish --repository https://maven.example.org/releases\n\n",
    "  Preview the commands without running them:\n",
    "    $ spatialite-aar publish --dry-run\n\n",
    "ENVIRONMENT:\n",
    "  NDK_HOME, ANDROID_NDK_HOME        Android NDK location\n",
    "  ANDROID_HOME, ANDROID_SDK_ROOT    Android SDK (for ndk/<version> and cmake/<version>)\n",
    "  MAVEN_USERNAME, MAVEN_PASSWORD    Credentials for HTTP repositories\n",
    "  RUST_LOG                          Overrides the log filter",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Build and verify the static archives only.
    StaticLibs,

    /// Build the static archives, native libraries, and the AAR.
    Build,

    /// Build the AAR and publish it.
    Publish,

    /// Print the effective build description and exit.
    ShowConfig,
}

impl Command {
    /// Name of the last stage this command runs.
    #[must_use]
    pub fn last_stage(self) -> &'static str {
        match self {
            Self::StaticLibs => "static-libs",
            Self::Build => "package",
            Self::Publish => "publish",
            Self::ShowConfig => "none",
        }
    }
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Project root containing `static_libs/` and `app/` [default: current directory].
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<Utf8PathBuf>,

    /// Build description file [default: <project root>/spatialite-aar.toml].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Android NDK root, taking precedence over the environment.
    #[arg(long, global = true, value_name = "DIR")]
    pub ndk_home: Option<Utf8PathBuf>,

    /// Run the static build script before building (off by default).
    #[arg(long, global = true, conflicts_with = "skip_static_build")]
    pub static_build: bool,

    /// Do not run the static build script; use existing archives.
    #[arg(long, global = true)]
    pub skip_static_build: bool,

    /// Package only this ABI (repeatable).
    #[arg(long = "abi", global = true, value_name = "ABI")]
    pub abis: Vec<AndroidAbi>,

    /// Publication version, overriding the build description.
    #[arg(long = "version", global = true, value_name = "VERSION")]
    pub publish_version: Option<String>,

    /// Publication repository: a path, file:// URL, or http(s):// URL.
    #[arg(long, global = true, value_name = "URL")]
    pub repository: Option<String>,

    /// Number of parallel CMake build jobs.
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// Show the plan and exit without building.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Build description overrides from the flags.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            skip_static_build: match (self.static_build, self.skip_static_build) {
                (true, _) => Some(false),
                (false, true) => Some(true),
                (false, false) => None,
            },
            abis: self.abis.clone(),
            version: self.publish_version.clone(),
            repository: self.repository.clone(),
        }
    }

    /// Log filter for the verbosity flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use log::LevelFilter;
    /// use spatialite_aar::cli::GlobalArgs;
    ///
    /// let args = GlobalArgs { verbosity: 2, ..GlobalArgs::default() };
    /// assert_eq!(args.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
