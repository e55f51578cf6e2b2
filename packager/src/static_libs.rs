//! Static library build orchestration.
//!
//! Runs the vendored static library build script (which cross-compiles the
//! SpatiaLite dependency tree for every requested ABI) and then checks that
//! each ABI's archive directory holds the archives the native build links.

use crate::abi::AndroidAbi;
use crate::config::StaticBuildPlan;
use crate::error::{PackagerError, Result};
use crate::executor::{CommandExecutor, CommandSpec, failure_message};
use crate::ndk::Ndk;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::collections::BTreeMap;

/// Static archive directories, one per requested ABI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticArchives {
    pub(crate) dirs: BTreeMap<AndroidAbi, Utf8PathBuf>,
}

impl StaticArchives {
    /// Archive directory for `abi`, if it was part of the static build.
    #[must_use]
    pub fn dir(&self, abi: AndroidAbi) -> Option<&Utf8Path> {
        self.dirs.get(&abi).map(Utf8PathBuf::as_path)
    }

    /// ABIs with verified archives.
    pub fn abis(&self) -> impl Iterator<Item = AndroidAbi> + '_ {
        self.dirs.keys().copied()
    }
}

/// Builder for the per-ABI static archives.
pub struct StaticLibraryBuilder<'a> {
    plan: &'a StaticBuildPlan,
    project_root: &'a Utf8Path,
    ndk: &'a Ndk,
    executor: &'a dyn CommandExecutor,
}

impl<'a> StaticLibraryBuilder<'a> {
    /// Create a builder for `plan`.
    #[must_use]
    pub fn new(
        plan: &'a StaticBuildPlan,
        project_root: &'a Utf8Path,
        ndk: &'a Ndk,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            plan,
            project_root,
            ndk,
            executor,
        }
    }

    /// Run the script (unless skipped) and verify the archives.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StaticBuildFailed`] if the script fails and
    /// [`PackagerError::StaticArchiveMissing`] if any requested ABI lacks an
    /// archive afterwards.
    pub fn build(&self) -> Result<StaticArchives> {
        if self.plan.skip {
            info!("static library build skipped; expecting prebuilt archives");
        } else {
            self.run_script()?;
        }
        self.verify()
    }

    /// The script invocation this builder performs.
    #[must_use]
    pub fn command(&self) -> CommandSpec {
        let abis: Vec<&str> = self.plan.abis.iter().map(AndroidAbi::as_str).collect();
        CommandSpec::new(self.plan.working_dir.join(&self.plan.script).into_string())
            .current_dir(&self.plan.working_dir)
            .env("NDK_HOME", self.ndk.root().as_str())
            .env("PROJECT_ROOT", self.project_root.as_str())
            .env("ABIS", abis.join(" "))
    }

    fn run_script(&self) -> Result<()> {
        let spec = self.command();
        info!("building static libraries for {}", self.plan.abis);
        let output = self
            .executor
            .run(&spec)
            .map_err(|e| PackagerError::StaticBuildFailed {
                reason: format!("could not run {}: {e}", spec.program),
            })?;

        if !output.status.success() {
            return Err(PackagerError::StaticBuildFailed {
                reason: failure_message(&output),
            });
        }
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
        Ok(())
    }

    fn verify(&self) -> Result<StaticArchives> {
        let mut dirs = BTreeMap::new();
        for abi in self.plan.abis.iter() {
            let dir = self.plan.archive_dir(abi);
            verify_abi_archives(abi, &dir, &self.plan.archives)?;
            dirs.insert(abi, dir);
        }
        Ok(StaticArchives { dirs })
    }
}

/// Check one ABI's archive directory.
///
/// With explicit `archives`, each must exist; otherwise at least one `*.a`
/// file must be present.
fn verify_abi_archives(abi: AndroidAbi, dir: &Utf8Path, archives: &[String]) -> Result<()> {
    if !dir.is_dir() {
        return Err(PackagerError::StaticArchiveMissing {
            abi,
            path: dir.to_owned(),
        });
    }

    if let Some(missing) = archives.iter().map(|a| dir.join(a)).find(|p| !p.is_file()) {
        return Err(PackagerError::StaticArchiveMissing { abi, path: missing });
    }

    if archives.is_empty() {
        let has_archive = dir
            .read_dir_utf8()?
            .filter_map(std::result::Result::ok)
            .any(|entry| entry.path().extension() == Some("a"));
        if !has_archive {
            return Err(PackagerError::StaticArchiveMissing {
                abi,
                path: dir.join("*.a"),
            });
        }
    }
    Ok(())
}
