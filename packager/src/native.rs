//! Native build bridge: per-ABI CMake configure, build, and collection.
//!
//! For every packaged ABI the JNI CMake project is configured against the
//! NDK toolchain file and built into a fixed, ABI-keyed output directory. The
//! resulting shared objects, plus any prebuilt ones shipped under `jniLibs`,
//! become that ABI's contribution to the AAR.

use crate::abi::{AbiSet, AndroidAbi};
use crate::config::BuildPlan;
use crate::error::{PackagerError, Result};
use crate::executor::{CommandExecutor, CommandSpec, failure_message};
use crate::ndk::Ndk;
use crate::static_libs::StaticArchives;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::collections::BTreeMap;

/// One shared object ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedObject {
    /// File name inside `jni/<abi>/`.
    pub file_name: String,
    /// Location on disk.
    pub path: Utf8PathBuf,
}

/// Shared objects keyed by ABI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SharedObjects {
    by_abi: BTreeMap<AndroidAbi, Vec<SharedObject>>,
}

impl SharedObjects {
    /// Record `objects` for `abi`, replacing any previous entry.
    pub fn insert(&mut self, abi: AndroidAbi, objects: Vec<SharedObject>) {
        self.by_abi.insert(abi, objects);
    }

    /// Shared objects for `abi`.
    #[must_use]
    pub fn get(&self, abi: AndroidAbi) -> &[SharedObject] {
        self.by_abi.get(&abi).map(Vec::as_slice).unwrap_or_default()
    }

    /// ABIs that have at least one shared object.
    #[must_use]
    pub fn abis(&self) -> AbiSet {
        self.by_abi
            .iter()
            .filter(|(_, objects)| !objects.is_empty())
            .map(|(abi, _)| *abi)
            .collect()
    }

    /// Iterate `(abi, objects)` pairs in canonical ABI order.
    pub fn iter(&self) -> impl Iterator<Item = (AndroidAbi, &[SharedObject])> + '_ {
        self.by_abi.iter().map(|(abi, v)| (*abi, v.as_slice()))
    }
}

/// Drives CMake for each packaged ABI.
pub struct NativeBuilder<'a> {
    plan: &'a BuildPlan,
    ndk: &'a Ndk,
    executor: &'a dyn CommandExecutor,
    jobs: Option<usize>,
}

impl<'a> NativeBuilder<'a> {
    /// Create a native builder.
    #[must_use]
    pub fn new(plan: &'a BuildPlan, ndk: &'a Ndk, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            plan,
            ndk,
            executor,
            jobs: None,
        }
    }

    /// Limit CMake build parallelism.
    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Build every packaged ABI.
    ///
    /// Stops at the first failing ABI; no partial set is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::NativeBuildFailed`] when CMake fails,
    /// [`PackagerError::StaticArchiveMissing`] when an ABI has no static
    /// archives, and [`PackagerError::SharedObjectMissing`] when an ABI ends
    /// up with no shared object.
    pub fn build_all(&self, archives: &StaticArchives) -> Result<SharedObjects> {
        let mut objects = SharedObjects::default();
        for abi in self.plan.abis.iter() {
            let archive_dir =
                archives
                    .dir(abi)
                    .ok_or_else(|| PackagerError::StaticArchiveMissing {
                        abi,
                        path: self.plan.static_build.archive_dir(abi),
                    })?;
            objects.insert(abi, self.build_abi(abi, archive_dir)?);
        }
        Ok(objects)
    }

    /// Configure, build, and collect one ABI.
    ///
    /// # Errors
    ///
    /// See [`NativeBuilder::build_all`].
    pub fn build_abi(&self, abi: AndroidAbi, archive_dir: &Utf8Path) -> Result<Vec<SharedObject>> {
        info!("building native library for {abi}");
        let output_dir = self.plan.native_output_dir(abi);
        if output_dir.exists() {
            std::fs::remove_dir_all(&output_dir)?;
        }
        std::fs::create_dir_all(&output_dir)?;

        self.run_step(abi, "configure", &self.configure_command(abi, archive_dir))?;
        self.run_step(abi, "build", &self.build_command(abi))?;

        let built = collect_shared_objects(&output_dir)?;
        let prebuilt = collect_shared_objects(&self.plan.jni_libs.join(abi.as_str()))?;
        let merged = merge_shared_objects(abi, built, prebuilt)?;
        if merged.is_empty() {
            return Err(PackagerError::SharedObjectMissing {
                abi,
                dir: output_dir,
            });
        }
        debug!(
            "{abi}: {}",
            merged
                .iter()
                .map(|o| o.file_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(merged)
    }

    /// The CMake configure invocation for `abi`.
    #[must_use]
    pub fn configure_command(&self, abi: AndroidAbi, archive_dir: &Utf8Path) -> CommandSpec {
        let source_dir = self
            .plan
            .cmake_lists
            .parent()
            .unwrap_or(self.plan.project_root.as_path());
        let define = |name: &str, value: &str| format!("-D{name}={value}");

        CommandSpec::new(self.ndk.cmake_program(&self.plan.cmake_version))
            .args(["-S", source_dir.as_str()])
            .args(["-B", self.plan.cmake_build_dir(abi).as_str()])
            .arg(define("CMAKE_TOOLCHAIN_FILE", self.ndk.toolchain_file().as_str()))
            .arg(define("ANDROID_NDK", self.ndk.root().as_str()))
            .arg(define("ANDROID_ABI", abi.as_str()))
            .arg(define("ANDROID_PLATFORM", &format!("android-{}", self.plan.min_sdk)))
            .arg(define("CMAKE_BUILD_TYPE", "Release"))
            .arg(define(
                "CMAKE_LIBRARY_OUTPUT_DIRECTORY",
                self.plan.native_output_dir(abi).as_str(),
            ))
            .arg(define("STATIC_LIBS_DIR", archive_dir.as_str()))
            .current_dir(&self.plan.project_root)
    }

    /// The CMake build invocation for `abi`.
    #[must_use]
    pub fn build_command(&self, abi: AndroidAbi) -> CommandSpec {
        let spec = CommandSpec::new(self.ndk.cmake_program(&self.plan.cmake_version))
            .args(["--build", self.plan.cmake_build_dir(abi).as_str()])
            .args(["--config", "Release"])
            .current_dir(&self.plan.project_root);
        match self.jobs {
            Some(jobs) => spec.args(["--parallel".to_owned(), jobs.to_string()]),
            None => spec,
        }
    }

    fn run_step(&self, abi: AndroidAbi, step: &'static str, spec: &CommandSpec) -> Result<()> {
        let output = self
            .executor
            .run(spec)
            .map_err(|e| PackagerError::NativeBuildFailed {
                abi,
                step,
                reason: e.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(PackagerError::NativeBuildFailed {
                abi,
                step,
                reason: failure_message(&output),
            })
        }
    }
}

/// List `*.so` files directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty list.
fn collect_shared_objects(dir: &Utf8Path) -> Result<Vec<SharedObject>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut objects = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension() == Some("so") {
            objects.push(SharedObject {
                file_name: entry.file_name().to_owned(),
                path: path.to_owned(),
            });
        }
    }
    objects.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(objects)
}

fn merge_shared_objects(
    abi: AndroidAbi,
    built: Vec<SharedObject>,
    prebuilt: Vec<SharedObject>,
) -> Result<Vec<SharedObject>> {
    let mut merged = built;
    for object in prebuilt {
        if merged.iter().any(|o| o.file_name == object.file_name) {
            return Err(PackagerError::DuplicateSharedObject {
                abi,
                name: object.file_name,
            });
        }
        merged.push(object);
    }
    merged.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackagerConfig;
    use crate::test_utils::{ScriptedExecutor, failure_output, fake_toolchain, success_output};
    use std::fs;
    use tempfile::TempDir;

    fn plan_in(temp: &TempDir) -> BuildPlan {
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8");
        PackagerConfig::default().resolve(&root).expect("valid")
    }

    fn archives_for(plan: &BuildPlan) -> StaticArchives {
        let mut dirs = BTreeMap::new();
        for abi in plan.abis.iter() {
            dirs.insert(abi, plan.static_build.archive_dir(abi));
        }
        StaticArchives { dirs }
    }

    #[test]
    fn configure_passes_ndk_and_abi_settings() {
        let temp = tempfile::tempdir().expect("temp dir");
        let plan = plan_in(&temp);
        let ndk = Ndk::unchecked(Utf8Path::new("/opt/ndk"), None);
        let executor = ScriptedExecutor::new(|_: &CommandSpec| Ok(success_output()));
        let builder = NativeBuilder::new(&plan, &ndk, &executor);

        let spec = builder.configure_command(AndroidAbi::ArmeabiV7a, Utf8Path::new("/libs/v7"));

        assert_eq!(spec.program, "cmake");
        assert_eq!(
            spec.definition("CMAKE_TOOLCHAIN_FILE"),
            Some("/opt/ndk/build/cmake/android.toolchain.cmake")
        );
        assert_eq!(spec.definition("ANDROID_ABI"), Some("armeabi-v7a"));
        assert_eq!(spec.definition("ANDROID_PLATFORM"), Some("android-21"));
        assert_eq!(spec.definition("STATIC_LIBS_DIR"), Some("/libs/v7"));
        assert_eq!(
            spec.arg_after("-S"),
            Some(plan.project_root.join("app/src/main/jni").as_str())
        );
    }

    #[test]
    fn build_command_honours_jobs() {
        let temp = tempfile::tempdir().expect("temp dir");
        let plan = plan_in(&temp);
        let ndk = Ndk::unchecked(Utf8Path::new("/opt/ndk"), None);
        let executor = ScriptedExecutor::new(|_: &CommandSpec| Ok(success_output()));

        let spec = NativeBuilder::new(&plan, &ndk, &executor)
            .with_jobs(Some(8))
            .build_command(AndroidAbi::X86_64);
        assert_eq!(spec.arg_after("--parallel"), Some("8"));
    }

    #[test]
    fn builds_one_shared_object_per_abi() {
        let temp = tempfile::tempdir().expect("temp dir");
        let plan = plan_in(&temp);
        let ndk = Ndk::unchecked(Utf8Path::new("/opt/ndk"), None);
        let executor = ScriptedExecutor::new(fake_toolchain);

        let objects = NativeBuilder::new(&plan, &ndk, &executor)
            .build_all(&archives_for(&plan))
            .expect("native build succeeds");

        assert_eq!(objects.abis(), AbiSet::all());
        for (abi, list) in objects.iter() {
            assert_eq!(list.len(), 1, "{abi}");
            assert_eq!(list.first().map(|o| o.file_name.as_str()), Some("libspatialite.so"));
        }
        assert_eq!(executor.received().len(), 6);
    }

    #[test]
    fn link_failure_for_one_abi_fails_the_run() {
        let temp = tempfile::tempdir().expect("temp dir");
        let plan = plan_in(&temp);
        let ndk = Ndk::unchecked(Utf8Path::new("/opt/ndk"), None);
        let executor = ScriptedExecutor::new(|spec: &CommandSpec| {
            let failing = spec
                .arg_after("--build")
                .is_some_and(|dir| dir.ends_with("armeabi-v7a"));
            if failing {
                Ok(failure_output("ld.lld: error: undefined symbol: GEOSversion"))
            } else {
                fake_toolchain(spec)
            }
        });

        let err = NativeBuilder::new(&plan, &ndk, &executor)
            .build_all(&archives_for(&plan))
            .expect_err("armeabi-v7a link fails");
        assert!(
            matches!(
                err,
                PackagerError::NativeBuildFailed { abi: AndroidAbi::ArmeabiV7a, step: "build", .. }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn empty_output_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let plan = plan_in(&temp);
        let ndk = Ndk::unchecked(Utf8Path::new("/opt/ndk"), None);
        let executor = ScriptedExecutor::new(|_: &CommandSpec| Ok(success_output()));

        let err = NativeBuilder::new(&plan, &ndk, &executor)
            .build_all(&archives_for(&plan))
            .expect_err("nothing built");
        assert!(matches!(err, PackagerError::SharedObjectMissing { .. }));
    }

    #[test]
    fn prebuilt_jni_libs_are_merged_for_declared_abis_only() {
        let temp = tempfile::tempdir().expect("temp dir");
        let plan = plan_in(&temp);
        for abi in ["arm64-v8a", "x86"] {
            let dir = plan.jni_libs.join(abi);
            fs::create_dir_all(&dir).expect("mkdir");
            fs::write(dir.join("libc++_shared.so"), "stl").expect("write");
        }
        let ndk = Ndk::unchecked(Utf8Path::new("/opt/ndk"), None);
        let executor = ScriptedExecutor::new(fake_toolchain);

        let objects = NativeBuilder::new(&plan, &ndk, &executor)
            .build_all(&archives_for(&plan))
            .expect("native build succeeds");

        let arm64: Vec<&str> = objects
            .get(AndroidAbi::Arm64V8a)
            .iter()
            .map(|o| o.file_name.as_str())
            .collect();
        assert_eq!(arm64, vec!["libc++_shared.so", "libspatialite.so"]);
        assert_eq!(objects.get(AndroidAbi::X86_64).len(), 1);
    }

    #[test]
    fn duplicate_prebuilt_name_is_rejected() {
        let built = vec![SharedObject {
            file_name: "libspatialite.so".to_owned(),
            path: Utf8PathBuf::from("/a/libspatialite.so"),
        }];
        let prebuilt = built.clone();
        let err = merge_shared_objects(AndroidAbi::X86_64, built, prebuilt).expect_err("dup");
        assert!(matches!(err, PackagerError::DuplicateSharedObject { .. }));
    }
}
